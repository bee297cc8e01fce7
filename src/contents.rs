//! Result boxing for completed reads.
//!
//! A read operation accumulates raw bytes; what the continuation receives
//! depends on the result mode the entry point was called with. The mode is a
//! marker type implementing [`ContentMode`], so a read operation is generic
//! over its boxing instead of branching on a flag at delivery time.

/// How the accumulated bytes of a read are boxed for the continuation.
///
/// The trait is sealed: [`Text`] and [`Bytes`] are the only two modes, and
/// external crates cannot add more.
pub trait ContentMode: private::Sealed {
    /// The value delivered to the continuation. Always an owned value; it
    /// outlives the operation that produced it.
    type Output: 'static;

    /// Mode name used in log entries.
    const NAME: &'static str;

    /// The neutral placeholder delivered alongside failures.
    fn empty() -> Self::Output;

    /// Box the accumulated bytes into the final result.
    fn finish(raw: Vec<u8>) -> Self::Output;
}

/// Text mode: the accumulated bytes become a `String`.
///
/// Well-formed UTF-8 converts without copying; invalid sequences are
/// replaced with `U+FFFD`, matching how the host runtime treats file
/// content as text.
#[derive(Debug)]
pub enum Text {}

/// Byte mode: the accumulated bytes are delivered as-is.
#[derive(Debug)]
pub enum Bytes {}

impl ContentMode for Text {
    type Output = String;

    const NAME: &'static str = "text";

    fn empty() -> String {
        String::new()
    }

    fn finish(raw: Vec<u8>) -> String {
        match String::from_utf8(raw) {
            Ok(text) => text,
            Err(invalid) => String::from_utf8_lossy(invalid.as_bytes()).into_owned(),
        }
    }
}

impl ContentMode for Bytes {
    type Output = Vec<u8>;

    const NAME: &'static str = "bytes";

    fn empty() -> Vec<u8> {
        Vec::new()
    }

    fn finish(raw: Vec<u8>) -> Vec<u8> {
        raw
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Text {}
    impl Sealed for super::Bytes {}
}
