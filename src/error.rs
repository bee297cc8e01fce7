//! Error types and native status translation.
//!
//! Every failure an operation can deliver to its continuation is one of the
//! three variants of [`FileError`], each carrying the translated native
//! status code as its source. No finer classification (not-found vs.
//! permission vs. other) happens at this layer; callers that need it can
//! inspect the wrapped [`std::io::Error`].

use std::io;

use thiserror::Error;

/// Result type alias for operations in this crate.
pub type Result<T> = std::result::Result<T, FileError>;

/// Failure delivered to an operation's continuation.
///
/// The variant records which stage of the operation failed; the wrapped
/// [`std::io::Error`] is the translation of the native status code reported
/// by the reactor.
#[derive(Debug, Error)]
pub enum FileError {
    /// The file could not be opened; the read or write stage was never
    /// reached.
    #[error("failed to open file: {0}")]
    Open(#[source] io::Error),

    /// A read request failed after the file was opened.
    #[error("failed to read file: {0}")]
    Read(#[source] io::Error),

    /// A write request failed after the file was opened.
    #[error("failed to write file: {0}")]
    Write(#[source] io::Error),
}

impl FileError {
    /// The translated native error carried by this failure.
    pub fn io_error(&self) -> &io::Error {
        match self {
            FileError::Open(e) | FileError::Read(e) | FileError::Write(e) => e,
        }
    }

    /// The raw OS error code, when the native status mapped to one.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.io_error().raw_os_error()
    }
}

/// Translate a negative native result into a host error value.
///
/// Reactor completions report errors as negated `errno` values; non-negative
/// results are byte counts or descriptors and never reach this function.
pub fn host_error(raw: i32) -> io::Error {
    debug_assert!(raw < 0, "only negative native results carry an error");
    io::Error::from_raw_os_error(-raw)
}

// Continuations may be delivered from completion contexts owned by embedding
// runtimes; the error value itself must not pin them to a thread.
static_assertions::assert_impl_all!(FileError: Send, Sync);
