//! Working and accumulation buffers for read operations.
//!
//! A read operation owns two buffers with very different lifecycles:
//!
//! - a [`ChunkBuffer`], the fixed-size working region each native read fills.
//!   It is allocated once per operation, reused for every chunk, and never
//!   resized. Its heap address is stable, so the raw pointer handed to the
//!   reactor stays valid while the operation context moves around the
//!   driver's tables.
//! - an [`Accumulator`], the growable buffer collecting every chunk read so
//!   far. Growth is amortized (geometric), so accumulating an N-byte file is
//!   O(N) rather than a fresh copy of the whole prefix per chunk.
//!
//! At the terminal transition the accumulator's storage moves into the boxed
//! result; nothing is copied and nothing needs manual release.

/// Size of the reusable working buffer each native read fills.
pub const CHUNK_SIZE: usize = 32 * 1024;

/// Fixed-size working region for a single operation's native reads.
#[derive(Debug)]
pub struct ChunkBuffer {
    data: Box<[u8]>,
}

impl ChunkBuffer {
    /// Allocate a zeroed working buffer of [`CHUNK_SIZE`] bytes.
    pub fn new() -> Self {
        Self {
            data: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Capacity of the working buffer. Always [`CHUNK_SIZE`].
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer has zero capacity. Never true.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw pointer for the reactor to fill.
    ///
    /// # Safety
    ///
    /// The pointer stays valid while this `ChunkBuffer` exists, including
    /// across moves of the owning operation context (the boxed slice's heap
    /// allocation does not move). The caller must not let a native request
    /// outlive the buffer.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }

    /// The first `filled` bytes, as written by a completed read.
    ///
    /// # Panics
    ///
    /// Panics if `filled` exceeds [`CHUNK_SIZE`]; a native read never
    /// reports more bytes than the buffer it was given.
    pub fn chunk(&self, filled: usize) -> &[u8] {
        &self.data[..filled]
    }
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Growable buffer collecting all chunks read so far.
///
/// Invariant: [`len`](Accumulator::len) equals the sum of the lengths of all
/// chunks appended so far.
#[derive(Debug, Default)]
pub struct Accumulator {
    data: Vec<u8>,
}

impl Accumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one completed chunk.
    pub fn append(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    /// Total bytes accumulated.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move the accumulated content out for boxing.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
