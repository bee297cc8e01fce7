//! Reactor abstraction: the native I/O engine driving every operation.
//!
//! Operations never touch the filesystem themselves. They describe each
//! native call as a [`NativeOp`], submit it through the [`Reactor`] trait
//! under a unique token, and are advanced later when the matching
//! [`Completion`] is drained. Each submitted request completes exactly once.
//!
//! Two reactors ship with the crate:
//!
//! - [`uring::UringReactor`]: io_uring-backed, Linux only
//! - [`blocking::BlockingReactor`]: portable fallback that performs the
//!   syscall eagerly and delivers the completion at the next poll
//!
//! [`detect_reactor`] picks the best one available, mirroring how an
//! embedding runtime would wire this layer to its own event loop.

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

pub mod blocking;
pub mod uring;

/// One finished native request.
///
/// `result` follows the native convention: negative values are negated
/// `errno` codes, non-negative values are byte counts or descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Token the request was submitted under.
    pub token: u64,
    /// Signed native result.
    pub result: i32,
}

/// A native request an operation asks the reactor to perform.
///
/// # Safety
///
/// `Read` and `Write` carry raw pointers into buffers owned by the
/// submitting operation context. The driver keeps that context alive until
/// the request's completion is dispatched, which is what makes handing the
/// pointer to the kernel sound. Path-carrying requests move their `CString`
/// into the reactor, which must keep it alive until the completion fires.
#[derive(Debug)]
pub enum NativeOp {
    /// Open a file, resolving to a descriptor.
    Open {
        /// Path to open.
        path: CString,
        /// `O_*` flags.
        flags: i32,
        /// Permission bits applied when the open creates the file.
        mode: u32,
    },
    /// Read up to `len` bytes into `buf`, resolving to the byte count.
    Read {
        /// Descriptor to read from.
        fd: RawFd,
        /// Destination buffer, valid for `len` bytes.
        buf: *mut u8,
        /// Capacity of `buf`.
        len: usize,
        /// Absolute file offset, or `-1` for the current position.
        offset: i64,
    },
    /// Write `len` bytes from `buf`, resolving to the byte count.
    Write {
        /// Descriptor to write to.
        fd: RawFd,
        /// Source buffer, valid for `len` bytes.
        buf: *const u8,
        /// Bytes to write.
        len: usize,
        /// Absolute file offset, or `-1` for the current position.
        offset: i64,
    },
    /// Probe a path for existence, resolving to zero or a negative error.
    Access {
        /// Path to probe.
        path: CString,
        /// `F_OK`-style probe mode.
        mode: i32,
    },
    /// Close a descriptor.
    Close {
        /// Descriptor to close.
        fd: RawFd,
    },
}

impl NativeOp {
    /// Short name of the request kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            NativeOp::Open { .. } => "open",
            NativeOp::Read { .. } => "read",
            NativeOp::Write { .. } => "write",
            NativeOp::Access { .. } => "access",
            NativeOp::Close { .. } => "close",
        }
    }
}

/// Native I/O engine consumed by the driver.
///
/// Implementations must deliver exactly one [`Completion`] per submitted
/// request and must not reorder a request's completion before its submission
/// is observed (ordering between distinct requests is unconstrained).
pub trait Reactor {
    /// Queue one native request under `token`.
    ///
    /// A submission error means the request was never issued; the reactor
    /// will not produce a completion for it.
    fn submit(&mut self, op: NativeOp, token: u64) -> io::Result<()>;

    /// Drain finished requests without blocking.
    fn try_complete(&mut self) -> io::Result<Vec<Completion>>;

    /// Block until at least one request finishes, then drain.
    ///
    /// Returns `InvalidInput` when nothing is in flight; waiting would
    /// otherwise never return.
    fn wait_for_completion(&mut self) -> io::Result<Vec<Completion>>;

    /// Requests submitted but not yet drained.
    fn operations_in_flight(&self) -> usize;

    /// Reactor name for logs and diagnostics.
    fn name(&self) -> &'static str;
}

/// Pick the best reactor available on this system.
///
/// Tries io_uring first on Linux and falls back to the blocking reactor
/// everywhere else (and on kernels or sandboxes where ring setup fails).
pub fn detect_reactor(queue_depth: u32) -> io::Result<Box<dyn Reactor>> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(reactor) = uring::UringReactor::new(queue_depth) {
            return Ok(Box::new(reactor));
        }
    }

    let _ = queue_depth;
    Ok(Box::new(blocking::BlockingReactor::new()))
}
