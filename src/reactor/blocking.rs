//! Portable fallback reactor.
//!
//! Performs each native request eagerly with plain syscalls at submit time
//! and parks the result until the next drain. The deliver-later contract is
//! preserved: the submitting operation is never advanced re-entrantly, so
//! state machines behave identically under this reactor and a genuinely
//! asynchronous one. That determinism is also what makes it the backbone of
//! the integration tests.

use std::collections::VecDeque;
use std::io;

use crate::reactor::{Completion, NativeOp, Reactor};

/// Reactor that executes requests synchronously and queues completions.
#[derive(Debug, Default)]
pub struct BlockingReactor {
    finished: VecDeque<Completion>,
}

impl BlockingReactor {
    /// Create an empty blocking reactor.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reactor for BlockingReactor {
    fn submit(&mut self, op: NativeOp, token: u64) -> io::Result<()> {
        let result = execute(&op);
        self.finished.push_back(Completion { token, result });
        Ok(())
    }

    fn try_complete(&mut self) -> io::Result<Vec<Completion>> {
        Ok(self.finished.drain(..).collect())
    }

    fn wait_for_completion(&mut self) -> io::Result<Vec<Completion>> {
        if self.finished.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no operations in flight to wait for",
            ));
        }
        self.try_complete()
    }

    fn operations_in_flight(&self) -> usize {
        self.finished.len()
    }

    fn name(&self) -> &'static str {
        "blocking"
    }
}

/// Run one request to completion, returning the native signed result.
fn execute(op: &NativeOp) -> i32 {
    let raw = match op {
        NativeOp::Open { path, flags, mode } => unsafe {
            libc::open(path.as_ptr(), *flags, *mode as libc::c_uint) as isize
        },
        NativeOp::Read {
            fd,
            buf,
            len,
            offset,
        } => unsafe {
            if *offset < 0 {
                libc::read(*fd, (*buf).cast::<libc::c_void>(), *len)
            } else {
                libc::pread(*fd, (*buf).cast::<libc::c_void>(), *len, *offset as libc::off_t)
            }
        },
        NativeOp::Write {
            fd,
            buf,
            len,
            offset,
        } => unsafe {
            if *offset < 0 {
                libc::write(*fd, (*buf).cast::<libc::c_void>(), *len)
            } else {
                libc::pwrite(*fd, (*buf).cast::<libc::c_void>(), *len, *offset as libc::off_t)
            }
        },
        NativeOp::Access { path, mode } => unsafe {
            libc::access(path.as_ptr(), *mode) as isize
        },
        NativeOp::Close { fd } => unsafe { libc::close(*fd) as isize },
    };

    if raw < 0 {
        -io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO)
    } else {
        // Requests never exceed the 32 KiB working buffer, so the count
        // always fits a completion's i32.
        raw as i32
    }
}
