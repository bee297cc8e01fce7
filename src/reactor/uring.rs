//! io_uring reactor implementation.
//!
//! Maps each [`NativeOp`] onto its io_uring opcode: `OpenAt`, `Read`,
//! `Write`, `Statx` (the existence probe; io_uring has no access opcode),
//! and `Close`. Allocations the kernel keeps referencing while a request is
//! pending (path strings, statx output buffers) are parked in a per-token
//! table and dropped only when the matching completion is reaped, so
//! nothing the kernel can still write to is ever freed early.

use std::io;

use crate::reactor::{Completion, NativeOp, Reactor};

#[cfg(target_os = "linux")]
use std::collections::HashMap;

#[cfg(target_os = "linux")]
use io_uring::{opcode, types, IoUring};

/// Resources the kernel references while a request is in flight.
///
/// Parked here at submission and released when the completion is reaped.
#[cfg(target_os = "linux")]
#[allow(dead_code)] // held for the kernel's lifetime, never read back
#[derive(Debug)]
enum Parked {
    /// The request only references buffers owned by the submitting
    /// operation context.
    None,
    /// Path string passed to `openat`.
    Path(std::ffi::CString),
    /// Path string and output buffer of a `statx` probe.
    Probe(std::ffi::CString, Box<libc::statx>),
}

/// io_uring-backed reactor for Linux.
#[cfg(target_os = "linux")]
pub struct UringReactor {
    ring: IoUring,
    in_flight: HashMap<u64, Parked>,
}

#[cfg(target_os = "linux")]
impl UringReactor {
    /// Create a ring with `entries` submission slots.
    ///
    /// Fails on kernels without io_uring support and in sandboxes that
    /// deny ring setup; callers fall back to the blocking reactor.
    pub fn new(entries: u32) -> io::Result<Self> {
        let ring = IoUring::new(entries)?;
        Ok(Self {
            ring,
            in_flight: HashMap::new(),
        })
    }
}

#[cfg(target_os = "linux")]
impl Reactor for UringReactor {
    fn submit(&mut self, op: NativeOp, token: u64) -> io::Result<()> {
        // Pointers are taken before the owning values move into `Parked`;
        // the heap allocations behind CString and Box do not move with them.
        let (entry, parked) = match op {
            NativeOp::Open { path, flags, mode } => (
                opcode::OpenAt::new(types::Fd(libc::AT_FDCWD), path.as_ptr())
                    .flags(flags)
                    .mode(mode)
                    .build(),
                Parked::Path(path),
            ),
            NativeOp::Read {
                fd,
                buf,
                len,
                offset,
            } => (
                // Offset -1 (all-ones) selects the descriptor's current
                // position, like read(2).
                opcode::Read::new(types::Fd(fd), buf, len as u32)
                    .offset(offset as u64)
                    .build(),
                Parked::None,
            ),
            NativeOp::Write {
                fd,
                buf,
                len,
                offset,
            } => (
                opcode::Write::new(types::Fd(fd), buf, len as u32)
                    .offset(offset as u64)
                    .build(),
                Parked::None,
            ),
            NativeOp::Access { path, mode: _ } => {
                let mut statx: Box<libc::statx> = Box::new(unsafe { std::mem::zeroed() });
                let statx_ptr: *mut libc::statx = &mut *statx;
                (
                    opcode::Statx::new(types::Fd(libc::AT_FDCWD), path.as_ptr(), statx_ptr.cast())
                        .mask(libc::STATX_MODE)
                        .build(),
                    Parked::Probe(path, statx),
                )
            }
            NativeOp::Close { fd } => (opcode::Close::new(types::Fd(fd)).build(), Parked::None),
        };

        let entry = entry.user_data(token);

        // SAFETY: every buffer the entry references is owned either by the
        // parked resources stored below or by the submitting operation
        // context, both of which outlive the request's completion.
        unsafe {
            self.ring
                .submission()
                .push(&entry)
                .map_err(|e| io::Error::other(format!("submission queue full: {e:?}")))?;
        }

        self.in_flight.insert(token, parked);
        self.ring.submit()?;
        Ok(())
    }

    fn try_complete(&mut self) -> io::Result<Vec<Completion>> {
        let mut completions = Vec::new();
        let mut cq = self.ring.completion();

        for cqe in &mut cq {
            let token = cqe.user_data();
            self.in_flight.remove(&token);
            completions.push(Completion {
                token,
                result: cqe.result(),
            });
        }

        cq.sync();
        Ok(completions)
    }

    fn wait_for_completion(&mut self) -> io::Result<Vec<Completion>> {
        if self.in_flight.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no operations in flight to wait for",
            ));
        }

        self.ring.submit_and_wait(1)?;
        self.try_complete()
    }

    fn operations_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn name(&self) -> &'static str {
        "io_uring"
    }
}

/// Stub for non-Linux platforms.
#[cfg(not(target_os = "linux"))]
pub struct UringReactor;

#[cfg(not(target_os = "linux"))]
impl UringReactor {
    /// io_uring is Linux-only; creation always fails elsewhere.
    pub fn new(_entries: u32) -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "io_uring is only supported on Linux",
        ))
    }
}
