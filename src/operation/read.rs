//! Read operation: open → iterative read-accumulate → close.
//!
//! The most involved state machine in the crate. After a successful open,
//! the operation loops: each completed chunk is appended to the
//! accumulator and exactly one follow-up read is issued at the
//! descriptor's current position; no two reads for the same operation are
//! ever in flight simultaneously. A zero-byte completion is EOF: the
//! accumulated content is boxed per the operation's [`ContentMode`] and
//! moved into the continuation.

use std::ffi::CString;
use std::io;
use std::marker::PhantomData;
use std::os::unix::io::RawFd;

use crate::buffer::{Accumulator, ChunkBuffer};
use crate::contents::ContentMode;
use crate::continuation::Continuation;
use crate::error::{host_error, FileError, Result};
use crate::logging::{LogEntry, LogLevel, Logger};
use crate::operation::{InFlight, Step};
use crate::reactor::NativeOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Opening,
    Reading,
}

/// Context of one in-flight read, generic over how the result is boxed.
pub(crate) struct ReadOperation<M: ContentMode> {
    continuation: Continuation<Result<M::Output>>,
    stage: Stage,
    fd: RawFd,
    chunk: ChunkBuffer,
    content: Accumulator,
    _mode: PhantomData<M>,
}

impl<M: ContentMode> ReadOperation<M> {
    /// Construct the operation context and its opening request.
    pub(crate) fn begin(
        path: CString,
        continuation: Continuation<Result<M::Output>>,
    ) -> (Self, NativeOp) {
        let op = Self {
            continuation,
            stage: Stage::Opening,
            fd: -1,
            chunk: ChunkBuffer::new(),
            content: Accumulator::new(),
            _mode: PhantomData,
        };
        let request = NativeOp::Open {
            path,
            flags: libc::O_RDONLY,
            mode: 0,
        };
        (op, request)
    }

    /// The next sequential read into the reusable working buffer.
    fn next_read(&mut self) -> NativeOp {
        NativeOp::Read {
            fd: self.fd,
            buf: self.chunk.as_mut_ptr(),
            len: self.chunk.len(),
            offset: -1,
        }
    }
}

impl<M: ContentMode + 'static> InFlight for ReadOperation<M> {
    fn absorb(self: Box<Self>, result: i32, logger: &mut Logger) -> Step {
        let mut this = *self;
        match this.stage {
            Stage::Opening => {
                if result < 0 {
                    logger.log(LogEntry::new(
                        LogLevel::Debug,
                        "read",
                        format!("open failed ({result}), skipping read stage"),
                    ));
                    this.continuation
                        .complete(Err(FileError::Open(host_error(result))));
                    return Step::Settled(None);
                }

                this.fd = result;
                this.stage = Stage::Reading;
                logger.log(
                    LogEntry::new(LogLevel::Debug, "read", format!("opened ({})", M::NAME))
                        .with_fd(this.fd),
                );
                let request = this.next_read();
                Step::Submit(Box::new(this), request)
            }
            Stage::Reading => {
                if result < 0 {
                    let fd = this.fd;
                    logger.log(
                        LogEntry::new(LogLevel::Debug, "read", format!("read failed ({result})"))
                            .with_fd(fd),
                    );
                    this.continuation
                        .complete(Err(FileError::Read(host_error(result))));
                    return Step::Settled(Some(fd));
                }

                if result == 0 {
                    // EOF: box the accumulated content and move it into the
                    // continuation. A zero-length file lands here on its
                    // first read and delivers the empty result.
                    let ReadOperation {
                        continuation,
                        content,
                        fd,
                        ..
                    } = this;
                    logger.log(
                        LogEntry::new(
                            LogLevel::Debug,
                            "read",
                            format!("eof after {} bytes", content.len()),
                        )
                        .with_fd(fd),
                    );
                    continuation.complete(Ok(M::finish(content.into_bytes())));
                    return Step::Settled(Some(fd));
                }

                let filled = result as usize;
                this.content.append(this.chunk.chunk(filled));
                let request = this.next_read();
                Step::Submit(Box::new(this), request)
            }
        }
    }

    fn reject(self: Box<Self>, error: io::Error, logger: &mut Logger) -> Option<RawFd> {
        let this = *self;
        let fd = (this.fd >= 0).then_some(this.fd);
        logger.log(LogEntry::new(
            LogLevel::Warn,
            "read",
            format!("submission rejected: {error}"),
        ));
        let failure = match this.stage {
            Stage::Opening => FileError::Open(error),
            Stage::Reading => FileError::Read(error),
        };
        this.continuation.complete(Err(failure));
        fd
    }

    fn describe(&self) -> &'static str {
        "read"
    }
}
