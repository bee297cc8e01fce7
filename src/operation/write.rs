//! Write operation: open → write-until-done → close.
//!
//! Text and byte content go through the same machine and the same open
//! flags: write-only, create, truncate, owner read/write permission. A
//! native write may legitimately transfer fewer bytes than requested, so
//! the write stage loops, advancing past what each completion reports,
//! until the full content is on disk or an error occurs.

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

use crate::continuation::Continuation;
use crate::error::{host_error, FileError, Result};
use crate::logging::{LogEntry, LogLevel, Logger};
use crate::operation::{InFlight, Step};
use crate::reactor::NativeOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Opening,
    Writing,
}

/// Context of one in-flight write.
pub(crate) struct WriteOperation {
    continuation: Continuation<Result<()>>,
    stage: Stage,
    fd: RawFd,
    content: Vec<u8>,
    written: usize,
}

impl WriteOperation {
    /// Construct the operation context and its opening request.
    pub(crate) fn begin(
        path: CString,
        content: Vec<u8>,
        continuation: Continuation<Result<()>>,
    ) -> (Self, NativeOp) {
        let op = Self {
            continuation,
            stage: Stage::Opening,
            fd: -1,
            content,
            written: 0,
        };
        let request = NativeOp::Open {
            path,
            flags: libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            mode: 0o600,
        };
        (op, request)
    }

    /// Write request covering everything not yet transferred.
    fn next_write(&self) -> NativeOp {
        NativeOp::Write {
            fd: self.fd,
            buf: self.content[self.written..].as_ptr(),
            len: self.content.len() - self.written,
            offset: -1,
        }
    }
}

impl InFlight for WriteOperation {
    fn absorb(self: Box<Self>, result: i32, logger: &mut Logger) -> Step {
        let mut this = *self;
        match this.stage {
            Stage::Opening => {
                if result < 0 {
                    logger.log(LogEntry::new(
                        LogLevel::Debug,
                        "write",
                        format!("open failed ({result}), skipping write stage"),
                    ));
                    this.continuation
                        .complete(Err(FileError::Open(host_error(result))));
                    return Step::Settled(None);
                }

                this.fd = result;
                this.stage = Stage::Writing;
                logger.log(
                    LogEntry::new(
                        LogLevel::Debug,
                        "write",
                        format!("opened, {} bytes to write", this.content.len()),
                    )
                    .with_fd(this.fd),
                );
                let request = this.next_write();
                Step::Submit(Box::new(this), request)
            }
            Stage::Writing => {
                let fd = this.fd;
                if result < 0 {
                    logger.log(
                        LogEntry::new(LogLevel::Debug, "write", format!("write failed ({result})"))
                            .with_fd(fd),
                    );
                    this.continuation
                        .complete(Err(FileError::Write(host_error(result))));
                    return Step::Settled(Some(fd));
                }

                this.written += result as usize;
                if this.written >= this.content.len() {
                    logger.log(
                        LogEntry::new(
                            LogLevel::Debug,
                            "write",
                            format!("completed, {} bytes", this.written),
                        )
                        .with_fd(fd),
                    );
                    this.continuation.complete(Ok(()));
                    return Step::Settled(Some(fd));
                }

                if result == 0 {
                    // Zero progress with bytes remaining would loop forever.
                    this.continuation.complete(Err(FileError::Write(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "write returned zero bytes",
                    ))));
                    return Step::Settled(Some(fd));
                }

                let request = this.next_write();
                Step::Submit(Box::new(this), request)
            }
        }
    }

    fn reject(self: Box<Self>, error: io::Error, logger: &mut Logger) -> Option<RawFd> {
        let this = *self;
        let fd = (this.fd >= 0).then_some(this.fd);
        logger.log(LogEntry::new(
            LogLevel::Warn,
            "write",
            format!("submission rejected: {error}"),
        ));
        let failure = match this.stage {
            Stage::Opening => FileError::Open(error),
            Stage::Writing => FileError::Write(error),
        };
        this.continuation.complete(Err(failure));
        fd
    }

    fn describe(&self) -> &'static str {
        "write"
    }
}
