//! The file I/O driver: public entry points and completion dispatch.
//!
//! [`FileIo`] owns the reactor, a token-keyed table of in-flight operation
//! contexts, and the logger. Entry points construct an operation, submit
//! its first native request, and return immediately; every subsequent
//! state transition happens when [`poll`](FileIo::poll) or
//! [`run_until_idle`](FileIo::run_until_idle) drains completions and hands
//! each one to the operation that owns its token.
//!
//! Scheduling is single-threaded and cooperative. Operations interleave at
//! the reactor's discretion, but each context is exclusively owned by this
//! table: taken out for the duration of a transition, reinserted under a
//! fresh token if the operation stays in flight, and dropped exactly once
//! at its terminal transition.

use std::collections::HashMap;
use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::Path;

use crate::config::FileIoConfig;
use crate::contents::{Bytes, Text};
use crate::continuation::Continuation;
use crate::error::{FileError, Result};
use crate::logging::{LogEntry, LogLevel, Logger};
use crate::operation::{DiscardClose, ExistsOperation, InFlight, ReadOperation, Step, WriteOperation};
use crate::reactor::{detect_reactor, Completion, NativeOp, Reactor};

/// Completion-driven file I/O driver.
///
/// All progress is made on the thread calling [`poll`](FileIo::poll) /
/// [`run_until_idle`](FileIo::run_until_idle); continuations run
/// synchronously inside that dispatch. There is no cancellation: once an
/// entry point returns, the operation runs to a terminal state and its
/// continuation fires exactly once.
pub struct FileIo {
    reactor: Box<dyn Reactor>,
    pending: HashMap<u64, Box<dyn InFlight>>,
    next_token: u64,
    logger: Logger,
}

impl FileIo {
    /// Create a driver on the best reactor available.
    pub fn new() -> io::Result<Self> {
        Self::with_config(FileIoConfig::default())
    }

    /// Create a driver with the given configuration.
    pub fn with_config(config: FileIoConfig) -> io::Result<Self> {
        let reactor = detect_reactor(config.queue_depth)?;
        Ok(Self::with_reactor(reactor, config))
    }

    /// Create a driver on a caller-supplied reactor.
    ///
    /// This is the seam embedding runtimes (and the test suites) use to
    /// wire the driver to their own event loop.
    pub fn with_reactor(reactor: Box<dyn Reactor>, config: FileIoConfig) -> Self {
        Self {
            reactor,
            pending: HashMap::new(),
            next_token: 1,
            logger: Logger::new(config.logging),
        }
    }

    /// Read a file as text.
    ///
    /// Registers the operation and returns immediately. The continuation
    /// receives the whole content as a `String`, or the stage-tagged
    /// failure.
    pub fn read(
        &mut self,
        path: impl AsRef<Path>,
        deliver: impl FnOnce(Result<String>) + 'static,
    ) {
        let continuation = Continuation::new(deliver);
        match to_native_path(path.as_ref()) {
            Ok(path) => {
                let (op, request) = ReadOperation::<Text>::begin(path, continuation);
                self.launch(Box::new(op), request);
            }
            Err(error) => continuation.complete(Err(FileError::Open(error))),
        }
    }

    /// Read a file as a byte sequence.
    ///
    /// Registers the operation and returns immediately.
    pub fn read_bytes(
        &mut self,
        path: impl AsRef<Path>,
        deliver: impl FnOnce(Result<Vec<u8>>) + 'static,
    ) {
        let continuation = Continuation::new(deliver);
        match to_native_path(path.as_ref()) {
            Ok(path) => {
                let (op, request) = ReadOperation::<Bytes>::begin(path, continuation);
                self.launch(Box::new(op), request);
            }
            Err(error) => continuation.complete(Err(FileError::Open(error))),
        }
    }

    /// Write text to a file, replacing any previous content.
    ///
    /// Registers the operation and returns immediately.
    pub fn write(
        &mut self,
        path: impl AsRef<Path>,
        text: &str,
        deliver: impl FnOnce(Result<()>) + 'static,
    ) {
        self.write_bytes(path, text.as_bytes().to_vec(), deliver);
    }

    /// Write a byte sequence to a file, replacing any previous content.
    ///
    /// Registers the operation and returns immediately.
    pub fn write_bytes(
        &mut self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        deliver: impl FnOnce(Result<()>) + 'static,
    ) {
        let continuation = Continuation::new(deliver);
        match to_native_path(path.as_ref()) {
            Ok(path) => {
                let (op, request) = WriteOperation::begin(path, content.into(), continuation);
                self.launch(Box::new(op), request);
            }
            Err(error) => continuation.complete(Err(FileError::Open(error))),
        }
    }

    /// Check whether a path exists.
    ///
    /// Registers the probe and returns immediately. All probe failures,
    /// including permission errors, collapse to `false`.
    pub fn exists(&mut self, path: impl AsRef<Path>, deliver: impl FnOnce(bool) + 'static) {
        let continuation = Continuation::new(deliver);
        match to_native_path(path.as_ref()) {
            Ok(path) => {
                let (op, request) = ExistsOperation::begin(path, continuation);
                self.launch(Box::new(op), request);
            }
            Err(_) => continuation.complete(false),
        }
    }

    /// Drain finished native requests without blocking, advancing their
    /// operations. Returns how many completions were dispatched.
    pub fn poll(&mut self) -> io::Result<usize> {
        let completions = self.reactor.try_complete()?;
        let count = completions.len();
        for Completion { token, result } in completions {
            self.dispatch(token, result);
        }
        Ok(count)
    }

    /// Drive every in-flight operation to its terminal state.
    pub fn run_until_idle(&mut self) -> io::Result<()> {
        while !self.pending.is_empty() {
            let completions = self.reactor.wait_for_completion()?;
            for Completion { token, result } in completions {
                self.dispatch(token, result);
            }
        }
        Ok(())
    }

    /// Operations (and fire-and-forget closes) not yet at a terminal state.
    pub fn operations_in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Name of the reactor driving this instance.
    pub fn reactor_name(&self) -> &'static str {
        self.reactor.name()
    }

    /// The driver's logger, for inspecting captured entries.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    fn alloc_token(&mut self) -> u64 {
        let token = self.next_token;
        // Wrapping add keeps long-running processes from panicking.
        self.next_token = self.next_token.wrapping_add(1);
        token
    }

    /// Submit `request` on behalf of `op`, parking the context until the
    /// completion comes back. A rejected submission resolves the operation
    /// immediately so it is never left unresolved.
    fn launch(&mut self, op: Box<dyn InFlight>, request: NativeOp) {
        let token = self.alloc_token();
        self.logger.log(
            LogEntry::new(
                LogLevel::Trace,
                "driver",
                format!("{} submitting {}", op.describe(), request.kind()),
            )
            .with_token(token),
        );

        match self.reactor.submit(request, token) {
            Ok(()) => {
                self.pending.insert(token, op);
            }
            Err(error) => {
                if let Some(fd) = op.reject(error, &mut self.logger) {
                    self.fire_close(fd);
                }
            }
        }
    }

    /// Close a descriptor without an observer. Best-effort on every exit
    /// path; a close that cannot even be submitted is only logged.
    fn fire_close(&mut self, fd: RawFd) {
        let token = self.alloc_token();
        match self.reactor.submit(NativeOp::Close { fd }, token) {
            Ok(()) => {
                self.pending.insert(token, Box::new(DiscardClose));
            }
            Err(error) => {
                self.logger.log(
                    LogEntry::new(LogLevel::Warn, "driver", format!("close not submitted: {error}"))
                        .with_fd(fd),
                );
            }
        }
    }

    fn dispatch(&mut self, token: u64, result: i32) {
        let Some(op) = self.pending.remove(&token) else {
            self.logger.log(
                LogEntry::new(LogLevel::Warn, "driver", "completion for unknown token")
                    .with_token(token),
            );
            return;
        };

        match op.absorb(result, &mut self.logger) {
            Step::Submit(op, request) => self.launch(op, request),
            Step::Settled(Some(fd)) => self.fire_close(fd),
            Step::Settled(None) => {}
        }
    }
}

impl std::fmt::Debug for FileIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileIo")
            .field("reactor", &self.reactor.name())
            .field("in_flight", &self.pending.len())
            .finish()
    }
}

/// Convert a path to the NUL-terminated form native calls expect.
fn to_native_path(path: &Path) -> io::Result<CString> {
    CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))
}
