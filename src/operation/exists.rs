//! Existence check: a single access probe.
//!
//! The only single-stage operation. Any negative native result, permission
//! errors included, collapses to `false`; no error value ever reaches the
//! continuation.

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

use crate::continuation::Continuation;
use crate::logging::{LogEntry, LogLevel, Logger};
use crate::operation::{InFlight, Step};
use crate::reactor::NativeOp;

/// Context of one in-flight existence probe.
pub(crate) struct ExistsOperation {
    continuation: Continuation<bool>,
}

impl ExistsOperation {
    /// Construct the operation context and its probe request.
    pub(crate) fn begin(path: CString, continuation: Continuation<bool>) -> (Self, NativeOp) {
        let op = Self { continuation };
        let request = NativeOp::Access {
            path,
            mode: libc::F_OK,
        };
        (op, request)
    }
}

impl InFlight for ExistsOperation {
    fn absorb(self: Box<Self>, result: i32, logger: &mut Logger) -> Step {
        let this = *self;
        let exists = result >= 0;
        logger.log(LogEntry::new(
            LogLevel::Debug,
            "exists",
            format!("probe resolved ({exists})"),
        ));
        this.continuation.complete(exists);
        Step::Settled(None)
    }

    fn reject(self: Box<Self>, error: io::Error, logger: &mut Logger) -> Option<RawFd> {
        let this = *self;
        logger.log(LogEntry::new(
            LogLevel::Warn,
            "exists",
            format!("submission rejected: {error}"),
        ));
        this.continuation.complete(false);
        None
    }

    fn describe(&self) -> &'static str {
        "exists"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use std::cell::Cell;
    use std::rc::Rc;

    fn probe(result: i32) -> bool {
        let answer = Rc::new(Cell::new(None));
        let inner = Rc::clone(&answer);
        let (op, request) = ExistsOperation::begin(
            CString::new("/probe").unwrap(),
            Continuation::new(move |exists| inner.set(Some(exists))),
        );
        assert_eq!(request.kind(), "access");

        let step = Box::new(op).absorb(result, &mut Logger::new(LoggingConfig::default()));
        let Step::Settled(None) = step else {
            panic!("a probe settles immediately and owns no descriptor");
        };
        answer.get().unwrap()
    }

    #[test]
    fn non_negative_result_means_present() {
        assert!(probe(0));
    }

    #[test]
    fn missing_path_collapses_to_false() {
        assert!(!probe(-libc::ENOENT));
    }

    #[test]
    fn permission_failure_also_collapses_to_false() {
        assert!(!probe(-libc::EACCES));
    }

    #[test]
    fn rejection_collapses_to_false() {
        let answer = Rc::new(Cell::new(None));
        let inner = Rc::clone(&answer);
        let (op, _request) = ExistsOperation::begin(
            CString::new("/probe").unwrap(),
            Continuation::new(move |exists| inner.set(Some(exists))),
        );

        let error = io::Error::from_raw_os_error(libc::EAGAIN);
        let fd = Box::new(op).reject(error, &mut Logger::new(LoggingConfig::default()));
        assert_eq!(fd, None);
        assert_eq!(answer.get(), Some(false));
    }
}
