//! Per-call operation state machines.
//!
//! Every public entry point constructs one operation context (the mutable
//! state spanning the asynchronous stages of a single read, write, or
//! existence check) and parks it in the driver's in-flight table. The
//! context is advanced exclusively by completions of its own native
//! requests, issues at most one request at a time, and is removed from the
//! table exactly once, at its terminal transition. Terminal transitions
//! deliver the continuation and hand any open descriptor back to the driver
//! for a fire-and-forget close.

mod exists;
mod read;
mod write;

pub(crate) use exists::ExistsOperation;
pub(crate) use read::ReadOperation;
pub(crate) use write::WriteOperation;

use std::io;
use std::os::unix::io::RawFd;

use crate::logging::{LogEntry, LogLevel, Logger};
use crate::reactor::NativeOp;

/// What the driver must do after an operation absorbed a completion.
pub(crate) enum Step {
    /// Issue the next native request under a fresh token; the operation
    /// stays in flight.
    Submit(Box<dyn InFlight>, NativeOp),
    /// Terminal state reached and the continuation delivered. The
    /// descriptor, if present, still needs a fire-and-forget close.
    Settled(Option<RawFd>),
}

/// An operation context parked in the driver's in-flight table.
pub(crate) trait InFlight {
    /// Absorb the completion of this operation's pending request and
    /// transition the state machine.
    fn absorb(self: Box<Self>, result: i32, logger: &mut Logger) -> Step;

    /// The reactor rejected this operation's next request at submission
    /// time; resolve the continuation with a failure so the operation is
    /// not left unresolved. Returns the descriptor to close when one was
    /// already open.
    fn reject(self: Box<Self>, error: io::Error, logger: &mut Logger) -> Option<RawFd>;

    /// Label for log entries.
    fn describe(&self) -> &'static str;
}

/// Table entry for a fire-and-forget close.
///
/// Closing is best-effort on every exit path: the completion carries no
/// observer, and a failed close is only logged.
pub(crate) struct DiscardClose;

impl InFlight for DiscardClose {
    fn absorb(self: Box<Self>, result: i32, logger: &mut Logger) -> Step {
        if result < 0 {
            logger.log(LogEntry::new(
                LogLevel::Debug,
                "close",
                format!("close completed with error ({result})"),
            ));
        }
        Step::Settled(None)
    }

    fn reject(self: Box<Self>, _error: io::Error, _logger: &mut Logger) -> Option<RawFd> {
        None
    }

    fn describe(&self) -> &'static str {
        "close"
    }
}
