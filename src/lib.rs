//! # Filament: completion-driven file I/O for managed runtimes
//!
//! Filament is the asynchronous file-I/O layer of a language runtime:
//! non-blocking read (text or bytes), write (text or bytes), and
//! existence-check primitives that deliver their result to a caller-supplied,
//! single-shot continuation. Each call becomes a small state machine (open,
//! then read-and-accumulate or write-until-done, then close) advanced
//! exclusively by completions drained from a pluggable reactor.
//!
//! ## Guarantees
//!
//! - **Exactly-once delivery**: every operation invokes its continuation
//!   exactly once, on every path: success, open failure, or mid-stream
//!   failure. [`Continuation`] makes double delivery a compile-time error
//!   and lost delivery a debug-checked one.
//! - **Scoped resource lifecycle**: operation contexts own their buffers;
//!   the open descriptor is closed exactly once on every exit path, and the
//!   accumulated content moves into the result instead of being copied out.
//! - **Sequential requests per operation**: a read operation never has two
//!   native reads in flight; the next chunk is requested only after the
//!   previous completion is absorbed.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use filament::FileIo;
//!
//! fn main() -> std::io::Result<()> {
//!     let mut io = FileIo::new()?;
//!
//!     io.write("/tmp/greeting.txt", "hello", |outcome| {
//!         if let Err(error) = outcome {
//!             eprintln!("write failed: {error}");
//!         }
//!     });
//!     io.run_until_idle()?;
//!
//!     io.read("/tmp/greeting.txt", |outcome| match outcome {
//!         Ok(text) => println!("{text}"),
//!         Err(error) => eprintln!("read failed: {error}"),
//!     });
//!     io.run_until_idle()
//! }
//! ```
//!
//! ## Concurrency model
//!
//! Scheduling is single-threaded and cooperative: entry points register the
//! operation and return immediately, and all progress, including
//! continuation invocation, happens inside [`FileIo::poll`] /
//! [`FileIo::run_until_idle`] on the calling thread. Any number of
//! operations may be in flight at once; each owns its state exclusively, so
//! no locking is involved. There is no cancellation and no timeout at this
//! layer: a registered operation always runs to a terminal state.
//!
//! ## Platform support
//!
//! Linux gets an io_uring reactor; every Unix platform gets the blocking
//! fallback reactor, which is also the deterministic backbone of the test
//! suites. Embedders can implement [`Reactor`] to drive the layer from
//! their own event loop.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod buffer; // fixed working buffer and growable accumulator
pub mod config; // driver and logging configuration
pub mod contents; // text vs. byte boxing of read results
pub mod continuation; // single-shot delivery
pub mod driver; // public entry points and completion dispatch
pub mod error; // failure taxonomy and native status translation
pub mod logging; // structured operation logging
pub mod reactor; // native I/O engine abstraction and implementations

mod operation; // per-call state machines (crate-internal)

pub use buffer::{Accumulator, ChunkBuffer, CHUNK_SIZE};
pub use config::{FileIoConfig, LoggingConfig};
pub use contents::{Bytes, ContentMode, Text};
pub use continuation::Continuation;
pub use driver::FileIo;
pub use error::{FileError, Result};
pub use logging::{LogEntry, LogLevel, Logger};
pub use reactor::blocking::BlockingReactor;
pub use reactor::{detect_reactor, Completion, NativeOp, Reactor};

#[cfg(target_os = "linux")]
pub use reactor::uring::UringReactor;
