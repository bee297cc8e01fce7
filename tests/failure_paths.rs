//! Failure-path and resource-accounting properties, exercised through a
//! scripted reactor: native results are planned per submission, read
//! completions fill the working buffer with a recognizable pattern, and
//! every successfully submitted request is recorded so tests can assert on
//! descriptor lifecycles and token uniqueness.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use filament::{Completion, FileError, FileIo, FileIoConfig, NativeOp, Reactor};

/// Scripted outcome for the next non-close submission.
enum Planned {
    Complete(i32),
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Record {
    kind: &'static str,
    token: u64,
    fd: i32,
    len: usize,
}

#[derive(Default)]
struct MockState {
    plan: VecDeque<Planned>,
    finished: VecDeque<Completion>,
    submitted: Vec<Record>,
    next_fill: u8,
}

/// Reactor whose completions follow a per-test script.
///
/// Fire-and-forget closes always succeed without consuming the script, so
/// plans only describe the operation's own requests.
struct MockReactor {
    state: Rc<RefCell<MockState>>,
}

impl MockReactor {
    fn with_plan(plan: Vec<Planned>) -> (Self, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState {
            plan: plan.into(),
            next_fill: 1,
            ..MockState::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl Reactor for MockReactor {
    fn submit(&mut self, op: NativeOp, token: u64) -> io::Result<()> {
        let mut state = self.state.borrow_mut();

        let (kind, fd, len, buf) = match &op {
            NativeOp::Open { .. } => ("open", -1, 0, None),
            NativeOp::Read { fd, buf, len, .. } => ("read", *fd, *len, Some(*buf)),
            NativeOp::Write { fd, len, .. } => ("write", *fd, *len, None),
            NativeOp::Access { .. } => ("access", -1, 0, None),
            NativeOp::Close { fd } => ("close", *fd, 0, None),
        };

        let planned = if kind == "close" {
            Planned::Complete(0)
        } else {
            state.plan.pop_front().expect("test script exhausted")
        };

        let result = match planned {
            Planned::Reject => return Err(io::Error::from_raw_os_error(libc::EAGAIN)),
            Planned::Complete(result) => result,
        };

        if kind == "read" && result > 0 {
            // Mimic the kernel filling the submitted working buffer; each
            // read gets a distinct fill byte so accumulation order shows.
            let fill = state.next_fill;
            state.next_fill += 1;
            let buf = buf.expect("read requests carry a buffer");
            unsafe { std::slice::from_raw_parts_mut(buf, result as usize) }.fill(fill);
        }

        state.submitted.push(Record {
            kind,
            token,
            fd,
            len,
        });
        state.finished.push_back(Completion { token, result });
        Ok(())
    }

    fn try_complete(&mut self) -> io::Result<Vec<Completion>> {
        Ok(self.state.borrow_mut().finished.drain(..).collect())
    }

    fn wait_for_completion(&mut self) -> io::Result<Vec<Completion>> {
        if self.state.borrow().finished.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no operations in flight to wait for",
            ));
        }
        self.try_complete()
    }

    fn operations_in_flight(&self) -> usize {
        self.state.borrow().finished.len()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

fn driver_with_plan(plan: Vec<Planned>) -> (FileIo, Rc<RefCell<MockState>>) {
    let (reactor, state) = MockReactor::with_plan(plan);
    (
        FileIo::with_reactor(Box::new(reactor), FileIoConfig::default()),
        state,
    )
}

fn capture<T: 'static>() -> (Rc<RefCell<Option<T>>>, impl FnOnce(T)) {
    let slot = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    (slot, move |value| *inner.borrow_mut() = Some(value))
}

fn kinds(state: &Rc<RefCell<MockState>>) -> Vec<&'static str> {
    state.borrow().submitted.iter().map(|r| r.kind).collect()
}

fn close_count_for(state: &Rc<RefCell<MockState>>, fd: i32) -> usize {
    state
        .borrow()
        .submitted
        .iter()
        .filter(|r| r.kind == "close" && r.fd == fd)
        .count()
}

#[test]
fn open_failure_never_reaches_the_read_stage() {
    let (mut io, state) = driver_with_plan(vec![Planned::Complete(-libc::ENOENT)]);
    let (slot, deliver) = capture();
    io.read("/missing", deliver);
    io.run_until_idle().unwrap();

    let error = slot.borrow_mut().take().unwrap().unwrap_err();
    assert!(matches!(error, FileError::Open(_)));
    assert_eq!(error.raw_os_error(), Some(libc::ENOENT));
    // Only the open was ever submitted: no read, and nothing to close.
    assert_eq!(kinds(&state), vec!["open"]);
}

#[test]
fn mid_stream_read_failure_closes_exactly_once() {
    let (mut io, state) = driver_with_plan(vec![
        Planned::Complete(7),
        Planned::Complete(5),
        Planned::Complete(-libc::EIO),
    ]);
    let (slot, deliver) = capture();
    io.read_bytes("/flaky", deliver);
    io.run_until_idle().unwrap();

    let error = slot.borrow_mut().take().unwrap().unwrap_err();
    assert!(matches!(error, FileError::Read(_)));
    assert_eq!(error.raw_os_error(), Some(libc::EIO));
    assert_eq!(kinds(&state), vec!["open", "read", "read", "close"]);
    assert_eq!(close_count_for(&state, 7), 1);
    assert_eq!(io.operations_in_flight(), 0);
}

#[test]
fn chunks_accumulate_in_completion_order() {
    let (mut io, _state) = driver_with_plan(vec![
        Planned::Complete(6),
        Planned::Complete(3),
        Planned::Complete(2),
        Planned::Complete(0),
    ]);
    let (slot, deliver) = capture();
    io.read_bytes("/chunked", deliver);
    io.run_until_idle().unwrap();

    // First read filled 3 bytes of 0x01, second 2 bytes of 0x02.
    let delivered = slot.borrow_mut().take().unwrap().unwrap();
    assert_eq!(delivered, vec![1, 1, 1, 2, 2]);
}

#[test]
fn short_writes_retry_until_the_content_is_flushed() {
    let (mut io, state) = driver_with_plan(vec![
        Planned::Complete(9),
        Planned::Complete(5),
        Planned::Complete(6),
    ]);
    let (slot, deliver) = capture();
    io.write("/out", "hello world", deliver);
    io.run_until_idle().unwrap();

    assert!(slot.borrow_mut().take().unwrap().is_ok());
    let write_lens: Vec<usize> = state
        .borrow()
        .submitted
        .iter()
        .filter(|r| r.kind == "write")
        .map(|r| r.len)
        .collect();
    assert_eq!(write_lens, vec![11, 6]);
    assert_eq!(close_count_for(&state, 9), 1);
}

#[test]
fn zero_progress_write_fails_instead_of_spinning() {
    let (mut io, state) =
        driver_with_plan(vec![Planned::Complete(9), Planned::Complete(0)]);
    let (slot, deliver) = capture();
    io.write("/out", "abc", deliver);
    io.run_until_idle().unwrap();

    let error = slot.borrow_mut().take().unwrap().unwrap_err();
    assert!(matches!(&error, FileError::Write(e) if e.kind() == io::ErrorKind::WriteZero));
    assert_eq!(close_count_for(&state, 9), 1);
}

#[test]
fn failed_probe_collapses_to_false_without_error() {
    let (mut io, state) = driver_with_plan(vec![Planned::Complete(-libc::EACCES)]);
    let (slot, deliver) = capture();
    io.exists("/forbidden", deliver);
    io.run_until_idle().unwrap();

    assert_eq!(slot.borrow_mut().take(), Some(false));
    assert_eq!(kinds(&state), vec!["access"]);
}

#[test]
fn rejected_open_submission_still_resolves_the_continuation() {
    let (mut io, state) = driver_with_plan(vec![Planned::Reject]);
    let (slot, deliver) = capture();
    io.read("/rejected", deliver);

    // Resolution is synchronous: nothing was ever in flight.
    let error = slot.borrow_mut().take().unwrap().unwrap_err();
    assert!(matches!(error, FileError::Open(_)));
    assert_eq!(io.operations_in_flight(), 0);
    assert!(kinds(&state).is_empty());
}

#[test]
fn rejected_follow_up_read_closes_the_descriptor() {
    let (mut io, state) = driver_with_plan(vec![Planned::Complete(7), Planned::Reject]);
    let (slot, deliver) = capture();
    io.read("/rejected-later", deliver);
    io.run_until_idle().unwrap();

    let error = slot.borrow_mut().take().unwrap().unwrap_err();
    assert!(matches!(error, FileError::Read(_)));
    assert_eq!(kinds(&state), vec!["open", "close"]);
    assert_eq!(close_count_for(&state, 7), 1);
}

#[test]
fn interleaved_operations_balance_every_descriptor() {
    // read(fd 7) fails mid-stream; write(fd 9) succeeds after a short
    // write; the probe settles without opening anything. Submissions are
    // interleaved by registering all three before the first poll.
    let (mut io, state) = driver_with_plan(vec![
        Planned::Complete(7),
        Planned::Complete(9),
        Planned::Complete(-libc::EPERM),
        Planned::Complete(-libc::EIO),
        Planned::Complete(2),
        Planned::Complete(1),
    ]);

    let (read_slot, deliver_read) = capture();
    let (write_slot, deliver_write) = capture();
    let (exists_slot, deliver_exists) = capture();
    io.read("/a", deliver_read);
    io.write("/b", "abc", deliver_write);
    io.exists("/c", deliver_exists);
    io.run_until_idle().unwrap();

    assert!(matches!(
        read_slot.borrow_mut().take().unwrap().unwrap_err(),
        FileError::Read(_)
    ));
    assert!(write_slot.borrow_mut().take().unwrap().is_ok());
    assert_eq!(exists_slot.borrow_mut().take(), Some(false));

    assert_eq!(close_count_for(&state, 7), 1);
    assert_eq!(close_count_for(&state, 9), 1);

    let state = state.borrow();
    let mut tokens: Vec<u64> = state.submitted.iter().map(|r| r.token).collect();
    let total = tokens.len();
    tokens.sort_unstable();
    tokens.dedup();
    assert_eq!(tokens.len(), total, "native request tokens must be unique");
}
