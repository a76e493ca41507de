//! # Actor Engine
//!
//! This module owns the per-actor state machine and the trampoline that drives it.
//!
//! ## States
//!
//! - **Continue**: the top-of-stack computation is ready to be resumed with the stored feedback.
//! - **Waiting**: suspended on the installed [`Behavior`] until it accepts a mailbox message.
//! - **Running**: blocked on an awaited future. Only its completion moves the actor on.
//! - **Done**: terminal. The actor is deregistered and never resumes.
//!
//! ## The Trampoline
//!
//! [`drive`] loops `step` → `arbitrate` until the actor suspends. `step` resumes the top
//! computation or feeds one accepted message to the receiver; `arbitrate` turns the
//! resulting [`Effect`] into the next state. User code never runs while a `RefCell`
//! borrow of the actor is held, so it may freely call back into the runtime.
//!
//! ## The Run Queue
//!
//! Actors are never driven from inside another actor's step. Every entry into the
//! engine (a send, a spawn, a timer, a completion) goes through `run`: the outermost
//! entry marks the scheduler busy and then works off the thread-local run queue until
//! it is empty. While the scheduler is busy, sends only enqueue and schedule the
//! target, and exit signals cascading from a termination are queued as well. Stack
//! depth therefore stays flat however long a forwarding chain or a link chain gets.
//! Exit signals sent directly by actor code are still dispatched at send time.
//!
//! Faults (errors and panics) raised by user code are caught here and become the
//! actor's own exit reason; they never reach the scheduler.

use crate::framework::behavior::Behavior;
use crate::framework::computation::{BoxFuture, Computation, Deferred, Effect, Step};
use crate::framework::context;
use crate::framework::error::ActorError;
use crate::framework::mailbox::Mailbox;
use crate::framework::message::{DownSignal, Envelope, ExitSignal, Message, MonitorRef, Reason, Term};
use crate::framework::registry::{self, ActorRef};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

/// Lifecycle state of an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Continue,
    Waiting,
    Running,
    Done,
}

pub(crate) type ActorCell = Rc<RefCell<Actor>>;

pub(crate) struct Actor {
    pid: ActorRef,
    parent: Option<ActorRef>,
    status: Status,
    pub(crate) mailbox: Mailbox<Message>,
    stack: Vec<Box<dyn Computation>>,
    receiver: Option<Behavior>,
    feedback: Option<Term>,
    /// Bumped whenever a receiver is installed or taken down; stale timers compare against it.
    epoch: u64,
    timer: Option<AbortHandle>,
    pub(crate) trap_exit: bool,
    pub(crate) links: BTreeSet<ActorRef>,
    pub(crate) monitors: BTreeMap<MonitorRef, ActorRef>,
    pub(crate) monitored_by: BTreeMap<ActorRef, BTreeSet<MonitorRef>>,
    disposers: Vec<Box<dyn FnOnce()>>,
}

impl Actor {
    pub(crate) fn new(pid: ActorRef, parent: Option<ActorRef>, entry: Box<dyn Computation>) -> Self {
        Self {
            pid,
            parent,
            status: Status::Continue,
            mailbox: Mailbox::new(),
            stack: vec![entry],
            receiver: None,
            feedback: None,
            epoch: 0,
            timer: None,
            trap_exit: false,
            links: BTreeSet::new(),
            monitors: BTreeMap::new(),
            monitored_by: BTreeMap::new(),
            disposers: Vec::new(),
        }
    }

    pub(crate) fn pid(&self) -> ActorRef {
        self.pid
    }

    pub(crate) fn parent(&self) -> Option<ActorRef> {
        self.parent
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Registers a callback to run once at termination. Fails once the actor is done.
    pub(crate) fn on_terminate(&mut self, callback: Box<dyn FnOnce()>) -> bool {
        if self.status == Status::Done {
            return false;
        }
        self.disposers.push(callback);
        true
    }

    /// Takes down the armed receive timeout, if any.
    fn disarm(&mut self) {
        self.epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Work waiting for the scheduler.
enum Task {
    Drive(ActorRef),
    Signal(ActorRef, ExitSignal),
}

thread_local! {
    static RUN_QUEUE: RefCell<VecDeque<Task>> = const { RefCell::new(VecDeque::new()) };
    static BUSY: Cell<bool> = const { Cell::new(false) };
}

/// Clears the busy flag even if a task unwinds.
struct Busy;

impl Busy {
    fn enter() -> Self {
        BUSY.with(|busy| busy.set(true));
        Busy
    }
}

impl Drop for Busy {
    fn drop(&mut self) {
        BUSY.with(|busy| busy.set(false));
    }
}

fn schedule(task: Task) {
    RUN_QUEUE.with(|queue| queue.borrow_mut().push_back(task));
}

/// Runs `f` as engine work. The outermost call then drains the run queue.
fn run(f: impl FnOnce()) {
    if BUSY.with(Cell::get) {
        f();
        return;
    }
    let _busy = Busy::enter();
    f();
    while let Some(task) = RUN_QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
        match task {
            Task::Drive(pid) => {
                if let Some(cell) = registry::lookup(pid) {
                    drive(&cell);
                }
            }
            Task::Signal(pid, signal) => {
                if let Some(cell) = registry::lookup(pid) {
                    on_exit_signal(&cell, signal);
                }
            }
        }
    }
}

pub(crate) fn start(cell: &ActorCell) {
    let pid = {
        let mut actor = cell.borrow_mut();
        actor.status = Status::Continue;
        actor.pid
    };
    info!(%pid, "Started");
    run(|| schedule(Task::Drive(pid)));
}

/// Delivers an envelope: exit signals are handled at once, messages are enqueued.
pub(crate) fn deliver(cell: &ActorCell, envelope: Envelope) {
    run(|| match envelope {
        Envelope::Exit(signal) => on_exit_signal(cell, signal),
        Envelope::Message(msg) => {
            let mut actor = cell.borrow_mut();
            if actor.status == Status::Done {
                return;
            }
            // An observed DOWN retires the observer's monitor entry.
            if let Some(down) = msg.down_signal() {
                actor.monitors.remove(&down.monitor);
            }
            debug!(pid = %actor.pid, kind = msg.kind(), queued = actor.mailbox.len() + 1, "Enqueued");
            actor.mailbox.enqueue(msg);
            schedule(Task::Drive(actor.pid));
        }
    });
}

/// Runs the actor until it suspends. Only the run queue calls this.
fn drive(cell: &ActorCell) {
    while let Some(effect) = step(cell) {
        arbitrate(cell, effect);
    }
}

/// Advances the actor by one computation step or one handled message.
///
/// Step results are resolved here: a computation that yields stays on the stack, one
/// that completes is popped. Either way its effect is returned for arbitration.
fn step(cell: &ActorCell) -> Option<Effect> {
    let mut actor = cell.borrow_mut();
    let pid = actor.pid;
    match actor.status {
        Status::Done | Status::Running => None,
        Status::Continue => {
            let feedback = actor.feedback.take();
            let Some(mut top) = actor.stack.pop() else {
                return Some(Effect::Return(feedback));
            };
            drop(actor);

            let result = invoke(pid, || top.resume(feedback));

            let mut actor = cell.borrow_mut();
            if actor.status == Status::Done {
                return None;
            }
            match result {
                Ok(Step::Yield(effect)) => {
                    actor.stack.push(top);
                    Some(effect)
                }
                Ok(Step::Complete(effect)) => Some(effect),
                Err(err) => Some(fault(pid, err)),
            }
        }
        Status::Waiting => {
            let Actor { receiver, mailbox, .. } = &mut *actor;
            let msg = match receiver.as_ref() {
                None => return None,
                Some(behavior) if behavior.is_selective() => mailbox.pick(|msg| behavior.accepts(msg))?,
                Some(_) => mailbox.dequeue()?,
            };
            let mut behavior = receiver.take()?;
            actor.disarm();
            drop(actor);

            debug!(%pid, kind = msg.kind(), "Handling");
            let result = invoke(pid, || behavior.handle(msg));

            let mut actor = cell.borrow_mut();
            if actor.status == Status::Done {
                return None;
            }
            // Catch-all behaviors stay installed until something replaces them.
            if !behavior.is_selective() && actor.receiver.is_none() {
                actor.receiver = Some(behavior);
            }
            Some(result.unwrap_or_else(|err| fault(pid, err)))
        }
    }
}

/// Turns a produced effect into the actor's next state.
fn arbitrate(cell: &ActorCell, effect: Effect) {
    let mut actor = cell.borrow_mut();
    if actor.status == Status::Done {
        return;
    }
    let pid = actor.pid;
    match effect {
        Effect::Become(behavior) => {
            actor.disarm();
            actor.status = Status::Waiting;
            if let Some(ttl) = behavior.ttl() {
                let epoch = actor.epoch;
                let timer = async move {
                    tokio::time::sleep(ttl).await;
                    on_timeout(pid, epoch);
                };
                match spawn_local(timer) {
                    Ok(handle) => {
                        debug!(%pid, ?ttl, "Receive timeout armed");
                        actor.timer = Some(handle);
                    }
                    Err(err) => {
                        drop(actor);
                        terminate(cell, fault_signal(pid, err));
                        return;
                    }
                }
            }
            debug!(%pid, ?behavior, "Become");
            actor.receiver = Some(behavior);
        }
        Effect::Nested(computation) => {
            actor.stack.push(computation);
            actor.status = Status::Continue;
            actor.feedback = None;
        }
        Effect::Await(fut) => {
            actor.status = Status::Running;
            drop(actor);
            debug!(%pid, "Awaiting completion");
            let task = async move {
                let result = Scoped { pid, fut }.await;
                on_completion(pid, result);
            };
            if let Err(err) = spawn_local(task) {
                terminate(cell, fault_signal(pid, err));
            }
        }
        Effect::Exit(reason) => {
            drop(actor);
            terminate(cell, ExitSignal { sender: pid, reason });
        }
        Effect::Return(value) => {
            if !actor.stack.is_empty() {
                actor.status = Status::Continue;
                actor.feedback = value;
            } else if actor.receiver.is_some() {
                actor.status = Status::Waiting;
            } else {
                drop(actor);
                terminate(cell, ExitSignal { sender: pid, reason: Reason::Normal });
            }
        }
    }
}

fn on_timeout(pid: ActorRef, epoch: u64) {
    let Some(cell) = registry::lookup(pid) else {
        return;
    };
    run(|| {
        let mut actor = cell.borrow_mut();
        if actor.status == Status::Done || actor.epoch != epoch {
            return;
        }
        let Some(mut behavior) = actor.receiver.take() else {
            return;
        };
        actor.timer = None;
        actor.disarm();
        debug!(%pid, "Receive timeout fired");
        let computation: Box<dyn Computation> = match behavior.take_fallback() {
            Some(fallback) => Box::new(Deferred::new(fallback)),
            None => Box::new(Deferred::new(|| Ok(Effect::done()))),
        };
        actor.stack.push(computation);
        actor.status = Status::Continue;
        actor.feedback = None;
        schedule(Task::Drive(pid));
    });
}

fn on_completion(pid: ActorRef, result: Result<Effect, ActorError>) {
    let Some(cell) = registry::lookup(pid) else {
        debug!(%pid, "Completion ignored, actor is gone");
        return;
    };
    if cell.borrow().status != Status::Running {
        return;
    }
    run(|| match result {
        Ok(effect) => {
            arbitrate(&cell, effect);
            schedule(Task::Drive(pid));
        }
        // Rejections come from the actor's own execution, so they terminate it directly.
        Err(err) => terminate(&cell, fault_signal(pid, err)),
    });
}

/// Applies the exit-signal policy.
fn on_exit_signal(cell: &ActorCell, signal: ExitSignal) {
    let (pid, trap_exit) = {
        let actor = cell.borrow();
        if actor.status == Status::Done {
            return;
        }
        (actor.pid, actor.trap_exit)
    };
    let from_self = signal.sender == pid;

    if signal.reason == Reason::Kill || from_self {
        terminate(cell, signal);
    } else if trap_exit {
        debug!(%pid, from = %signal.sender, reason = %signal.reason, "Exit trapped");
        deliver(cell, Envelope::Message(Message::trapped(signal)));
    } else if !signal.reason.is_normal() {
        terminate(cell, signal);
    }
}

/// Terminates the actor exactly once and propagates the outcome to links and monitors.
pub(crate) fn terminate(cell: &ActorCell, signal: ExitSignal) {
    run(|| shut_down(cell, signal));
}

fn shut_down(cell: &ActorCell, signal: ExitSignal) {
    let (pid, disposers, leftovers) = {
        let mut actor = cell.borrow_mut();
        if actor.status == Status::Done {
            warn!(pid = %actor.pid, reason = %signal.reason, "Terminate called twice");
            return;
        }
        actor.status = Status::Done;
        actor.disarm();
        let leftovers = (
            std::mem::take(&mut actor.stack),
            actor.receiver.take(),
            actor.feedback.take(),
        );
        (actor.pid, std::mem::take(&mut actor.disposers), leftovers)
    };
    drop(leftovers);
    registry::unregister(pid);

    for dispose in disposers {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(dispose)) {
            warn!(%pid, error = %panic_message(&*payload), "Disposal callback panicked");
        }
    }

    let reason = match signal.reason {
        Reason::Kill => Reason::Killed,
        other => other,
    };
    if reason.is_normal() {
        info!(%pid, "Terminated");
    } else {
        warn!(%pid, %reason, "Terminated");
    }

    let (links, monitored_by, monitors) = {
        let mut actor = cell.borrow_mut();
        (
            std::mem::take(&mut actor.links),
            std::mem::take(&mut actor.monitored_by),
            std::mem::take(&mut actor.monitors),
        )
    };

    let exit = ExitSignal { sender: pid, reason: reason.clone() };
    for peer in links {
        if let Some(peer_cell) = registry::lookup(peer) {
            peer_cell.borrow_mut().links.remove(&pid);
            schedule(Task::Signal(peer, exit.clone()));
        }
    }

    for (observer, refs) in monitored_by {
        for monitor in refs {
            let down = DownSignal { sender: pid, monitor, reason: reason.clone() };
            observer.send(Message::down(down));
        }
    }

    for observed in monitors.into_values() {
        if let Some(observed_cell) = registry::lookup(observed) {
            observed_cell.borrow_mut().monitored_by.remove(&pid);
        }
    }
}

/// Runs user code as `pid`, converting panics into faults.
fn invoke<T>(pid: ActorRef, f: impl FnOnce() -> Result<T, ActorError>) -> Result<T, ActorError> {
    context::provide(pid, || match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(ActorError::Panicked(panic_message(&*payload))),
    })
}

fn fault(pid: ActorRef, err: ActorError) -> Effect {
    if !matches!(err, ActorError::Exit(_)) {
        warn!(%pid, error = %err, "Actor fault");
    }
    Effect::Exit(err.into_reason())
}

fn fault_signal(pid: ActorRef, err: ActorError) -> ExitSignal {
    ExitSignal { sender: pid, reason: err.into_reason() }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn spawn_local(task: impl Future<Output = ()> + 'static) -> Result<AbortHandle, ActorError> {
    // `spawn_local` panics outside a LocalSet; that is a host setup error, not an actor fault.
    panic::catch_unwind(AssertUnwindSafe(move || tokio::task::spawn_local(task).abort_handle()))
        .map_err(|_| ActorError::NoScheduler)
}

/// Polls an awaited future inside its actor's context, catching panics.
struct Scoped {
    pid: ActorRef,
    fut: BoxFuture,
}

impl Future for Scoped {
    type Output = Result<Effect, ActorError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let pid = this.pid;
        let fut = &mut this.fut;
        context::provide(pid, || {
            match panic::catch_unwind(AssertUnwindSafe(|| fut.as_mut().poll(cx))) {
                Ok(poll) => poll,
                Err(payload) => Poll::Ready(Err(ActorError::Panicked(panic_message(&*payload)))),
            }
        })
    }
}
