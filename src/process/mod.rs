//! # Process API
//!
//! Functions actor code calls to inspect and wire up processes. The calling actor is
//! resolved through the context stack, so every operation that needs "self" fails with
//! [`ProcessError::InvalidCall`] when invoked from plain host code.
//!
//! ## Supervision
//!
//! - [`link`] / [`unlink`]: symmetric. An abnormal exit of either side is delivered to
//!   the other as an exit signal.
//! - [`monitor`] / [`demonitor`]: one-way. Each call returns a fresh [`MonitorRef`]; the
//!   observer gets one [`DOWN`](crate::DOWN) message per ref when the target terminates.
//! - [`flag`]`(Flag::TrapExit, true)`: turns incoming exit signals (other than `kill` and
//!   the actor's own) into [`EXIT`](crate::EXIT) mailbox messages.
//!
//! ```rust
//! use proclet::process;
//! use proclet::{receive, spawn, Effect, Reason, DOWN};
//!
//! let watcher = spawn(|| {
//!     let worker = spawn(|| Ok(receive().build()?.into()));
//!     process::monitor(worker)?;
//!     process::exit(worker, Reason::error("boom"))?;
//!     Ok(receive()
//!         .on(DOWN, |msg| {
//!             assert_eq!(msg.down_signal().map(|d| d.reason.to_string()).as_deref(), Some("boom"));
//!             Ok(Effect::done())
//!         })
//!         .build()?
//!         .into())
//! });
//! assert!(!watcher.is_alive());
//! ```

pub mod spawn;

use crate::framework::actor::Status;
use crate::framework::context;
use crate::framework::error::{ActorError, ProcessError};
use crate::framework::message::{Envelope, ExitSignal, Message, MonitorRef, Reason};
use crate::framework::registry::{self, ActorRef};
use std::str::FromStr;
use tracing::debug;

/// Process flags settable with [`flag`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flag {
    TrapExit,
}

impl FromStr for Flag {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trapExit" | "trap_exit" => Ok(Flag::TrapExit),
            other => Err(ProcessError::ArgumentError(format!("unknown process flag `{other}`"))),
        }
    }
}

/// Snapshot of one actor's engine state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: ActorRef,
    pub parent: Option<ActorRef>,
    pub status: Status,
    pub message_queue_len: usize,
    pub stashed: usize,
    pub trap_exit: bool,
    pub stack_depth: usize,
    pub links: Vec<ActorRef>,
    pub monitors: Vec<(MonitorRef, ActorRef)>,
    pub monitored_by: Vec<(ActorRef, MonitorRef)>,
}

/// Sets a flag on the calling actor and returns its previous value.
pub fn flag(flag: Flag, value: bool) -> Result<bool, ProcessError> {
    let me = context::require()?;
    let cell = registry::lookup(me).ok_or(ProcessError::NoProc(me))?;
    let previous = match flag {
        Flag::TrapExit => std::mem::replace(&mut cell.borrow_mut().trap_exit, value),
    };
    debug!(pid = %me, ?flag, value, previous, "Flag set");
    Ok(previous)
}

/// Links the calling actor with `target`. Linking to self is a no-op.
pub fn link(target: ActorRef) -> Result<(), ProcessError> {
    let me = context::require()?;
    link_pair(me, target)
}

/// Removes the link between the calling actor and `target`. Always reports success.
pub fn unlink(target: ActorRef) -> Result<bool, ProcessError> {
    let me = context::require()?;
    for (a, b) in [(me, target), (target, me)] {
        if let Some(cell) = registry::lookup(a) {
            cell.borrow_mut().links.remove(&b);
        }
    }
    Ok(true)
}

/// Starts monitoring `target` from the calling actor.
///
/// A dead target still yields a fresh ref, but nothing is recorded and no `DOWN` follows.
pub fn monitor(target: ActorRef) -> Result<MonitorRef, ProcessError> {
    let me = context::require()?;
    Ok(add_monitor(me, target))
}

/// Drops one monitor created by the calling actor. Returns whether it was still active.
pub fn demonitor(monitor: MonitorRef) -> Result<bool, ProcessError> {
    let me = context::require()?;
    let cell = registry::lookup(me).ok_or(ProcessError::NoProc(me))?;
    let Some(target) = cell.borrow_mut().monitors.remove(&monitor) else {
        return Ok(false);
    };
    if let Some(target_cell) = registry::lookup(target) {
        let mut observed = target_cell.borrow_mut();
        if let Some(refs) = observed.monitored_by.get_mut(&me) {
            refs.remove(&monitor);
            if refs.is_empty() {
                observed.monitored_by.remove(&me);
            }
        }
    }
    debug!(pid = %me, %monitor, %target, "Demonitor");
    Ok(true)
}

/// Sends an exit signal from the calling actor to `target`. Returns whether it was alive.
pub fn exit(target: ActorRef, reason: Reason) -> Result<bool, ProcessError> {
    let me = context::require()?;
    let alive = target.is_alive();
    target.send(ExitSignal { sender: me, reason });
    Ok(alive)
}

pub fn alive(target: ActorRef) -> bool {
    target.is_alive()
}

/// Every live actor, in spawn order.
pub fn list() -> Vec<ActorRef> {
    registry::list()
}

/// Registers `callback` to run when `target` terminates. `false` if it is already gone.
pub fn on_terminate(target: ActorRef, callback: impl FnOnce() + 'static) -> bool {
    let Some(cell) = registry::lookup(target) else {
        return false;
    };
    let registered = cell.borrow_mut().on_terminate(Box::new(callback));
    registered
}

pub fn info(target: ActorRef) -> Option<ProcessInfo> {
    let cell = registry::lookup(target)?;
    let actor = cell.borrow();
    let info = ProcessInfo {
        pid: actor.pid(),
        parent: actor.parent(),
        status: actor.status(),
        message_queue_len: actor.mailbox.len(),
        stashed: actor.mailbox.stashed(),
        trap_exit: actor.trap_exit,
        stack_depth: actor.stack_depth(),
        links: actor.links.iter().copied().collect(),
        monitors: actor.monitors.iter().map(|(r, pid)| (*r, *pid)).collect(),
        monitored_by: actor
            .monitored_by
            .iter()
            .flat_map(|(pid, refs)| refs.iter().map(move |r| (*pid, *r)))
            .collect(),
    };
    Some(info)
}

// =============================================================================
// CALLING-ACTOR SHORTHANDS
// =============================================================================

/// Sends a message or signal to `target`.
pub fn send(target: ActorRef, msg: impl Into<Envelope>) {
    target.send(msg);
}

/// The calling actor's own ref.
pub fn pid() -> Result<ActorRef, ProcessError> {
    context::require()
}

pub fn parent() -> Result<Option<ActorRef>, ProcessError> {
    let me = context::require()?;
    let Some(cell) = registry::lookup(me) else {
        return Ok(None);
    };
    let parent = cell.borrow().parent();
    Ok(parent)
}

/// Terminates the calling actor with `reason`.
///
/// The exit signal is dispatched right away; the returned error only unwinds the
/// caller's own code, so use it as `return process::exit_self(reason)`.
pub fn exit_self<T>(reason: Reason) -> Result<T, ActorError> {
    let me = context::require()?;
    me.send(ExitSignal {
        sender: me,
        reason: reason.clone(),
    });
    Err(ActorError::Exit(reason))
}

/// Moves `msg` into the calling actor's stash.
pub fn stash(msg: Message) -> Result<(), ProcessError> {
    let me = context::require()?;
    let cell = registry::lookup(me).ok_or(ProcessError::NoProc(me))?;
    cell.borrow_mut().mailbox.stash(msg);
    Ok(())
}

/// Returns every stashed message to the front of the calling actor's mailbox.
pub fn unstash_all() -> Result<(), ProcessError> {
    unstash_where(|_| true)
}

/// Returns the stashed messages accepted by `filter`; the rest are discarded.
pub fn unstash_where(filter: impl FnMut(&Message) -> bool) -> Result<(), ProcessError> {
    let me = context::require()?;
    let cell = registry::lookup(me).ok_or(ProcessError::NoProc(me))?;
    cell.borrow_mut().mailbox.unstash_where(filter);
    Ok(())
}

pub(crate) fn link_pair(me: ActorRef, target: ActorRef) -> Result<(), ProcessError> {
    if me == target {
        return Ok(());
    }
    let mine = registry::lookup(me).ok_or(ProcessError::NoProc(me))?;
    let theirs = registry::lookup(target).ok_or(ProcessError::NoProc(target))?;
    mine.borrow_mut().links.insert(target);
    theirs.borrow_mut().links.insert(me);
    debug!(pid = %me, %target, "Linked");
    Ok(())
}

pub(crate) fn add_monitor(observer: ActorRef, target: ActorRef) -> MonitorRef {
    let monitor = registry::next_monitor_ref();
    let (Some(mine), Some(theirs)) = (registry::lookup(observer), registry::lookup(target)) else {
        return monitor;
    };
    mine.borrow_mut().monitors.insert(monitor, target);
    theirs
        .borrow_mut()
        .monitored_by
        .entry(observer)
        .or_default()
        .insert(monitor);
    debug!(pid = %observer, %monitor, %target, "Monitoring");
    monitor
}
