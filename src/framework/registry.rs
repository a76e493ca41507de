//! # Process Registry
//!
//! The registry is the single source of truth for liveness. It maps integer process
//! ids to live actors and hands out ids from a monotonic allocator, so an id is never
//! reused. Supervision tables store [`ActorRef`]s (ids), never pointers, which means an
//! actor's destruction can never dangle another actor's table: a lookup simply fails.
//!
//! The table is thread-local. Every actor runs on the one scheduler thread that spawned
//! it, and `Rc`-based actor cells never leave that thread.

use crate::framework::actor::{self, ActorCell};
use crate::framework::message::{Envelope, MonitorRef};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{trace, warn};

static NEXT_PID: AtomicU64 = AtomicU64::new(0);
static NEXT_REF: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PROCESSES: RefCell<HashMap<u64, ActorCell>> = RefCell::new(HashMap::new());
}

/// Immutable capability handle used to address an actor.
///
/// Equality, ordering and hashing are by id. A ref outlives its actor: once the actor
/// terminates, lookups fail and sends are silently dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorRef {
    id: u64,
}

impl ActorRef {
    pub(crate) fn new(id: u64) -> Self {
        Self { id }
    }

    /// The process-unique id of this actor.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Sends an ordinary message or a system signal to this actor.
    ///
    /// Ordinary messages are enqueued and may resume the actor synchronously; exit
    /// signals are dispatched to the actor's exit handler immediately. Sending to a dead
    /// actor is a no-op.
    pub fn send(&self, msg: impl Into<Envelope>) {
        let envelope = msg.into();
        match lookup(*self) {
            Some(cell) => actor::deliver(&cell, envelope),
            None => trace!(pid = %self, kind = envelope.kind(), "Dropped send to dead actor"),
        }
    }

    /// Whether the actor is still registered.
    pub fn is_alive(&self) -> bool {
        is_alive(*self)
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<0.{}.0>", self.id)
    }
}

impl fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub(crate) fn next_pid() -> ActorRef {
    ActorRef::new(NEXT_PID.fetch_add(1, Ordering::Relaxed))
}

pub(crate) fn next_monitor_ref() -> MonitorRef {
    MonitorRef::new(NEXT_REF.fetch_add(1, Ordering::Relaxed))
}

pub(crate) fn register(pid: ActorRef, cell: ActorCell) {
    PROCESSES.with(|table| {
        if table.borrow_mut().insert(pid.id, cell).is_some() {
            // Ids come from a monotonic allocator, so this only fires on a broken invariant.
            warn!(%pid, "Pid registered twice");
        }
    });
}

pub(crate) fn unregister(pid: ActorRef) -> bool {
    PROCESSES.with(|table| table.borrow_mut().remove(&pid.id).is_some())
}

/// Resolves a ref to its live actor. The table borrow is released before returning.
pub(crate) fn lookup(pid: ActorRef) -> Option<ActorCell> {
    PROCESSES.with(|table| table.borrow().get(&pid.id).cloned())
}

pub(crate) fn is_alive(pid: ActorRef) -> bool {
    PROCESSES.with(|table| table.borrow().contains_key(&pid.id))
}

/// All live actors on this scheduler thread, in spawn order.
pub(crate) fn list() -> Vec<ActorRef> {
    let mut pids: Vec<ActorRef> =
        PROCESSES.with(|table| table.borrow().keys().map(|id| ActorRef::new(*id)).collect());
    pids.sort();
    pids
}
