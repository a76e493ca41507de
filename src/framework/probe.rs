//! # Probe
//!
//! A recording actor for tests. It accepts every message, keeps a copy and never exits
//! on its own, so assertions can look at exactly what reached it.
//!
//! ```rust
//! use proclet::{Message, Probe};
//!
//! let probe = Probe::spawn();
//! probe.pid().send(Message::new("PING"));
//! probe.pid().send(Message::new("PONG"));
//! assert_eq!(probe.kinds(), vec!["PING", "PONG"]);
//! ```
//!
//! Use [`Probe::trapping`] to observe exit signals: linked failures then show up as
//! [`EXIT`](crate::EXIT) messages instead of killing the probe.

use crate::framework::behavior::Behavior;
use crate::framework::computation::Effect;
use crate::framework::message::{DownSignal, ExitSignal, Message};
use crate::framework::registry::ActorRef;
use crate::process::{self, spawn::spawn, Flag};
use std::cell::RefCell;
use std::rc::Rc;

pub struct Probe {
    pid: ActorRef,
    received: Rc<RefCell<Vec<Message>>>,
}

impl Probe {
    pub fn spawn() -> Self {
        Self::start(false)
    }

    /// A probe with exit trapping enabled.
    pub fn trapping() -> Self {
        Self::start(true)
    }

    fn start(trap_exit: bool) -> Self {
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        let pid = spawn(move || {
            if trap_exit {
                process::flag(Flag::TrapExit, true)?;
            }
            Ok(Behavior::new(move |msg| {
                sink.borrow_mut().push(msg);
                Ok(Effect::done())
            })
            .into())
        });
        Self { pid, received }
    }

    pub fn pid(&self) -> ActorRef {
        self.pid
    }

    pub fn received(&self) -> Vec<Message> {
        self.received.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<String> {
        self.received.borrow().iter().map(|msg| msg.kind().to_string()).collect()
    }

    /// Exit signals that arrived as trapped messages.
    pub fn exits(&self) -> Vec<ExitSignal> {
        self.received
            .borrow()
            .iter()
            .filter_map(Message::exit_signal)
            .cloned()
            .collect()
    }

    pub fn downs(&self) -> Vec<DownSignal> {
        self.received
            .borrow()
            .iter()
            .filter_map(Message::down_signal)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.received.borrow_mut().clear();
    }
}
