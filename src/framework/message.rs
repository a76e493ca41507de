//! # Messages & Signals
//!
//! Ordinary messages are structural records: a required `kind` tag plus optional
//! `sender` and `data`. Exit signals are control-plane traffic; they travel in their own
//! [`Envelope`] variant, bypass the mailbox and are dispatched synchronously on send.
//! An exit signal only becomes a mailbox message (tagged [`EXIT`]) when a trapping actor
//! re-routes it; monitor notifications arrive as mailbox messages tagged [`DOWN`].

use crate::framework::registry::ActorRef;
use std::any::{self, Any};
use std::fmt;
use std::rc::Rc;

/// Tag of an exit signal re-routed into a trapping actor's mailbox.
pub const EXIT: &str = ":EXIT";
/// Tag of a monitor notification.
pub const DOWN: &str = ":DOWN";

/// An opaque in-memory value, shared by reference.
#[derive(Clone)]
pub struct Term {
    value: Rc<dyn Any>,
    type_name: &'static str,
}

impl Term {
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            value: Rc::new(value),
            type_name: any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Term<{}>", self.type_name)
    }
}

/// Why an actor terminated, or is being asked to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reason {
    /// Regular completion. Not propagated to links.
    Normal,
    /// Untrappable termination request.
    Kill,
    /// What observers see when an actor was terminated by [`Reason::Kill`].
    Killed,
    /// Any other reason, including faults raised by the actor's own code.
    Error(String),
}

impl Reason {
    pub fn error(reason: impl Into<String>) -> Self {
        Reason::Error(reason.into())
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Reason::Normal)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Normal => f.write_str("normal"),
            Reason::Kill => f.write_str("kill"),
            Reason::Killed => f.write_str("killed"),
            Reason::Error(reason) => f.write_str(reason),
        }
    }
}

/// Reference id of one monitor, scoped to the observer that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonitorRef(u64);

impl MonitorRef {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MonitorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#Ref<{}>", self.0)
    }
}

/// Control-plane signal announcing that `sender` terminated (or wants the target to).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitSignal {
    pub sender: ActorRef,
    pub reason: Reason,
}

/// Notification that a monitored actor terminated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownSignal {
    /// The actor that went down.
    pub sender: ActorRef,
    /// The monitor that triggered this notification.
    pub monitor: MonitorRef,
    pub reason: Reason,
}

/// An ordinary data-plane message.
#[derive(Clone, Debug)]
pub struct Message {
    kind: Rc<str>,
    sender: Option<ActorRef>,
    data: Option<Term>,
}

impl Message {
    pub fn new(kind: impl Into<Rc<str>>) -> Self {
        Self {
            kind: kind.into(),
            sender: None,
            data: None,
        }
    }

    pub fn with_data<T: Any>(mut self, data: T) -> Self {
        self.data = Some(Term::new(data));
        self
    }

    pub fn with_sender(mut self, sender: ActorRef) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn sender(&self) -> Option<ActorRef> {
        self.sender
    }

    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_ref().and_then(Term::downcast_ref)
    }

    pub fn term(&self) -> Option<&Term> {
        self.data.as_ref()
    }

    /// The exit signal carried by a trapped [`EXIT`] message.
    pub fn exit_signal(&self) -> Option<&ExitSignal> {
        if self.kind() == EXIT {
            self.data::<ExitSignal>()
        } else {
            None
        }
    }

    /// The notification carried by a [`DOWN`] message.
    pub fn down_signal(&self) -> Option<&DownSignal> {
        if self.kind() == DOWN {
            self.data::<DownSignal>()
        } else {
            None
        }
    }

    pub(crate) fn trapped(signal: ExitSignal) -> Self {
        let sender = signal.sender;
        Message::new(EXIT).with_sender(sender).with_data(signal)
    }

    pub(crate) fn down(signal: DownSignal) -> Self {
        let sender = signal.sender;
        Message::new(DOWN).with_sender(sender).with_data(signal)
    }
}

/// What [`ActorRef::send`] carries: data-plane message or control-plane signal.
#[derive(Clone, Debug)]
pub enum Envelope {
    Message(Message),
    Exit(ExitSignal),
}

impl Envelope {
    pub fn kind(&self) -> &str {
        match self {
            Envelope::Message(msg) => msg.kind(),
            Envelope::Exit(_) => EXIT,
        }
    }
}

impl From<Message> for Envelope {
    fn from(msg: Message) -> Self {
        Envelope::Message(msg)
    }
}

impl From<ExitSignal> for Envelope {
    fn from(signal: ExitSignal) -> Self {
        Envelope::Exit(signal)
    }
}
