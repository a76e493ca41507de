//! # Behaviors
//!
//! A [`Behavior`] is the message-handling rule an actor is suspended on. Returning one
//! from a computation or handler (a "become") installs it; the engine never mutates a
//! behavior's handlers in place.
//!
//! Three shapes, fixed at construction:
//!
//! - **Any**: a catch-all handler. Non-selective (takes the mailbox head) and it stays
//!   installed after handling a message until something replaces it.
//! - **Select**: a custom accept predicate plus a handler. One-shot.
//! - **Patterns**: a tag-to-handler table built with [`receive`], with an optional
//!   default arm. One-shot.
//!
//! Any shape can carry a timeout via [`Behavior::after`]: if no accepted message arrives
//! in time, the behavior is taken down and the fallback runs as the next step.

use crate::framework::computation::Effect;
use crate::framework::error::{ActorError, ProcessError};
use crate::framework::message::Message;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub type Handler = Box<dyn FnMut(Message) -> Result<Effect, ActorError>>;
pub type Fallback = Box<dyn FnOnce() -> Result<Effect, ActorError>>;

enum Dispatch {
    Any(Handler),
    Select {
        accept: Box<dyn Fn(&Message) -> bool>,
        handler: Handler,
    },
    Patterns {
        arms: Vec<(Rc<str>, Handler)>,
        default: Option<Handler>,
    },
}

pub(crate) struct Timeout {
    pub(crate) after: Duration,
    pub(crate) fallback: Fallback,
}

pub struct Behavior {
    dispatch: Dispatch,
    timeout: Option<Timeout>,
}

impl Behavior {
    /// A catch-all behavior that keeps handling messages until replaced.
    pub fn new(handler: impl FnMut(Message) -> Result<Effect, ActorError> + 'static) -> Self {
        Self {
            dispatch: Dispatch::Any(Box::new(handler)),
            timeout: None,
        }
    }

    /// A one-shot behavior taking the first message `accept` agrees to.
    pub fn select(
        accept: impl Fn(&Message) -> bool + 'static,
        handler: impl FnMut(Message) -> Result<Effect, ActorError> + 'static,
    ) -> Self {
        Self {
            dispatch: Dispatch::Select {
                accept: Box::new(accept),
                handler: Box::new(handler),
            },
            timeout: None,
        }
    }

    /// Attaches a receive timeout. A zero duration never fires.
    pub fn after(
        mut self,
        after: Duration,
        fallback: impl FnOnce() -> Result<Effect, ActorError> + 'static,
    ) -> Self {
        self.timeout = Some(Timeout {
            after,
            fallback: Box::new(fallback),
        });
        self
    }

    /// Whether this behavior filters the mailbox (and is consumed after one message).
    pub fn is_selective(&self) -> bool {
        !matches!(self.dispatch, Dispatch::Any(_))
    }

    pub fn accepts(&self, msg: &Message) -> bool {
        match &self.dispatch {
            Dispatch::Any(_) => true,
            Dispatch::Select { accept, .. } => accept(msg),
            Dispatch::Patterns { arms, default } => {
                default.is_some() || arms.iter().any(|(kind, _)| &**kind == msg.kind())
            }
        }
    }

    pub(crate) fn handle(&mut self, msg: Message) -> Result<Effect, ActorError> {
        match &mut self.dispatch {
            Dispatch::Any(handler) => handler(msg),
            Dispatch::Select { handler, .. } => handler(msg),
            Dispatch::Patterns { arms, default } => {
                let arm = arms.iter_mut().find(|(kind, _)| &**kind == msg.kind());
                match (arm, default) {
                    (Some((_, handler)), _) => handler(msg),
                    (None, Some(handler)) => handler(msg),
                    (None, None) => Ok(Effect::done()),
                }
            }
        }
    }

    pub(crate) fn ttl(&self) -> Option<Duration> {
        self.timeout
            .as_ref()
            .map(|timeout| timeout.after)
            .filter(|after| !after.is_zero())
    }

    pub(crate) fn take_fallback(&mut self) -> Option<Fallback> {
        self.timeout.take().map(|timeout| timeout.fallback)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Behavior");
        match &self.dispatch {
            Dispatch::Any(_) => out.field("dispatch", &"any"),
            Dispatch::Select { .. } => out.field("dispatch", &"select"),
            Dispatch::Patterns { arms, default } => {
                let kinds: Vec<&str> = arms.iter().map(|(kind, _)| &**kind).collect();
                out.field("patterns", &kinds).field("default", &default.is_some())
            }
        };
        out.field("ttl", &self.ttl()).finish()
    }
}

/// Builder for a pattern-table behavior.
///
/// ```rust
/// use proclet::{receive, Effect};
/// use std::time::Duration;
///
/// let idle = receive()
///     .on("BEGIN", |_| Ok(Effect::done()))
///     .after(Duration::from_secs(3), || Ok(Effect::done()))
///     .build()
///     .unwrap();
/// assert!(idle.is_selective());
/// ```
#[derive(Default)]
pub struct Receive {
    arms: Vec<(Rc<str>, Handler)>,
    default: Option<Handler>,
    timeout: Option<Timeout>,
    error: Option<ProcessError>,
}

/// Starts a pattern-table behavior. An empty table accepts nothing and only its
/// timeout can resume the actor.
pub fn receive() -> Receive {
    Receive::default()
}

impl Receive {
    /// Handles messages tagged `kind`.
    pub fn on(
        mut self,
        kind: impl Into<Rc<str>>,
        handler: impl FnMut(Message) -> Result<Effect, ActorError> + 'static,
    ) -> Self {
        let kind = kind.into();
        if kind.is_empty() {
            self.reject("message kind must not be empty".to_string());
        } else if self.arms.iter().any(|(existing, _)| *existing == kind) {
            self.reject(format!("duplicate pattern `{kind}`"));
        } else {
            self.arms.push((kind, Box::new(handler)));
        }
        self
    }

    /// Handles every message no other arm matches.
    pub fn otherwise(
        mut self,
        handler: impl FnMut(Message) -> Result<Effect, ActorError> + 'static,
    ) -> Self {
        if self.default.is_some() {
            self.reject("more than one default pattern".to_string());
        } else {
            self.default = Some(Box::new(handler));
        }
        self
    }

    pub fn after(
        mut self,
        after: Duration,
        fallback: impl FnOnce() -> Result<Effect, ActorError> + 'static,
    ) -> Self {
        self.timeout = Some(Timeout {
            after,
            fallback: Box::new(fallback),
        });
        self
    }

    pub fn build(self) -> Result<Behavior, ProcessError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        Ok(Behavior {
            dispatch: Dispatch::Patterns {
                arms: self.arms,
                default: self.default,
            },
            timeout: self.timeout,
        })
    }

    fn reject(&mut self, reason: String) {
        if self.error.is_none() {
            self.error = Some(ProcessError::ArgumentError(reason));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_accept_by_kind() {
        let behavior = receive()
            .on("BEGIN", |_| Ok(Effect::done()))
            .build()
            .unwrap();
        assert!(behavior.is_selective());
        assert!(behavior.accepts(&Message::new("BEGIN")));
        assert!(!behavior.accepts(&Message::new("GIBBERISH")));
    }

    #[test]
    fn test_default_arm_accepts_everything() {
        let mut behavior = receive()
            .on("A", |_| Ok(Effect::value("a")))
            .otherwise(|_| Ok(Effect::value("other")))
            .build()
            .unwrap();
        assert!(behavior.accepts(&Message::new("Z")));

        let picked = |effect: Effect| match effect {
            Effect::Return(Some(term)) => term.downcast_ref::<&str>().copied(),
            _ => None,
        };
        assert_eq!(picked(behavior.handle(Message::new("A")).unwrap()), Some("a"));
        assert_eq!(picked(behavior.handle(Message::new("Z")).unwrap()), Some("other"));
    }

    #[test]
    fn test_empty_receive_accepts_nothing() {
        let behavior = receive()
            .after(Duration::from_millis(10), || Ok(Effect::done()))
            .build()
            .unwrap();
        assert!(!behavior.accepts(&Message::new("ANY")));
        assert_eq!(behavior.ttl(), Some(Duration::from_millis(10)));
    }

    #[test]
    fn test_malformed_patterns() {
        let duplicate = receive()
            .on("A", |_| Ok(Effect::done()))
            .on("A", |_| Ok(Effect::done()))
            .build();
        assert!(matches!(duplicate, Err(ProcessError::ArgumentError(_))));

        let empty = receive().on("", |_| Ok(Effect::done())).build();
        assert!(matches!(empty, Err(ProcessError::ArgumentError(_))));
    }

    #[test]
    fn test_any_is_not_selective() {
        let behavior = Behavior::new(|_| Ok(Effect::done())).after(Duration::ZERO, || Ok(Effect::done()));
        assert!(!behavior.is_selective());
        assert!(behavior.accepts(&Message::new("X")));
        assert_eq!(behavior.ttl(), None);
    }
}
