//! # Resumable Computations
//!
//! Actor bodies are written as resumable computations rather than with a built-in
//! suspend keyword. A [`Computation`] is advanced with a feedback value and reports
//! whether it is done together with the [`Effect`] it produced. The actor keeps a stack
//! of them, so a computation can hand control to a nested one and receive its result.
//!
//! ## The Effects
//!
//! | Effect | Engine reaction |
//! |--------|-----------------|
//! | `Return(value)` | feed `value` to the computation below, keep waiting on the receiver, or exit normally |
//! | `Become(behavior)` | install `behavior` and suspend until a matching message (or its timeout) |
//! | `Nested(computation)` | push it and run it with no feedback |
//! | `Await(future)` | block this actor until the future settles |
//! | `Exit(reason)` | terminate with `reason` |
//!
//! ## Linear bodies with [`Steps`]
//!
//! ```rust
//! use proclet::{receive, spawn, Effect, Message, Steps};
//!
//! let pid = spawn(|| {
//!     let body = Steps::new()
//!         // Suspend until a PING arrives; the handler's value is fed to the next stage.
//!         .then(|_| Ok(receive().on("PING", |msg| Ok(Effect::value(msg))).build()?.into()))
//!         .then(|ping| {
//!             let ping = ping.as_ref().and_then(|t| t.downcast_ref::<Message>());
//!             assert_eq!(ping.map(Message::kind), Some("PING"));
//!             Ok(Effect::done())
//!         });
//!     Ok(Effect::nested(body))
//! });
//!
//! assert!(pid.is_alive());
//! pid.send(Message::new("PING"));
//! assert!(!pid.is_alive());
//! ```

use crate::framework::behavior::Behavior;
use crate::framework::error::ActorError;
use crate::framework::message::{Reason, Term};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Effect, ActorError>>>>;

/// Result of advancing a computation one step.
#[derive(Debug)]
pub enum Step {
    /// Not done: the computation stays on the stack.
    Yield(Effect),
    /// Done: the computation is popped and its effect arbitrated.
    Complete(Effect),
}

/// What a computation step or a message handler asks the engine to do next.
pub enum Effect {
    Return(Option<Term>),
    Become(Behavior),
    Nested(Box<dyn Computation>),
    Await(BoxFuture),
    Exit(Reason),
}

impl Effect {
    /// A plain "nothing more to do" value.
    pub fn done() -> Self {
        Effect::Return(None)
    }

    pub fn value<T: Any>(value: T) -> Self {
        Effect::Return(Some(Term::new(value)))
    }

    pub fn nested(computation: impl Computation + 'static) -> Self {
        Effect::Nested(Box::new(computation))
    }

    pub fn future(fut: impl Future<Output = Result<Effect, ActorError>> + 'static) -> Self {
        Effect::Await(Box::pin(fut))
    }

    pub fn exit(reason: Reason) -> Self {
        Effect::Exit(reason)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Effect::Return(_) => "return",
            Effect::Become(_) => "become",
            Effect::Nested(_) => "nested",
            Effect::Await(_) => "await",
            Effect::Exit(_) => "exit",
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Return(value) => f.debug_tuple("Return").field(value).finish(),
            Effect::Exit(reason) => f.debug_tuple("Exit").field(reason).finish(),
            other => f.write_str(other.label()),
        }
    }
}

impl From<Behavior> for Effect {
    fn from(behavior: Behavior) -> Self {
        Effect::Become(behavior)
    }
}

/// A suspendable sequence of steps, advanced by the actor engine.
pub trait Computation {
    fn resume(&mut self, feedback: Option<Term>) -> Result<Step, ActorError>;
}

impl<F> Computation for F
where
    F: FnMut(Option<Term>) -> Result<Step, ActorError>,
{
    fn resume(&mut self, feedback: Option<Term>) -> Result<Step, ActorError> {
        self(feedback)
    }
}

/// A single deferred call that completes on its first resume.
pub(crate) struct Deferred {
    call: Option<Box<dyn FnOnce() -> Result<Effect, ActorError>>>,
}

impl Deferred {
    pub(crate) fn new(call: impl FnOnce() -> Result<Effect, ActorError> + 'static) -> Self {
        Self {
            call: Some(Box::new(call)),
        }
    }
}

impl Computation for Deferred {
    fn resume(&mut self, _feedback: Option<Term>) -> Result<Step, ActorError> {
        match self.call.take() {
            Some(call) => Ok(Step::Complete(call()?)),
            None => Ok(Step::Complete(Effect::done())),
        }
    }
}

type Stage = Box<dyn FnOnce(Option<Term>) -> Result<Effect, ActorError>>;

/// A linear body: every stage gets the feedback of the previous suspension.
///
/// The last stage completes the computation; earlier stages yield.
#[derive(Default)]
pub struct Steps {
    stages: VecDeque<Stage>,
}

impl Steps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(
        mut self,
        stage: impl FnOnce(Option<Term>) -> Result<Effect, ActorError> + 'static,
    ) -> Self {
        self.stages.push_back(Box::new(stage));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Computation for Steps {
    fn resume(&mut self, feedback: Option<Term>) -> Result<Step, ActorError> {
        let Some(stage) = self.stages.pop_front() else {
            return Ok(Step::Complete(Effect::Return(feedback)));
        };
        let effect = stage(feedback)?;
        if self.stages.is_empty() {
            Ok(Step::Complete(effect))
        } else {
            Ok(Step::Yield(effect))
        }
    }
}
