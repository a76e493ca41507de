//! # Framework Errors
//!
//! Two families, following where a failure surfaces:
//!
//! - [`ProcessError`]: misuse of the Process API. Returned synchronously to the caller.
//! - [`ActorError`]: a fault inside an actor's own execution. Never escapes to the
//!   scheduler; the trampoline converts it into the actor's exit [`Reason`].

use crate::framework::message::Reason;
use crate::framework::registry::ActorRef;

/// Errors raised by Process API calls.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessError {
    #[error("InvalidCall: process functions can only be called inside a spawned actor")]
    InvalidCall,
    #[error("ArgumentError: {0}")]
    ArgumentError(String),
    #[error("NoProc: cannot find process {0}, it's probably dead already")]
    NoProc(ActorRef),
}

/// Faults raised by actor code.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    /// Requested self-termination; the reason is used verbatim.
    #[error("exit: {0}")]
    Exit(Reason),
    #[error("{0}")]
    Failed(String),
    #[error("panicked: {0}")]
    Panicked(String),
    #[error("timers and futures require a tokio LocalSet")]
    NoScheduler,
    #[error("{0}")]
    Other(Box<dyn std::error::Error>),
}

impl ActorError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ActorError::Failed(reason.into())
    }

    pub fn other(err: impl std::error::Error + 'static) -> Self {
        ActorError::Other(Box::new(err))
    }

    /// The exit reason this fault turns into.
    pub fn into_reason(self) -> Reason {
        match self {
            ActorError::Exit(reason) => reason,
            other => Reason::Error(other.to_string()),
        }
    }
}
