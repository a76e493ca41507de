//! The actor engine.
//!
//! This module holds the building blocks of a single-threaded actor runtime: actors that
//! communicate only through mailboxes, suspend cooperatively and supervise each other.
//!
//! # Main Components
//!
//! - [`ActorRef`] - Handle used to address an actor; liveness is resolved through the registry
//! - [`Message`] / [`Reason`] - Data-plane messages and exit reasons
//! - [`Computation`] / [`Effect`] / [`Steps`] - Resumable actor bodies and what they ask of the engine
//! - [`Behavior`] / [`receive`] - What a waiting actor accepts, optionally with a timeout
//! - [`ActorError`] / [`ProcessError`] - Actor faults and API misuse
//!
//! # Testing
//!
//! See [`probe`] for a recording actor that makes supervision traffic easy to assert on.

pub mod actor;
pub mod behavior;
pub mod computation;
pub mod context;
pub mod error;
pub mod mailbox;
pub mod message;
pub mod probe;
pub mod registry;

pub use actor::Status;
pub use behavior::{receive, Behavior, Receive};
pub use computation::{BoxFuture, Computation, Effect, Step, Steps};
pub use error::{ActorError, ProcessError};
pub use mailbox::Mailbox;
pub use message::{DownSignal, Envelope, ExitSignal, Message, MonitorRef, Reason, Term, DOWN, EXIT};
pub use probe::Probe;
pub use registry::ActorRef;
