//! Hosting and observability.
//!
//! - [`ActorSystem`] - scheduler runtime for timers and futures, plus shutdown
//! - [`RuntimeConfig`] - serde-deserializable settings for the system
//! - [`tracing`] - subscriber setup

pub mod config;
pub mod system;
pub mod tracing;

pub use config::RuntimeConfig;
pub use system::{ActorSystem, SystemError};
