//! # Observability & Tracing
//!
//! The runtime logs through the `tracing` crate with structured fields (`pid`, `kind`,
//! `reason`) rather than formatted strings.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle** (`info`): started, terminated normally. Abnormal terminations
//!   are logged at `warn` together with their reason.
//! - **Message Flow** (`debug`): enqueued, handling, become, await, receive timeouts,
//!   links and monitors.
//! - **Faults** (`warn`): errors and panics raised by actor code, disposal callbacks that
//!   panicked, a termination requested twice.
//! - **Dropped Sends** (`trace`): messages sent to actors that are already gone.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle only
//! RUST_LOG=info cargo test
//!
//! # Every message an actor sees
//! RUST_LOG=debug cargo test
//! ```
//!
//! Running with `RUST_LOG=debug` shows output like:
//!
//! ```text
//! INFO Started pid=<0.0.0>
//! DEBUG Become pid=<0.0.0> behavior=Behavior { patterns: ["BEGIN"], default: false, ttl: None }
//! DEBUG Enqueued pid=<0.0.0> kind="BEGIN" queued=1
//! DEBUG Handling pid=<0.0.0> kind="BEGIN"
//! WARN Terminated pid=<0.1.0> reason=boom
//! ```

use crate::lifecycle::system::SystemError;
use tracing_subscriber::EnvFilter;

/// Installs the compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// # Panics
/// If a global subscriber is already installed. Use [`try_setup_tracing`] in code that
/// may run more than once, such as tests.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}

/// Like [`setup_tracing`], with an explicit filter overriding `RUST_LOG`.
pub fn try_setup_tracing(filter: Option<&str>) -> Result<(), SystemError> {
    let filter = match filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| SystemError::Tracing(err.to_string()))
}
