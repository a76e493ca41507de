use crate::framework::message::{ExitSignal, Reason};
use crate::framework::registry;
use crate::lifecycle::config::RuntimeConfig;
use crate::lifecycle::tracing::try_setup_tracing;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};
use tokio::task::LocalSet;
use tracing::{info, warn};

/// Errors raised while bringing up the host runtime.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("failed to build the scheduler runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to install the tracing subscriber: {0}")]
    Tracing(String),
}

/// The scheduler that hosts actors.
///
/// `ActorSystem` is responsible for:
/// - **Scheduling**: a current-thread Tokio runtime plus a [`LocalSet`], so receive
///   timeouts and awaited futures have somewhere to run
/// - **Observability**: optionally installing the tracing subscriber from [`RuntimeConfig`]
/// - **Shutdown**: killing every actor still alive on the scheduler thread
///
/// Actors themselves need no system: spawning and message passing are plain function
/// calls. Only timers and futures require one.
///
/// # Example
///
/// ```rust
/// use proclet::lifecycle::ActorSystem;
/// use proclet::{receive, spawn, Effect};
/// use std::time::Duration;
///
/// let system = ActorSystem::new().unwrap();
/// let pid = system.block_on(async {
///     let pid = spawn(|| {
///         Ok(receive()
///             .after(Duration::from_millis(5), || Ok(Effect::done()))
///             .build()?
///             .into())
///     });
///     tokio::time::sleep(Duration::from_millis(20)).await;
///     pid
/// });
/// assert!(!pid.is_alive());
/// system.shutdown();
/// ```
pub struct ActorSystem {
    runtime: Runtime,
    local: LocalSet,
}

impl ActorSystem {
    pub fn new() -> Result<Self, SystemError> {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Result<Self, SystemError> {
        if config.init_tracing {
            if let Err(err) = try_setup_tracing(config.log_filter.as_deref()) {
                if !matches!(err, SystemError::Tracing(_)) {
                    return Err(err);
                }
                // A subscriber from an earlier system (or the host) stays in place.
                warn!(error = %err, "Tracing already initialized");
            }
        }
        let runtime = Builder::new_current_thread().enable_all().build()?;
        info!("Actor system started");
        Ok(Self {
            runtime,
            local: LocalSet::new(),
        })
    }

    /// Runs `fut` to completion on the scheduler thread, driving actor timers and futures.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.local.block_on(&self.runtime, fut)
    }

    /// Kills every live actor and returns how many there were.
    ///
    /// Each one exits with `kill` (observed as `killed`), so linked and monitoring actors
    /// see the usual signals while the system winds down.
    pub fn shutdown(self) -> usize {
        info!("Shutting down actor system...");
        let mut killed = 0;
        for pid in registry::list() {
            // An earlier kill may already have taken this one down through a link.
            if !pid.is_alive() {
                continue;
            }
            pid.send(ExitSignal {
                sender: pid,
                reason: Reason::Kill,
            });
            killed += 1;
        }
        info!(killed, "Actor system shutdown complete.");
        killed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{receive, spawn};

    #[test]
    fn test_shutdown_kills_everything() {
        let system = ActorSystem::new().unwrap();
        let pids: Vec<_> = (0..3)
            .map(|_| spawn(|| Ok(receive().build()?.into())))
            .collect();
        assert!(pids.iter().all(|pid| pid.is_alive()));

        assert_eq!(system.shutdown(), 3);
        assert!(pids.iter().all(|pid| !pid.is_alive()));
        assert!(registry::list().is_empty());
    }
}
