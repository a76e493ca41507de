//! Runtime configuration.

use serde::{Deserialize, Serialize};

/// Settings consumed by [`ActorSystem::with_config`](crate::lifecycle::ActorSystem::with_config).
///
/// Every field has a default, so a partial (or empty) record deserializes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `EnvFilter` directives. `None` falls back to `RUST_LOG`.
    pub log_filter: Option<String>,
    /// Install the `fmt` subscriber when the system starts.
    pub init_tracing: bool,
}

impl RuntimeConfig {
    pub fn with_tracing(mut self, filter: impl Into<String>) -> Self {
        self.init_tracing = true;
        self.log_filter = Some(filter.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record() {
        let config: RuntimeConfig = serde_json::from_str(r#"{"init_tracing": true}"#).unwrap();
        assert!(config.init_tracing);
        assert_eq!(config.log_filter, None);

        let config: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_with_tracing() {
        let config = RuntimeConfig::default().with_tracing("proclet=debug");
        assert!(config.init_tracing);
        assert_eq!(config.log_filter.as_deref(), Some("proclet=debug"));
    }
}
