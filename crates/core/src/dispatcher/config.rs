//! Configuration for the dispatcher.

use serde::{Deserialize, Serialize};

/// Configuration for bulk delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Maximum deliveries performing I/O at the same time.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_max_parallel() -> usize {
    10
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_parallel: default_max_parallel(),
        }
    }
}

impl DispatcherConfig {
    /// Sets the maximum parallel deliveries.
    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.max_parallel, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = DispatcherConfig::default().with_max_parallel(3);
        assert_eq!(config.max_parallel, 3);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: DispatcherConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_parallel, 10);

        let config: DispatcherConfig = toml::from_str("max_parallel = 4").unwrap();
        assert_eq!(config.max_parallel, 4);
    }
}
