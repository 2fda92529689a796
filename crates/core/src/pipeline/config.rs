//! Configuration for the batch pipeline.

use serde::{Deserialize, Serialize};

/// Message content applied to every delivery of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Subject line.
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Plain-text body.
    #[serde(default)]
    pub body: String,
}

fn default_subject() -> String {
    "Payment receipt".to_string()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            body: String::new(),
        }
    }
}

impl PipelineConfig {
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.subject, "Payment receipt");
        assert!(config.body.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PipelineConfig = toml::from_str(r#"body = "See attachment""#).unwrap();
        assert_eq!(config.subject, "Payment receipt");
        assert_eq!(config.body, "See attachment");
    }
}
