use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - dispatch.max_parallel is not 0
/// - pipeline.subject is not blank
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.dispatch.max_parallel == 0 {
        return Err(ConfigError::ValidationError(
            "dispatch.max_parallel cannot be 0".to_string(),
        ));
    }

    if config.pipeline.subject.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.subject cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::DispatcherConfig;
    use crate::pipeline::PipelineConfig;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_zero_parallelism_fails() {
        let config = Config {
            dispatch: DispatcherConfig::default().with_max_parallel(0),
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_blank_subject_fails() {
        let config = Config {
            pipeline: PipelineConfig::default().with_subject("  "),
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
