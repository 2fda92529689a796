//! Caller-facing summary of a batch.

use serde::{Deserialize, Serialize};

use crate::errors::ErrorKind;

use super::error::PipelineError;
use super::types::BatchOutcome;

/// Message shown for fatal errors that are not the caller's to fix.
const INTERNAL_ERROR_MESSAGE: &str = "internal error, please try again later";

/// Serializable result of a batch for a request handler to return as-is.
///
/// Unmapped beneficiaries and failed recipients are listed separately:
/// the first need a mapping fix, the second a retry or an address fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub message: String,
    pub sent_amount: usize,
    /// Recipients whose delivery was attempted and failed, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_recipients: Vec<String>,
    /// Beneficiaries with no delivery address, sorted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_beneficiaries: Vec<String>,
    pub partial_success: bool,
}

impl BatchSummary {
    /// Summary for a fatal error.
    ///
    /// User errors carry their own message; anything else gets a generic one.
    pub fn from_error(err: &PipelineError) -> Self {
        let message = match err.kind() {
            ErrorKind::User => err.to_string(),
            ErrorKind::System | ErrorKind::External => INTERNAL_ERROR_MESSAGE.to_string(),
        };

        Self {
            message,
            sent_amount: 0,
            failed_recipients: Vec::new(),
            missing_beneficiaries: Vec::new(),
            partial_success: false,
        }
    }
}

impl From<&BatchOutcome> for BatchSummary {
    fn from(outcome: &BatchOutcome) -> Self {
        let output = outcome.output();

        match outcome.error() {
            None => Self {
                message: format!("all {} messages sent", output.sent_count),
                sent_amount: output.sent_count,
                failed_recipients: Vec::new(),
                missing_beneficiaries: Vec::new(),
                partial_success: false,
            },
            Some(error) => Self {
                message: error.to_string(),
                sent_amount: output.sent_count,
                failed_recipients: error
                    .delivery_failed()
                    .map(|e| e.recipients())
                    .unwrap_or_default(),
                missing_beneficiaries: error
                    .missing_mapping()
                    .map(|e| e.beneficiaries())
                    .unwrap_or_default(),
                partial_success: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CollaboratorError, CompositeError, DeliveryFailedError, MissingMappingError};
    use crate::pipeline::BatchOutput;
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use uuid::Uuid;

    fn output(sent_count: usize) -> BatchOutput {
        BatchOutput {
            batch_id: Uuid::new_v4(),
            artifacts_by_recipient: BTreeMap::new(),
            sent_count,
        }
    }

    #[test]
    fn test_full_success_summary() {
        let summary = BatchSummary::from(&BatchOutcome::Succeeded(output(3)));
        assert_eq!(summary.sent_amount, 3);
        assert!(!summary.partial_success);
        assert!(summary.failed_recipients.is_empty());
    }

    #[test]
    fn test_partial_summary_keeps_lists_apart() {
        let mut missing = MissingMappingError::new();
        missing.insert("Sidorov", PathBuf::from("/out/Sidorov.pdf"));
        let mut failed = DeliveryFailedError::new();
        failed.insert("b@example.com", "timeout", Path::new("/out/b.pdf"));
        failed.insert("a@example.com", "rejected", Path::new("/out/a.pdf"));

        let error = CompositeError::from_parts(Some(missing), Some(failed)).unwrap();
        let summary = BatchSummary::from(&BatchOutcome::PartiallySucceeded {
            output: output(1),
            error,
        });

        assert!(summary.partial_success);
        assert_eq!(summary.sent_amount, 1);
        assert_eq!(summary.missing_beneficiaries, vec!["Sidorov"]);
        assert_eq!(summary.failed_recipients, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_error_summary_hides_system_details() {
        let err = PipelineError::History(CollaboratorError::system("database is locked"));
        let summary = BatchSummary::from_error(&err);
        assert_eq!(summary.message, INTERNAL_ERROR_MESSAGE);

        let summary = BatchSummary::from_error(&PipelineError::MissingSenderAddress);
        assert_eq!(summary.message, "sender address is not set");
        assert!(!summary.partial_success);
    }

    #[test]
    fn test_summary_json_omits_empty_lists() {
        let summary = BatchSummary::from(&BatchOutcome::Succeeded(output(2)));
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sent_amount"], 2);
        assert!(json.get("failed_recipients").is_none());
    }
}
