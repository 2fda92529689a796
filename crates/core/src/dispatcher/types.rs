//! Types for the dispatcher module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::DeliveryFailedError;

/// One queued attempt to deliver an artifact to a resolved address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryJob {
    /// Sender address.
    pub sender: String,
    /// Recipient address.
    pub recipient: String,
    /// Message subject.
    pub subject: String,
    /// Message body (plain text).
    pub body: String,
    /// Path of the artifact to attach.
    pub artifact_path: PathBuf,
}

impl DeliveryJob {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        artifact_path: PathBuf,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            artifact_path,
        }
    }
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The transport accepted the message.
    Sent,
    /// The job failed, before or during delivery.
    Failed { cause: String },
}

/// Produced exactly once per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub artifact_path: PathBuf,
    pub status: DeliveryStatus,
}

impl DeliveryOutcome {
    pub fn sent(job: &DeliveryJob) -> Self {
        Self {
            recipient: job.recipient.clone(),
            artifact_path: job.artifact_path.clone(),
            status: DeliveryStatus::Sent,
        }
    }

    pub fn failed(job: &DeliveryJob, cause: impl Into<String>) -> Self {
        Self {
            recipient: job.recipient.clone(),
            artifact_path: job.artifact_path.clone(),
            status: DeliveryStatus::Failed {
                cause: cause.into(),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, DeliveryStatus::Sent)
    }

    pub fn cause(&self) -> Option<&str> {
        match &self.status {
            DeliveryStatus::Sent => None,
            DeliveryStatus::Failed { cause } => Some(cause),
        }
    }
}

/// Aggregated result of a bulk send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSendReport {
    /// Number of jobs the transport accepted.
    pub sent_count: usize,
    /// Failed recipients, `None` when every job was sent.
    pub failed: Option<DeliveryFailedError>,
}

impl BulkSendReport {
    /// Folds outcomes into a report. Order of outcomes does not matter.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = DeliveryOutcome>) -> Self {
        let mut sent_count = 0;
        let mut failed = DeliveryFailedError::new();

        for outcome in outcomes {
            match outcome.status {
                DeliveryStatus::Sent => sent_count += 1,
                DeliveryStatus::Failed { cause } => {
                    failed.insert(outcome.recipient, cause, &outcome.artifact_path);
                }
            }
        }

        Self {
            sent_count,
            failed: if failed.is_empty() { None } else { Some(failed) },
        }
    }

    pub fn failed_count(&self) -> usize {
        self.failed.as_ref().map_or(0, DeliveryFailedError::failed_count)
    }

    pub fn all_sent(&self) -> bool {
        self.failed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(recipient: &str) -> DeliveryJob {
        DeliveryJob::new(
            "sender@example.com",
            recipient,
            "Receipt",
            "",
            PathBuf::from(format!("/receipts/{}.pdf", recipient)),
        )
    }

    #[test]
    fn test_report_from_outcomes() {
        let outcomes = vec![
            DeliveryOutcome::sent(&job("a@example.com")),
            DeliveryOutcome::failed(&job("b@example.com"), "timeout"),
            DeliveryOutcome::sent(&job("c@example.com")),
        ];

        let report = BulkSendReport::from_outcomes(outcomes);
        assert_eq!(report.sent_count, 2);
        assert_eq!(report.failed_count(), 1);

        let failed = report.failed.unwrap();
        assert_eq!(failed.cause("b@example.com"), Some("timeout"));
        assert_eq!(
            failed.artifacts().get("b@example.com"),
            Some(&PathBuf::from("/receipts/b@example.com.pdf"))
        );
    }

    #[test]
    fn test_report_all_sent() {
        let report = BulkSendReport::from_outcomes(vec![DeliveryOutcome::sent(&job("a@example.com"))]);
        assert!(report.all_sent());
        assert_eq!(report.failed_count(), 0);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = DeliveryOutcome::failed(&job("a@example.com"), "canceled");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("\"cause\":\"canceled\""));
        assert!(!outcome.succeeded());
    }
}
