//! Error types for the dispatcher module.

use thiserror::Error;

use crate::errors::ErrorKind;

/// Errors that abort a bulk send before any delivery is attempted.
///
/// Per-recipient failures are not errors at this level; they are reported in
/// [`BulkSendReport::failed`](super::BulkSendReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The batch contained no jobs.
    #[error("validation error: no recipients provided")]
    NoRecipients,

    /// The same recipient appears in more than one job.
    #[error("validation error: duplicate recipient {0}")]
    DuplicateRecipient(String),

    /// The batch was canceled before it started.
    #[error("operation canceled")]
    Canceled,
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoRecipients | Self::DuplicateRecipient(_) | Self::Canceled => ErrorKind::User,
        }
    }
}

/// Errors raised by a [`Transport`](super::Transport) for a single delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not connect or authenticate to the messaging backend.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend refused the message.
    #[error("rejected: {0}")]
    Rejected(String),

    /// The backend did not answer in time.
    #[error("timeout")]
    Timeout,

    /// The attachment could not be read.
    #[error("attachment error: {0}")]
    Attachment(String),

    /// Any other delivery failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Attachment(_) => ErrorKind::System,
            _ => ErrorKind::External,
        }
    }

    /// Whether a caller-level retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}
