//! Fatal errors for the batch pipeline.

use thiserror::Error;

use crate::dispatcher::DispatchError;
use crate::errors::{CollaboratorError, ErrorKind};

use super::types::Stage;

/// Errors that abort a batch. No partial result accompanies them.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No recipient mapping has been uploaded.
    #[error("recipient mapping is not uploaded")]
    MissingRecipientMapping,

    /// No sender address has been configured.
    #[error("sender address is not set")]
    MissingSenderAddress,

    /// The settings store could not be read.
    #[error("failed to load recipient settings: {0}")]
    Settings(#[source] CollaboratorError),

    /// The uploaded file could not be stored.
    #[error("failed to store uploaded file {file_name}: {source}")]
    Storage {
        file_name: String,
        #[source]
        source: CollaboratorError,
    },

    /// The source file could not be parsed. Keeps the parser's kind.
    #[error("failed to parse source file: {0}")]
    Parse(#[source] CollaboratorError),

    /// The processed file could not be recorded.
    #[error("failed to record history: {0}")]
    History(#[source] CollaboratorError),

    /// The request-wide template could not be prepared.
    #[error("failed to prepare artifact template: {0}")]
    Template(#[source] CollaboratorError),

    /// A payment code could not be generated.
    #[error("failed to generate payment code for {beneficiary}: {source}")]
    PaymentCode {
        beneficiary: String,
        #[source]
        source: CollaboratorError,
    },

    /// A document could not be rendered.
    #[error("failed to render artifact for {beneficiary}: {source}")]
    Render {
        beneficiary: String,
        #[source]
        source: CollaboratorError,
    },

    /// The dispatcher refused the batch.
    #[error("dispatch failed: {0}")]
    Dispatch(#[source] DispatchError),

    /// The request was canceled.
    #[error("operation canceled")]
    Canceled,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRecipientMapping | Self::MissingSenderAddress | Self::Canceled => {
                ErrorKind::User
            }
            Self::Settings(_)
            | Self::Storage { .. }
            | Self::History(_)
            | Self::Template(_)
            | Self::PaymentCode { .. }
            | Self::Render { .. } => ErrorKind::System,
            Self::Parse(source) => source.kind(),
            Self::Dispatch(source) => source.kind(),
        }
    }

    /// The stage that raised this error, `None` for cancellation.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::MissingRecipientMapping | Self::MissingSenderAddress | Self::Settings(_) => {
                Some(Stage::Validate)
            }
            Self::Storage { .. } => Some(Stage::Store),
            Self::Parse(_) => Some(Stage::Parse),
            Self::History(_) => Some(Stage::History),
            Self::Template(_) | Self::PaymentCode { .. } | Self::Render { .. } => {
                Some(Stage::GenerateArtifacts)
            }
            Self::Dispatch(_) => Some(Stage::Dispatch),
            Self::Canceled => None,
        }
    }
}

impl From<DispatchError> for PipelineError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Canceled => Self::Canceled,
            other => Self::Dispatch(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_kind() {
        let err = PipelineError::Parse(CollaboratorError::user("missing sheet Payers"));
        assert_eq!(err.kind(), ErrorKind::User);
        assert_eq!(err.stage(), Some(Stage::Parse));

        let err = PipelineError::Parse(CollaboratorError::system("disk read failed"));
        assert_eq!(err.kind(), ErrorKind::System);
    }

    #[test]
    fn test_fatal_kinds() {
        assert_eq!(PipelineError::MissingRecipientMapping.kind(), ErrorKind::User);
        assert_eq!(
            PipelineError::History(CollaboratorError::system("db locked")).kind(),
            ErrorKind::System
        );
        assert_eq!(
            PipelineError::Storage {
                file_name: "payers.xlsx".to_string(),
                source: CollaboratorError::user("odd"),
            }
            .kind(),
            ErrorKind::System
        );
    }

    #[test]
    fn test_dispatch_cancel_maps_to_canceled() {
        let err = PipelineError::from(DispatchError::Canceled);
        assert!(matches!(err, PipelineError::Canceled));
        assert_eq!(err.stage(), None);

        let err = PipelineError::from(DispatchError::NoRecipients);
        assert!(matches!(err, PipelineError::Dispatch(DispatchError::NoRecipients)));
    }

    #[test]
    fn test_error_display() {
        let err = PipelineError::Render {
            beneficiary: "Ivanov".to_string(),
            source: CollaboratorError::system("font not found"),
        };
        assert_eq!(err.to_string(), "failed to render artifact for Ivanov: font not found");
    }
}
