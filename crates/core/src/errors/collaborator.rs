//! Error shape returned by external collaborators.

use std::error::Error as StdError;
use thiserror::Error;

use super::ErrorKind;

type BoxedSource = Box<dyn StdError + Send + Sync + 'static>;

/// An error raised by a parser, renderer, or store, tagged with its kind.
///
/// The kind is chosen by the collaborator; the pipeline preserves it where
/// the stage calls for it (parsing) and overrides it otherwise.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CollaboratorError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxedSource>,
}

impl CollaboratorError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a system error.
    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::System, message)
    }

    /// Creates a user error.
    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User, message)
    }

    /// Creates an external error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::External, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source(mut self, source: impl Into<BoxedSource>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for CollaboratorError {
    fn from(err: std::io::Error) -> Self {
        Self::system(err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(CollaboratorError::system("a").kind(), ErrorKind::System);
        assert_eq!(CollaboratorError::user("b").kind(), ErrorKind::User);
        assert_eq!(CollaboratorError::external("c").kind(), ErrorKind::External);
    }

    #[test]
    fn test_source_is_chained() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing sheet");
        let err = CollaboratorError::user("failed to read beneficiaries").with_source(io);

        assert_eq!(err.to_string(), "failed to read beneficiaries");
        assert_eq!(err.source().unwrap().to_string(), "missing sheet");
    }

    #[test]
    fn test_from_io_is_system() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CollaboratorError::from(io);
        assert_eq!(err.kind(), ErrorKind::System);
        assert_eq!(err.message(), "denied");
    }
}
