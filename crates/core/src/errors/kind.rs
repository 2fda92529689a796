//! Error kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of an error, used to pick remediation and user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Infrastructure, dependency, OS or file errors. Not retried by this layer.
    System,
    /// Incorrect input or missing settings. Never retried.
    User,
    /// Failures reported by third-party services.
    External,
}

impl ErrorKind {
    /// Stable lowercase label, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::External => "external",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
