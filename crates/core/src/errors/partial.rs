//! Partial-failure errors that never abort a batch.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::ErrorKind;

/// Beneficiaries whose delivery address could not be resolved.
///
/// Their artifacts were generated but never queued for delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingMappingError {
    artifacts: BTreeMap<String, PathBuf>,
}

impl MissingMappingError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a beneficiary without an address and its generated artifact.
    pub fn insert(&mut self, beneficiary: impl Into<String>, artifact: PathBuf) {
        self.artifacts.insert(beneficiary.into(), artifact);
    }

    /// Beneficiary name to artifact path, sorted by name.
    pub fn artifacts(&self) -> &BTreeMap<String, PathBuf> {
        &self.artifacts
    }

    pub fn contains(&self, beneficiary: &str) -> bool {
        self.artifacts.contains_key(beneficiary)
    }

    /// Sorted beneficiary names.
    pub fn beneficiaries(&self) -> Vec<String> {
        self.artifacts.keys().cloned().collect()
    }

    pub fn missing_count(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::User
    }
}

impl fmt::Display for MissingMappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .artifacts
            .iter()
            .map(|(name, path)| format!("{}: {}", name, path.display()))
            .collect();
        write!(
            f,
            "no delivery address found for some beneficiaries: [{}]",
            entries.join(", ")
        )
    }
}

impl std::error::Error for MissingMappingError {}

/// Deliveries that were attempted and failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryFailedError {
    causes: BTreeMap<String, String>,
    artifacts: BTreeMap<String, PathBuf>,
}

impl DeliveryFailedError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failed recipient with its cause and the artifact it should have received.
    pub fn insert(
        &mut self,
        recipient: impl Into<String>,
        cause: impl Into<String>,
        artifact: &Path,
    ) {
        let recipient = recipient.into();
        self.artifacts
            .insert(recipient.clone(), artifact.to_path_buf());
        self.causes.insert(recipient, cause.into());
    }

    /// Recipient address to failure cause, sorted by address.
    pub fn causes(&self) -> &BTreeMap<String, String> {
        &self.causes
    }

    /// Recipient address to the artifact that was not delivered.
    pub fn artifacts(&self) -> &BTreeMap<String, PathBuf> {
        &self.artifacts
    }

    pub fn cause(&self, recipient: &str) -> Option<&str> {
        self.causes.get(recipient).map(String::as_str)
    }

    /// Sorted recipient addresses.
    pub fn recipients(&self) -> Vec<String> {
        self.causes.keys().cloned().collect()
    }

    pub fn failed_count(&self) -> usize {
        self.causes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.causes.is_empty()
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::User
    }
}

impl fmt::Display for DeliveryFailedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .causes
            .iter()
            .map(|(recipient, cause)| format!("{}: {}", recipient, cause))
            .collect();
        write!(f, "errors occurred delivering messages: [{}]", entries.join(", "))
    }
}

impl std::error::Error for DeliveryFailedError {}

/// One entry of a [`CompositeError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartialError {
    /// Never attempted: no address was mapped.
    #[error(transparent)]
    MissingMapping(MissingMappingError),

    /// Attempted and failed during delivery.
    #[error(transparent)]
    DeliveryFailed(DeliveryFailedError),
}

impl PartialError {
    /// Number of beneficiaries or recipients affected.
    pub fn affected_count(&self) -> usize {
        match self {
            Self::MissingMapping(e) => e.missing_count(),
            Self::DeliveryFailed(e) => e.failed_count(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingMapping(e) => e.kind(),
            Self::DeliveryFailed(e) => e.kind(),
        }
    }
}

/// Ordered bundle of partial failures, mapping errors before delivery errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeError {
    errors: Vec<PartialError>,
}

impl CompositeError {
    /// Combines the stage results in pipeline order.
    ///
    /// Empty parts are dropped. Returns `None` when nothing failed.
    pub fn from_parts(
        missing: Option<MissingMappingError>,
        failed: Option<DeliveryFailedError>,
    ) -> Option<Self> {
        let mut errors = Vec::with_capacity(2);

        if let Some(missing) = missing.filter(|e| !e.is_empty()) {
            errors.push(PartialError::MissingMapping(missing));
        }
        if let Some(failed) = failed.filter(|e| !e.is_empty()) {
            errors.push(PartialError::DeliveryFailed(failed));
        }

        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Sub-errors in stage order.
    pub fn errors(&self) -> &[PartialError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<PartialError> {
        self.errors
    }

    pub fn missing_mapping(&self) -> Option<&MissingMappingError> {
        self.errors.iter().find_map(|e| match e {
            PartialError::MissingMapping(m) => Some(m),
            PartialError::DeliveryFailed(_) => None,
        })
    }

    pub fn delivery_failed(&self) -> Option<&DeliveryFailedError> {
        self.errors.iter().find_map(|e| match e {
            PartialError::DeliveryFailed(d) => Some(d),
            PartialError::MissingMapping(_) => None,
        })
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::User
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "multiple errors: [{}]", messages.join("; "))
    }
}

impl std::error::Error for CompositeError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn missing(names: &[&str]) -> MissingMappingError {
        let mut err = MissingMappingError::new();
        for name in names {
            err.insert(*name, PathBuf::from(format!("/receipts/{}.pdf", name)));
        }
        err
    }

    fn failed(entries: &[(&str, &str)]) -> DeliveryFailedError {
        let mut err = DeliveryFailedError::new();
        for (recipient, cause) in entries {
            err.insert(*recipient, *cause, Path::new("/receipts/x.pdf"));
        }
        err
    }

    #[test]
    fn test_counts() {
        assert_eq!(missing(&["Ivanov", "Petrov"]).missing_count(), 2);
        assert_eq!(failed(&[("a@example.com", "timeout")]).failed_count(), 1);
    }

    #[test]
    fn test_display_is_sorted_by_key() {
        let err = failed(&[("z@example.com", "rejected"), ("a@example.com", "timeout")]);
        assert_eq!(
            err.to_string(),
            "errors occurred delivering messages: [a@example.com: timeout, z@example.com: rejected]"
        );
        assert_eq!(err.recipients(), vec!["a@example.com", "z@example.com"]);
    }

    #[test]
    fn test_composite_orders_mapping_first() {
        let composite = CompositeError::from_parts(
            Some(missing(&["Sidorov"])),
            Some(failed(&[("a@example.com", "timeout")])),
        )
        .unwrap();

        assert_eq!(composite.errors().len(), 2);
        assert!(matches!(composite.errors()[0], PartialError::MissingMapping(_)));
        assert!(matches!(composite.errors()[1], PartialError::DeliveryFailed(_)));
        assert_eq!(composite.kind(), ErrorKind::User);
    }

    #[test]
    fn test_composite_drops_empty_parts() {
        let composite = CompositeError::from_parts(
            Some(MissingMappingError::new()),
            Some(failed(&[("a@example.com", "timeout")])),
        )
        .unwrap();

        assert_eq!(composite.errors().len(), 1);
        assert!(composite.missing_mapping().is_none());
        assert_eq!(
            composite.delivery_failed().unwrap().cause("a@example.com"),
            Some("timeout")
        );
    }

    #[test]
    fn test_composite_none_when_nothing_failed() {
        assert!(CompositeError::from_parts(None, None).is_none());
        assert!(CompositeError::from_parts(
            Some(MissingMappingError::new()),
            Some(DeliveryFailedError::new())
        )
        .is_none());
    }

    #[test]
    fn test_composite_summary_joins_messages() {
        let composite = CompositeError::from_parts(
            Some(missing(&["Ivanov"])),
            Some(failed(&[("a@example.com", "timeout")])),
        )
        .unwrap();

        assert_eq!(
            composite.to_string(),
            "multiple errors: [no delivery address found for some beneficiaries: \
             [Ivanov: /receipts/Ivanov.pdf]; errors occurred delivering messages: \
             [a@example.com: timeout]]"
        );
    }
}
