//! Collaborator interfaces consumed by the batch pipeline.
//!
//! Each trait is implemented outside this crate's core (spreadsheet parsing,
//! document rendering, storage). Every method returns a
//! [`CollaboratorError`] tagged with its kind.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::CollaboratorError;

use super::types::{ArtifactTemplate, Beneficiary, OrganizationProfile, RecipientSettings};

/// Persists uploaded source files.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Stores the bytes and returns the path they were written to.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CollaboratorError>;
}

/// Extracts beneficiaries and the organization profile from a stored source file.
#[async_trait]
pub trait SourceParser: Send + Sync {
    async fn parse_beneficiaries(&self, path: &Path) -> Result<Vec<Beneficiary>, CollaboratorError>;

    async fn parse_organization_profile(
        &self,
        path: &Path,
    ) -> Result<OrganizationProfile, CollaboratorError>;
}

/// Produces the payment code image embedded in each artifact.
#[async_trait]
pub trait PaymentCodeGenerator: Send + Sync {
    async fn generate(
        &self,
        profile: &OrganizationProfile,
        beneficiary: &Beneficiary,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// Renders per-beneficiary documents.
#[async_trait]
pub trait ArtifactRenderer: Send + Sync {
    /// Prepares the request-wide template from the organization profile.
    async fn prepare_template(
        &self,
        profile: &OrganizationProfile,
    ) -> Result<ArtifactTemplate, CollaboratorError>;

    /// Renders one document and returns its path.
    async fn render(
        &self,
        template: &ArtifactTemplate,
        profile: &OrganizationProfile,
        beneficiary: &Beneficiary,
        payment_code: &[u8],
    ) -> Result<PathBuf, CollaboratorError>;
}

/// Source of the recipient mapping and sender address.
#[async_trait]
pub trait RecipientMappingStore: Send + Sync {
    async fn get(&self) -> Result<RecipientSettings, CollaboratorError>;
}

/// Append-only record of processed source files.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), CollaboratorError>;
}
