//! Mock pipeline collaborators for testing.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::{CollaboratorError, ErrorKind};
use crate::pipeline::{
    ArtifactRenderer, ArtifactTemplate, Beneficiary, HistoryStore, OrganizationProfile,
    PaymentCodeGenerator, RecipientMappingStore, RecipientSettings, SourceParser, SourceStore,
};

/// A configured failure, rebuilt into a fresh error on every call.
type Failure = Arc<RwLock<Option<(ErrorKind, String)>>>;

async fn configured(failure: &Failure) -> Result<(), CollaboratorError> {
    match &*failure.read().await {
        Some((kind, message)) => Err(CollaboratorError::new(*kind, message.clone())),
        None => Ok(()),
    }
}

fn no_failure() -> Failure {
    Arc::new(RwLock::new(None))
}

/// In-memory source store.
#[derive(Debug, Clone)]
pub struct MockSourceStore {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
    failure: Failure,
}

impl Default for MockSourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSourceStore {
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
            failure: no_failure(),
        }
    }

    /// Make every store call fail.
    pub async fn fail_with(&self, kind: ErrorKind, message: &str) {
        *self.failure.write().await = Some((kind, message.to_string()));
    }

    /// Stored file names and contents.
    pub async fn stored_files(&self) -> BTreeMap<String, Vec<u8>> {
        self.files.read().await.clone()
    }
}

#[async_trait]
impl SourceStore for MockSourceStore {
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, CollaboratorError> {
        configured(&self.failure).await?;
        self.files
            .write()
            .await
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(Path::new("/mock/uploads").join(file_name))
    }
}

/// Parser returning configured beneficiaries and profile.
#[derive(Debug, Clone)]
pub struct MockSourceParser {
    beneficiaries: Arc<RwLock<Vec<Beneficiary>>>,
    profile: Arc<RwLock<OrganizationProfile>>,
    failure: Failure,
    parsed_paths: Arc<RwLock<Vec<PathBuf>>>,
}

impl MockSourceParser {
    pub fn new(beneficiaries: Vec<Beneficiary>, profile: OrganizationProfile) -> Self {
        Self {
            beneficiaries: Arc::new(RwLock::new(beneficiaries)),
            profile: Arc::new(RwLock::new(profile)),
            failure: no_failure(),
            parsed_paths: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn set_beneficiaries(&self, beneficiaries: Vec<Beneficiary>) {
        *self.beneficiaries.write().await = beneficiaries;
    }

    /// Make parsing fail with an error of the given kind.
    pub async fn fail_with(&self, kind: ErrorKind, message: &str) {
        *self.failure.write().await = Some((kind, message.to_string()));
    }

    /// Paths passed to `parse_beneficiaries`.
    pub async fn parsed_paths(&self) -> Vec<PathBuf> {
        self.parsed_paths.read().await.clone()
    }
}

#[async_trait]
impl SourceParser for MockSourceParser {
    async fn parse_beneficiaries(&self, path: &Path) -> Result<Vec<Beneficiary>, CollaboratorError> {
        configured(&self.failure).await?;
        self.parsed_paths.write().await.push(path.to_path_buf());
        Ok(self.beneficiaries.read().await.clone())
    }

    async fn parse_organization_profile(
        &self,
        _path: &Path,
    ) -> Result<OrganizationProfile, CollaboratorError> {
        configured(&self.failure).await?;
        Ok(self.profile.read().await.clone())
    }
}

/// Payment code generator producing a readable payload instead of an image.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentCodeGenerator {
    failing: Arc<RwLock<HashSet<String>>>,
    generated: Arc<RwLock<Vec<String>>>,
}

impl MockPaymentCodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make generation fail for the named beneficiary.
    pub async fn fail_for(&self, full_name: &str) {
        self.failing.write().await.insert(full_name.to_string());
    }

    /// Names codes were generated for, in call order.
    pub async fn generated_for(&self) -> Vec<String> {
        self.generated.read().await.clone()
    }
}

#[async_trait]
impl PaymentCodeGenerator for MockPaymentCodeGenerator {
    async fn generate(
        &self,
        profile: &OrganizationProfile,
        beneficiary: &Beneficiary,
    ) -> Result<Vec<u8>, CollaboratorError> {
        if self.failing.read().await.contains(&beneficiary.full_name) {
            return Err(CollaboratorError::system(format!(
                "cannot encode payment code for {}",
                beneficiary.full_name
            )));
        }

        self.generated
            .write()
            .await
            .push(beneficiary.full_name.clone());

        Ok(format!(
            "ST00012|Name={}|PersonalAcc={}|Sum={}",
            profile.name,
            beneficiary.personal_account,
            beneficiary.normalized_amount()
        )
        .into_bytes())
    }
}

/// Renderer writing small text files into a directory.
#[derive(Debug, Clone)]
pub struct MockArtifactRenderer {
    dir: PathBuf,
    template_failure: Failure,
    failing: Arc<RwLock<HashSet<String>>>,
    unwritten: Arc<RwLock<HashSet<String>>>,
    templates_prepared: Arc<RwLock<usize>>,
    rendered: Arc<RwLock<Vec<String>>>,
}

impl MockArtifactRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            template_failure: no_failure(),
            failing: Arc::new(RwLock::new(HashSet::new())),
            unwritten: Arc::new(RwLock::new(HashSet::new())),
            templates_prepared: Arc::new(RwLock::new(0)),
            rendered: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make template preparation fail.
    pub async fn fail_template(&self, message: &str) {
        *self.template_failure.write().await = Some((ErrorKind::System, message.to_string()));
    }

    /// Make rendering fail for the named beneficiary.
    pub async fn fail_for(&self, full_name: &str) {
        self.failing.write().await.insert(full_name.to_string());
    }

    /// Return a path for the named beneficiary without writing the file.
    pub async fn skip_writing_for(&self, full_name: &str) {
        self.unwritten.write().await.insert(full_name.to_string());
    }

    pub async fn templates_prepared(&self) -> usize {
        *self.templates_prepared.read().await
    }

    /// Names rendered, in call order.
    pub async fn rendered_for(&self) -> Vec<String> {
        self.rendered.read().await.clone()
    }
}

#[async_trait]
impl ArtifactRenderer for MockArtifactRenderer {
    async fn prepare_template(
        &self,
        profile: &OrganizationProfile,
    ) -> Result<ArtifactTemplate, CollaboratorError> {
        configured(&self.template_failure).await?;
        *self.templates_prepared.write().await += 1;
        Ok(ArtifactTemplate::new(
            self.dir.join(format!("template_{}.txt", profile.bic)),
        ))
    }

    async fn render(
        &self,
        _template: &ArtifactTemplate,
        profile: &OrganizationProfile,
        beneficiary: &Beneficiary,
        payment_code: &[u8],
    ) -> Result<PathBuf, CollaboratorError> {
        let name = &beneficiary.full_name;
        if self.failing.read().await.contains(name) {
            return Err(CollaboratorError::system(format!("font missing while rendering {}", name)));
        }

        let path = self.dir.join(format!("{}.pdf", beneficiary.file_stem()));
        if !self.unwritten.read().await.contains(name) {
            let mut content = format!("{}\n{}\n", profile.name, beneficiary.normalized_amount())
                .into_bytes();
            content.extend_from_slice(payment_code);
            tokio::fs::write(&path, content).await?;
        }

        self.rendered.write().await.push(name.clone());
        Ok(path)
    }
}

/// Settings store returning a fixed snapshot.
#[derive(Debug, Clone)]
pub struct MockRecipientMappingStore {
    settings: Arc<RwLock<RecipientSettings>>,
    failure: Failure,
}

impl MockRecipientMappingStore {
    pub fn new(settings: RecipientSettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            failure: no_failure(),
        }
    }

    pub async fn set_settings(&self, settings: RecipientSettings) {
        *self.settings.write().await = settings;
    }

    pub async fn fail_with(&self, kind: ErrorKind, message: &str) {
        *self.failure.write().await = Some((kind, message.to_string()));
    }
}

#[async_trait]
impl RecipientMappingStore for MockRecipientMappingStore {
    async fn get(&self) -> Result<RecipientSettings, CollaboratorError> {
        configured(&self.failure).await?;
        Ok(self.settings.read().await.clone())
    }
}

/// In-memory history store.
#[derive(Debug, Clone)]
pub struct MockHistoryStore {
    entries: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
    failure: Failure,
}

impl Default for MockHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            failure: no_failure(),
        }
    }

    pub async fn fail_with(&self, kind: ErrorKind, message: &str) {
        *self.failure.write().await = Some((kind, message.to_string()));
    }

    /// Recorded file names, in order.
    pub async fn recorded_files(&self) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl HistoryStore for MockHistoryStore {
    async fn append(&self, file_name: &str, bytes: &[u8]) -> Result<(), CollaboratorError> {
        configured(&self.failure).await?;
        self.entries
            .write()
            .await
            .push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
