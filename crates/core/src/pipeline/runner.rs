//! Batch orchestrator implementation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dispatcher::{DeliveryJob, Dispatcher};
use crate::errors::{CompositeError, MissingMappingError};
use crate::reporting::{NoopReporter, Reporter, RunStatus, StageResult};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::traits::{
    ArtifactRenderer, HistoryStore, PaymentCodeGenerator, RecipientMappingStore, SourceParser,
    SourceStore,
};
use super::types::{
    BatchOutcome, BatchOutput, Beneficiary, OrganizationProfile, RecipientMapping, Stage,
};

/// External collaborators used by each batch.
#[derive(Clone)]
pub struct Collaborators {
    pub source_store: Arc<dyn SourceStore>,
    pub parser: Arc<dyn SourceParser>,
    pub payment_codes: Arc<dyn PaymentCodeGenerator>,
    pub renderer: Arc<dyn ArtifactRenderer>,
    pub settings: Arc<dyn RecipientMappingStore>,
    pub history: Arc<dyn HistoryStore>,
}

/// Settings checked in the validate stage.
struct ValidatedSettings {
    mapping: RecipientMapping,
    sender_address: String,
}

/// Result of the generate stage.
#[derive(Default)]
struct GeneratedArtifacts {
    by_recipient: BTreeMap<String, PathBuf>,
    missing: MissingMappingError,
}

/// Runs the stages of a batch in order.
///
/// Validate, store, parse, history and template or render failures abort the
/// batch. Unmapped beneficiaries and failed deliveries are collected and
/// returned alongside what succeeded.
pub struct BatchOrchestrator {
    config: PipelineConfig,
    collaborators: Collaborators,
    dispatcher: Dispatcher,
    reporter: Arc<dyn Reporter>,
}

impl BatchOrchestrator {
    pub fn new(config: PipelineConfig, collaborators: Collaborators, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            collaborators,
            dispatcher,
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Sets the reporter for stage and batch metrics.
    ///
    /// The dispatcher keeps its own reporter; see [`Dispatcher::with_reporter`].
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Processes one uploaded source file end to end.
    pub async fn process_batch(
        &self,
        cancel: &CancellationToken,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<BatchOutcome, PipelineError> {
        let batch_id = Uuid::new_v4();
        let start = Instant::now();
        info!(
            "[{}] Batch started: {} ({} bytes)",
            batch_id,
            file_name,
            bytes.len()
        );

        let result = self.run(batch_id, cancel, file_name, bytes).await;

        let status = match &result {
            Ok(BatchOutcome::Succeeded(output)) => {
                info!(
                    "[{}] Batch succeeded: {} sent in {:?}",
                    batch_id,
                    output.sent_count,
                    start.elapsed()
                );
                RunStatus::Success
            }
            Ok(BatchOutcome::PartiallySucceeded { output, error }) => {
                warn!(
                    "[{}] Batch partially succeeded: {} sent in {:?}: {}",
                    batch_id,
                    output.sent_count,
                    start.elapsed(),
                    error
                );
                RunStatus::Partial
            }
            Err(e) => {
                error!(
                    "[{}] Batch failed ({}) after {:?}: {}",
                    batch_id,
                    e.kind(),
                    start.elapsed(),
                    e
                );
                RunStatus::Failure
            }
        };
        self.reporter.batch_finished(status, start.elapsed());

        result
    }

    async fn run(
        &self,
        batch_id: Uuid,
        cancel: &CancellationToken,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<BatchOutcome, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Canceled);
        }

        let stage_start = Instant::now();
        let settings = self.validate().await;
        let settings = self.finish(batch_id, Stage::Validate, stage_start, settings)?;

        let stage_start = Instant::now();
        let stored = self
            .collaborators
            .source_store
            .store(file_name, bytes)
            .await
            .map_err(|source| PipelineError::Storage {
                file_name: file_name.to_string(),
                source,
            });
        let stored = self.finish(batch_id, Stage::Store, stage_start, stored)?;
        debug!("[{}] Stored upload at {}", batch_id, stored.display());

        let stage_start = Instant::now();
        let parsed = self.parse(&stored).await;
        let (beneficiaries, profile) = self.finish(batch_id, Stage::Parse, stage_start, parsed)?;
        info!(
            "[{}] Parsed {} beneficiaries for {}",
            batch_id,
            beneficiaries.len(),
            profile.name
        );

        let stage_start = Instant::now();
        let recorded = self
            .collaborators
            .history
            .append(file_name, bytes)
            .await
            .map_err(PipelineError::History);
        self.finish(batch_id, Stage::History, stage_start, recorded)?;

        let stage_start = Instant::now();
        let generated = self
            .generate(batch_id, cancel, &beneficiaries, &profile, &settings.mapping)
            .await;
        let generated = match generated {
            Ok(generated) => {
                let result = if generated.missing.is_empty() {
                    StageResult::Success
                } else {
                    StageResult::Partial
                };
                self.reporter
                    .stage_finished(Stage::GenerateArtifacts, result, stage_start.elapsed());
                info!(
                    "[{}] Generated {} deliverable artifacts, {} unmapped in {:?}",
                    batch_id,
                    generated.by_recipient.len(),
                    generated.missing.missing_count(),
                    stage_start.elapsed()
                );
                generated
            }
            Err(e) => return Err(self.fail(batch_id, Stage::GenerateArtifacts, stage_start, e)),
        };

        let (sent_count, failed) = if generated.by_recipient.is_empty() {
            info!("[{}] No deliverable artifacts, skipping dispatch", batch_id);
            (0, None)
        } else {
            let stage_start = Instant::now();
            let jobs = self.build_jobs(&settings.sender_address, &generated.by_recipient);
            match self.dispatcher.send_bulk(jobs, cancel).await {
                Ok(report) => {
                    let result = if report.all_sent() {
                        StageResult::Success
                    } else {
                        StageResult::Partial
                    };
                    self.reporter
                        .stage_finished(Stage::Dispatch, result, stage_start.elapsed());
                    (report.sent_count, report.failed)
                }
                Err(e) => {
                    let e = PipelineError::from(e);
                    return Err(self.fail(batch_id, Stage::Dispatch, stage_start, e));
                }
            }
        };

        let stage_start = Instant::now();
        let GeneratedArtifacts {
            by_recipient,
            missing,
        } = generated;
        let output = BatchOutput {
            batch_id,
            artifacts_by_recipient: by_recipient,
            sent_count,
        };
        let outcome = match CompositeError::from_parts(Some(missing), failed) {
            None => BatchOutcome::Succeeded(output),
            Some(error) => BatchOutcome::PartiallySucceeded { output, error },
        };
        let result = if outcome.is_partial() {
            StageResult::Partial
        } else {
            StageResult::Success
        };
        self.reporter
            .stage_finished(Stage::Aggregate, result, stage_start.elapsed());

        Ok(outcome)
    }

    async fn validate(&self) -> Result<ValidatedSettings, PipelineError> {
        let settings = self
            .collaborators
            .settings
            .get()
            .await
            .map_err(PipelineError::Settings)?;

        let mapping = settings
            .mapping
            .ok_or(PipelineError::MissingRecipientMapping)?;

        let sender_address = settings.sender_address.trim().to_string();
        if sender_address.is_empty() {
            return Err(PipelineError::MissingSenderAddress);
        }

        Ok(ValidatedSettings {
            mapping,
            sender_address,
        })
    }

    async fn parse(
        &self,
        stored: &Path,
    ) -> Result<(Vec<Beneficiary>, OrganizationProfile), PipelineError> {
        let parser = &self.collaborators.parser;
        let beneficiaries = parser
            .parse_beneficiaries(stored)
            .await
            .map_err(PipelineError::Parse)?;
        let profile = parser
            .parse_organization_profile(stored)
            .await
            .map_err(PipelineError::Parse)?;

        Ok((beneficiaries, profile))
    }

    /// Renders one artifact per named beneficiary and sorts it by mapping.
    async fn generate(
        &self,
        batch_id: Uuid,
        cancel: &CancellationToken,
        beneficiaries: &[Beneficiary],
        profile: &OrganizationProfile,
        mapping: &RecipientMapping,
    ) -> Result<GeneratedArtifacts, PipelineError> {
        let renderer = &self.collaborators.renderer;
        let template = renderer
            .prepare_template(profile)
            .await
            .map_err(PipelineError::Template)?;

        let mut generated = GeneratedArtifacts::default();

        for beneficiary in beneficiaries {
            if cancel.is_cancelled() {
                return Err(PipelineError::Canceled);
            }

            if !beneficiary.has_name() {
                warn!("[{}] Skipping beneficiary with empty name", batch_id);
                continue;
            }
            let name = beneficiary.full_name.trim();

            let payment_code = self
                .collaborators
                .payment_codes
                .generate(profile, beneficiary)
                .await
                .map_err(|source| PipelineError::PaymentCode {
                    beneficiary: name.to_string(),
                    source,
                })?;

            let artifact = renderer
                .render(&template, profile, beneficiary, &payment_code)
                .await
                .map_err(|source| PipelineError::Render {
                    beneficiary: name.to_string(),
                    source,
                })?;

            match mapping.resolve(beneficiary) {
                Some(address) => {
                    debug!("[{}] Rendered {} for {}", batch_id, artifact.display(), address);
                    if let Some(replaced) =
                        generated.by_recipient.insert(address.to_string(), artifact)
                    {
                        warn!(
                            "[{}] Address {} is mapped to several beneficiaries, {} replaced by {}",
                            batch_id,
                            address,
                            replaced.display(),
                            name
                        );
                    }
                }
                None => {
                    warn!("[{}] No delivery address for {}", batch_id, name);
                    generated.missing.insert(name, artifact);
                }
            }
        }

        Ok(generated)
    }

    fn build_jobs(&self, sender: &str, artifacts: &BTreeMap<String, PathBuf>) -> Vec<DeliveryJob> {
        artifacts
            .iter()
            .map(|(recipient, path)| {
                DeliveryJob::new(
                    sender,
                    recipient.as_str(),
                    self.config.subject.as_str(),
                    self.config.body.as_str(),
                    path.clone(),
                )
            })
            .collect()
    }

    /// Reports a stage result and passes it through.
    fn finish<T>(
        &self,
        batch_id: Uuid,
        stage: Stage,
        start: Instant,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        match result {
            Ok(value) => {
                debug!(
                    "[{}] Stage {} completed in {:?}",
                    batch_id,
                    stage.as_str(),
                    start.elapsed()
                );
                self.reporter
                    .stage_finished(stage, StageResult::Success, start.elapsed());
                Ok(value)
            }
            Err(e) => Err(self.fail(batch_id, stage, start, e)),
        }
    }

    fn fail(&self, batch_id: Uuid, stage: Stage, start: Instant, e: PipelineError) -> PipelineError {
        warn!("[{}] Stage {} failed: {}", batch_id, stage.as_str(), e);
        self.reporter
            .stage_finished(stage, StageResult::Failure(e.kind()), start.elapsed());
        e
    }
}
