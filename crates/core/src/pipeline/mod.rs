//! Batch pipeline.
//!
//! [`BatchOrchestrator::process_batch`] runs one uploaded source file through
//! validate, store, parse, history, generate, dispatch and aggregate, in that
//! order. The result is one of:
//! - `Ok(BatchOutcome::Succeeded)`: every beneficiary mapped and delivered
//! - `Ok(BatchOutcome::PartiallySucceeded)`: output plus a [`CompositeError`]
//! - `Err(PipelineError)`: a fatal stage failed, nothing else ran
//!
//! [`CompositeError`]: crate::errors::CompositeError

mod config;
mod error;
mod runner;
mod summary;
mod traits;
mod types;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use runner::{BatchOrchestrator, Collaborators};
pub use summary::BatchSummary;
pub use traits::{
    ArtifactRenderer, HistoryStore, PaymentCodeGenerator, RecipientMappingStore, SourceParser,
    SourceStore,
};
pub use types::{
    ArtifactTemplate, BatchOutcome, BatchOutput, Beneficiary, OrganizationProfile,
    RecipientMapping, RecipientSettings, Stage,
};
