//! Bulk payment receipt generation and delivery.
//!
//! A batch turns one uploaded spreadsheet into a rendered receipt per
//! beneficiary and delivers each receipt to the beneficiary's mapped address:
//! - [`pipeline`]: the ordered stages of a batch and their collaborators
//! - [`dispatcher`]: bounded-concurrency delivery of the resulting jobs
//! - [`errors`]: error kinds and the partial-failure bundle
//! - [`store`]: filesystem and SQLite adapters for storage collaborators
//! - [`reporting`]: injected metrics port

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod pipeline;
pub mod reporting;
pub mod store;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use dispatcher::{DispatchError, Dispatcher, DispatcherConfig, Transport, TransportError};
pub use errors::{CollaboratorError, CompositeError, ErrorKind};
pub use pipeline::{BatchOrchestrator, BatchOutcome, BatchSummary, Collaborators, PipelineError};
pub use reporting::{NoopReporter, PrometheusReporter, Reporter};
