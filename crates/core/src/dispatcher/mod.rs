//! Bounded-concurrency bulk delivery.
//!
//! The [`Dispatcher`] takes a batch of [`DeliveryJob`]s and hands each one
//! to a [`Transport`] exactly once:
//! - At most `max_parallel` jobs perform delivery I/O at the same time
//! - One job's failure never affects its siblings
//! - Cancellation stops new deliveries; in-flight deliveries run to completion
//!
//! # Example
//!
//! ```ignore
//! use remit_core::dispatcher::{Dispatcher, DispatcherConfig, DeliveryJob};
//! use tokio_util::sync::CancellationToken;
//!
//! let dispatcher = Dispatcher::new(DispatcherConfig::default(), transport);
//! let report = dispatcher.send_bulk(jobs, &CancellationToken::new()).await?;
//!
//! println!("Sent {} messages", report.sent_count);
//! if let Some(failed) = report.failed {
//!     for (recipient, cause) in failed.causes() {
//!         println!("{}: {}", recipient, cause);
//!     }
//! }
//! ```

mod bulk;
mod config;
mod error;
mod traits;
mod types;

pub use bulk::Dispatcher;
pub use config::DispatcherConfig;
pub use error::{DispatchError, TransportError};
pub use traits::Transport;
pub use types::{BulkSendReport, DeliveryJob, DeliveryOutcome, DeliveryStatus};
