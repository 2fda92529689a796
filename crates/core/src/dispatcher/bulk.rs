//! Bulk sender implementation.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::reporting::{BulkSendMetrics, NoopReporter, Reporter, RunStatus};

use super::config::DispatcherConfig;
use super::error::DispatchError;
use super::traits::Transport;
use super::types::{BulkSendReport, DeliveryJob, DeliveryOutcome};

/// Cause recorded for jobs abandoned because the batch was canceled.
const CANCELED_CAUSE: &str = "canceled";

/// Sends batches of delivery jobs with bounded parallelism.
///
/// The transport is shared by every task of every batch; see [`Transport`]
/// for the concurrency contract it must uphold.
pub struct Dispatcher {
    config: DispatcherConfig,
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn Reporter>,
}

impl Dispatcher {
    /// Creates a dispatcher around an already-initialized transport.
    pub fn new(config: DispatcherConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            reporter: Arc::new(NoopReporter),
        }
    }

    /// Sets the reporter for bulk send metrics.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Sends every job once, with the configured parallelism.
    pub async fn send_bulk(
        &self,
        jobs: Vec<DeliveryJob>,
        cancel: &CancellationToken,
    ) -> Result<BulkSendReport, DispatchError> {
        self.send_bulk_with_limit(jobs, self.config.max_parallel, cancel)
            .await
    }

    /// Sends every job once, with at most `max_parallel` deliveries in flight.
    ///
    /// Recipients must be unique within a batch. Per-recipient failures are
    /// returned in the report; only an empty, duplicated or already-canceled
    /// batch is an error.
    pub async fn send_bulk_with_limit(
        &self,
        jobs: Vec<DeliveryJob>,
        max_parallel: usize,
        cancel: &CancellationToken,
    ) -> Result<BulkSendReport, DispatchError> {
        let start = Instant::now();

        if let Err(e) = Self::validate(&jobs) {
            warn!("Bulk send validation failed: {}", e);
            self.report(RunStatus::Failure, 0, 0, start);
            return Err(e);
        }

        if cancel.is_cancelled() {
            warn!("Bulk send aborted: operation canceled before start");
            self.report(RunStatus::Failure, 0, 0, start);
            return Err(DispatchError::Canceled);
        }

        let total = jobs.len();
        let max_parallel = max_parallel.max(1);
        info!(
            "Bulk send started: {} recipients, max {} in parallel, transport {}",
            total,
            max_parallel,
            self.transport.name()
        );

        let semaphore = Arc::new(Semaphore::new(max_parallel));
        // Every task sends exactly one outcome, so sends never wait.
        let (outcome_tx, mut outcome_rx) = mpsc::channel(total);
        let mut tasks = JoinSet::new();

        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let transport = Arc::clone(&self.transport);
            let cancel = cancel.clone();
            let outcome_tx = outcome_tx.clone();

            tasks.spawn(async move {
                let outcome = Self::deliver_one(job, transport, semaphore, cancel).await;
                let _ = outcome_tx.send(outcome).await;
            });
        }
        drop(outcome_tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Delivery task did not complete: {}", e);
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(outcome) = outcome_rx.recv().await {
            outcomes.push(outcome);
        }

        let report = BulkSendReport::from_outcomes(outcomes);
        if let Some(ref failed) = report.failed {
            for (recipient, cause) in failed.causes() {
                warn!("Delivery to {} failed: {}", recipient, cause);
            }
        }

        let status = RunStatus::from_counts(report.sent_count, report.failed_count());
        self.report(status, report.sent_count, report.failed_count(), start);

        info!(
            "Bulk send completed: {} sent, {} failed of {} in {:?}",
            report.sent_count,
            report.failed_count(),
            total,
            start.elapsed()
        );

        Ok(report)
    }

    fn validate(jobs: &[DeliveryJob]) -> Result<(), DispatchError> {
        if jobs.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        let mut seen = HashSet::with_capacity(jobs.len());
        for job in jobs {
            if !seen.insert(job.recipient.as_str()) {
                return Err(DispatchError::DuplicateRecipient(job.recipient.clone()));
            }
        }

        Ok(())
    }

    /// Runs one job through the admission gate. Always yields one outcome.
    async fn deliver_one(
        job: DeliveryJob,
        transport: Arc<dyn Transport>,
        semaphore: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> DeliveryOutcome {
        // Held until this function returns, whatever the delivery result.
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Canceled while waiting for a slot: {}", job.recipient);
                return DeliveryOutcome::failed(&job, CANCELED_CAUSE);
            }
            permit = semaphore.acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return DeliveryOutcome::failed(&job, "admission gate closed"),
            },
        };

        if cancel.is_cancelled() {
            debug!("Canceled before delivery: {}", job.recipient);
            return DeliveryOutcome::failed(&job, CANCELED_CAUSE);
        }

        match tokio::fs::try_exists(&job.artifact_path).await {
            Ok(true) => {}
            Ok(false) => {
                return DeliveryOutcome::failed(
                    &job,
                    format!("artifact not found: {}", job.artifact_path.display()),
                );
            }
            Err(e) => {
                return DeliveryOutcome::failed(
                    &job,
                    format!("artifact not readable: {}: {}", job.artifact_path.display(), e),
                );
            }
        }

        debug!("Delivering to {}", job.recipient);
        match AssertUnwindSafe(transport.deliver(&job)).catch_unwind().await {
            Ok(Ok(())) => DeliveryOutcome::sent(&job),
            Ok(Err(e)) => DeliveryOutcome::failed(&job, e.to_string()),
            Err(_) => {
                error!("Transport panicked while delivering to {}", job.recipient);
                DeliveryOutcome::failed(&job, "delivery task panicked")
            }
        }
    }

    fn report(&self, status: RunStatus, sent: usize, failed: usize, start: Instant) {
        self.reporter.bulk_send_finished(&BulkSendMetrics {
            status,
            sent,
            failed,
            elapsed: start.elapsed(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;
    use std::path::PathBuf;

    fn job(recipient: &str, path: PathBuf) -> DeliveryJob {
        DeliveryJob::new("sender@example.com", recipient, "Receipt", "", path)
    }

    #[tokio::test]
    async fn test_duplicate_recipients_rejected() {
        let transport = MockTransport::new();
        let dispatcher = Dispatcher::new(DispatcherConfig::default(), Arc::new(transport.clone()));

        let jobs = vec![
            job("a@example.com", PathBuf::from("/tmp/a.pdf")),
            job("a@example.com", PathBuf::from("/tmp/b.pdf")),
        ];

        let result = dispatcher.send_bulk(jobs, &CancellationToken::new()).await;
        assert_eq!(
            result,
            Err(DispatchError::DuplicateRecipient("a@example.com".to_string()))
        );
        assert_eq!(transport.delivery_count().await, 0);
    }

    #[tokio::test]
    async fn test_zero_parallelism_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"pdf").unwrap();

        let transport = MockTransport::new();
        let dispatcher = Dispatcher::new(DispatcherConfig::default(), Arc::new(transport.clone()));

        let report = dispatcher
            .send_bulk_with_limit(vec![job("a@example.com", path)], 0, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.sent_count, 1);
        assert_eq!(transport.peak_in_flight(), 1);
    }
}
