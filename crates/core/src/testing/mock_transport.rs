//! Mock transport for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

use crate::dispatcher::{DeliveryJob, Transport, TransportError};

/// A recorded delivery attempt for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDelivery {
    /// The job that was delivered.
    pub job: DeliveryJob,
    /// Whether the delivery succeeded.
    pub success: bool,
}

/// Mock implementation of the Transport trait.
///
/// Provides controllable behavior for testing:
/// - Record every delivery attempt
/// - Fail or panic for chosen recipients
/// - Simulate delivery latency
/// - Track concurrent deliveries and their peak
///
/// # Example
///
/// ```rust,ignore
/// use remit_core::testing::MockTransport;
///
/// let transport = MockTransport::new();
/// transport.fail_recipient("b@example.com", TransportError::Timeout).await;
///
/// let dispatcher = Dispatcher::new(config, Arc::new(transport.clone()));
/// dispatcher.send_bulk(jobs, &cancel).await?;
///
/// assert!(transport.peak_in_flight() <= 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockTransport {
    deliveries: Arc<RwLock<Vec<RecordedDelivery>>>,
    failures: Arc<RwLock<HashMap<String, TransportError>>>,
    panics: Arc<RwLock<HashSet<String>>>,
    delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    started: Arc<Notify>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport that accepts everything instantly.
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            panics: Arc::new(RwLock::new(HashSet::new())),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            started: Arc::new(Notify::new()),
        }
    }

    /// Set how long each delivery takes.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Make deliveries to `recipient` fail with `error`.
    pub async fn fail_recipient(&self, recipient: &str, error: TransportError) {
        self.failures
            .write()
            .await
            .insert(recipient.to_string(), error);
    }

    /// Make deliveries to `recipient` panic.
    pub async fn panic_for(&self, recipient: &str) {
        self.panics.write().await.insert(recipient.to_string());
    }

    /// Get all recorded deliveries.
    pub async fn recorded_deliveries(&self) -> Vec<RecordedDelivery> {
        self.deliveries.read().await.clone()
    }

    /// Get the number of completed delivery attempts.
    pub async fn delivery_count(&self) -> usize {
        self.deliveries.read().await.len()
    }

    /// Recipients of successful deliveries, sorted.
    pub async fn delivered_recipients(&self) -> Vec<String> {
        let mut recipients: Vec<String> = self
            .deliveries
            .read()
            .await
            .iter()
            .filter(|d| d.success)
            .map(|d| d.job.recipient.clone())
            .collect();
        recipients.sort();
        recipients
    }

    /// Deliveries currently in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of deliveries in progress at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until a delivery has started.
    ///
    /// Returns immediately if one started since the last call.
    pub async fn wait_for_delivery_start(&self) {
        self.started.notified().await;
    }
}

/// Decrements the in-flight counter when a delivery ends, panics included.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(&self, job: &DeliveryJob) -> Result<(), TransportError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        self.started.notify_one();

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.panics.read().await.contains(&job.recipient) {
            panic!("mock transport panic for {}", job.recipient);
        }

        let result = match self.failures.read().await.get(&job.recipient) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        };

        self.deliveries.write().await.push(RecordedDelivery {
            job: job.clone(),
            success: result.is_ok(),
        });

        result
    }
}
