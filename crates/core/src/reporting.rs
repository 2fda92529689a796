//! Observability port for batches and bulk sends.
//!
//! The orchestrator and the dispatcher report through an injected
//! [`Reporter`]; nothing here is process-global. [`PrometheusReporter`] owns
//! its registry so several instances can coexist (one per test, for example).

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::errors::ErrorKind;
use crate::pipeline::Stage;

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageResult {
    Success,
    /// Completed with per-recipient failures recorded.
    Partial,
    Failure(ErrorKind),
}

impl StageResult {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failure(_) => "failure",
        }
    }

    fn error_kind_label(&self) -> &'static str {
        match self {
            Self::Failure(kind) => kind.as_str(),
            _ => "",
        }
    }
}

/// Overall status of a bulk send or a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Partial,
    Failure,
}

impl RunStatus {
    /// Success when nothing failed, failure when nothing was sent.
    pub fn from_counts(sent: usize, failed: usize) -> Self {
        if failed == 0 {
            Self::Success
        } else if sent == 0 {
            Self::Failure
        } else {
            Self::Partial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Partial => "partial",
            Self::Failure => "failure",
        }
    }
}

/// Figures reported once per bulk send.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkSendMetrics {
    pub status: RunStatus,
    pub sent: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Receives counts, durations and per-stage outcomes.
///
/// All methods default to doing nothing.
pub trait Reporter: Send + Sync {
    fn stage_finished(&self, _stage: Stage, _result: StageResult, _elapsed: Duration) {}

    fn bulk_send_finished(&self, _metrics: &BulkSendMetrics) {}

    fn batch_finished(&self, _status: RunStatus, _elapsed: Duration) {}
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {}

/// Prometheus-backed reporter with its own registry.
pub struct PrometheusReporter {
    registry: Registry,
    stage_duration: HistogramVec,
    stage_total: IntCounterVec,
    bulk_send_total: IntCounterVec,
    messages_sent: HistogramVec,
    messages_failed: HistogramVec,
    batch_duration: HistogramVec,
}

impl PrometheusReporter {
    /// Creates the metric families and registers them in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let stage_duration = HistogramVec::new(
            HistogramOpts::new("remit_stage_duration_seconds", "Duration of pipeline stages")
                .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
            &["stage", "result"],
        )?;

        let stage_total = IntCounterVec::new(
            Opts::new("remit_stage_total", "Total pipeline stage executions"),
            &["stage", "result", "error_type"],
        )?;

        let bulk_send_total = IntCounterVec::new(
            Opts::new("remit_bulk_send_total", "Total bulk send operations"),
            &["status"],
        )?;

        let messages_sent = HistogramVec::new(
            HistogramOpts::new("remit_messages_sent_count", "Messages sent per bulk send")
                .buckets(vec![0.0, 1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]),
            &["status"],
        )?;

        let messages_failed = HistogramVec::new(
            HistogramOpts::new("remit_messages_failed_count", "Messages failed per bulk send")
                .buckets(vec![0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0]),
            &["status"],
        )?;

        let batch_duration = HistogramVec::new(
            HistogramOpts::new("remit_batch_duration_seconds", "End-to-end batch latency")
                .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0, 60.0, 120.0]),
            &["status"],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(stage_duration.clone()))?;
        registry.register(Box::new(stage_total.clone()))?;
        registry.register(Box::new(bulk_send_total.clone()))?;
        registry.register(Box::new(messages_sent.clone()))?;
        registry.register(Box::new(messages_failed.clone()))?;
        registry.register(Box::new(batch_duration.clone()))?;

        Ok(Self {
            registry,
            stage_duration,
            stage_total,
            bulk_send_total,
            messages_sent,
            messages_failed,
            batch_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders all metrics in the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Reporter for PrometheusReporter {
    fn stage_finished(&self, stage: Stage, result: StageResult, elapsed: Duration) {
        self.stage_duration
            .with_label_values(&[stage.as_str(), result.label()])
            .observe(elapsed.as_secs_f64());
        self.stage_total
            .with_label_values(&[stage.as_str(), result.label(), result.error_kind_label()])
            .inc();
    }

    fn bulk_send_finished(&self, metrics: &BulkSendMetrics) {
        let status = metrics.status.as_str();
        self.bulk_send_total.with_label_values(&[status]).inc();
        self.messages_sent
            .with_label_values(&[status])
            .observe(metrics.sent as f64);
        self.messages_failed
            .with_label_values(&[status])
            .observe(metrics.failed as f64);
    }

    fn batch_finished(&self, status: RunStatus, elapsed: Duration) {
        self.batch_duration
            .with_label_values(&[status.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}
