//! Reporter that records events for assertions.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::pipeline::Stage;
use crate::reporting::{BulkSendMetrics, Reporter, RunStatus, StageResult};

/// An event received by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReportedEvent {
    Stage { stage: Stage, result: StageResult },
    BulkSend(BulkSendMetrics),
    Batch(RunStatus),
}

/// Records every reporter call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<ReportedEvent>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportedEvent> {
        self.lock().clone()
    }

    /// Stage results in the order they were reported.
    pub fn stage_results(&self) -> Vec<(Stage, StageResult)> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ReportedEvent::Stage { stage, result } => Some((*stage, *result)),
                _ => None,
            })
            .collect()
    }

    pub fn bulk_sends(&self) -> Vec<BulkSendMetrics> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ReportedEvent::BulkSend(metrics) => Some(metrics.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn batch_statuses(&self) -> Vec<RunStatus> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ReportedEvent::Batch(status) => Some(*status),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ReportedEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: ReportedEvent) {
        self.lock().push(event);
    }
}

impl Reporter for RecordingReporter {
    fn stage_finished(&self, stage: Stage, result: StageResult, _elapsed: Duration) {
        self.push(ReportedEvent::Stage { stage, result });
    }

    fn bulk_send_finished(&self, metrics: &BulkSendMetrics) {
        self.push(ReportedEvent::BulkSend(metrics.clone()));
    }

    fn batch_finished(&self, status: RunStatus, _elapsed: Duration) {
        self.push(ReportedEvent::Batch(status));
    }
}
