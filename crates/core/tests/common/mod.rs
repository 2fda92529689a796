//! Common test utilities for batch tests with mocks.
//!
//! The harness wires a [`BatchOrchestrator`] to mock collaborators and a
//! [`MockTransport`], with rendered artifacts written to a temp directory.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use remit_core::pipeline::{
    BatchOrchestrator, Beneficiary, Collaborators, PipelineConfig, RecipientSettings,
};
use remit_core::testing::{
    MockArtifactRenderer, MockHistoryStore, MockPaymentCodeGenerator, MockRecipientMappingStore,
    MockSourceParser, MockSourceStore, MockTransport, RecordingReporter,
};
use remit_core::{Dispatcher, DispatcherConfig};

/// Re-export fixtures for test convenience
pub use remit_core::testing::fixtures;

pub const SOURCE_FILE: &str = "payers.xlsx";
pub const SOURCE_BYTES: &[u8] = b"spreadsheet bytes";

/// Orchestrator plus handles to every mock it uses.
pub struct TestHarness {
    pub orchestrator: BatchOrchestrator,
    pub transport: MockTransport,
    pub source_store: MockSourceStore,
    pub parser: MockSourceParser,
    pub payment_codes: MockPaymentCodeGenerator,
    pub renderer: MockArtifactRenderer,
    pub settings: MockRecipientMappingStore,
    pub history: MockHistoryStore,
    pub reporter: RecordingReporter,
    pub dispatch_reporter: RecordingReporter,
    pub artifact_dir: TempDir,
}

impl TestHarness {
    pub fn new(beneficiaries: Vec<Beneficiary>, settings: RecipientSettings) -> Self {
        Self::with_parallelism(beneficiaries, settings, 10)
    }

    pub fn with_parallelism(
        beneficiaries: Vec<Beneficiary>,
        settings: RecipientSettings,
        max_parallel: usize,
    ) -> Self {
        let artifact_dir = TempDir::new().expect("Failed to create artifact dir");

        let transport = MockTransport::new();
        let source_store = MockSourceStore::new();
        let parser = MockSourceParser::new(beneficiaries, fixtures::organization_profile());
        let payment_codes = MockPaymentCodeGenerator::new();
        let renderer = MockArtifactRenderer::new(artifact_dir.path());
        let settings = MockRecipientMappingStore::new(settings);
        let history = MockHistoryStore::new();
        let reporter = RecordingReporter::new();
        let dispatch_reporter = RecordingReporter::new();

        let collaborators = Collaborators {
            source_store: Arc::new(source_store.clone()),
            parser: Arc::new(parser.clone()),
            payment_codes: Arc::new(payment_codes.clone()),
            renderer: Arc::new(renderer.clone()),
            settings: Arc::new(settings.clone()),
            history: Arc::new(history.clone()),
        };
        let orchestrator = orchestrator(
            collaborators,
            &transport,
            &reporter,
            &dispatch_reporter,
            max_parallel,
        );

        Self {
            orchestrator,
            transport,
            source_store,
            parser,
            payment_codes,
            renderer,
            settings,
            history,
            reporter,
            dispatch_reporter,
            artifact_dir,
        }
    }

    /// Collaborators backed by this harness's mocks.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            source_store: Arc::new(self.source_store.clone()),
            parser: Arc::new(self.parser.clone()),
            payment_codes: Arc::new(self.payment_codes.clone()),
            renderer: Arc::new(self.renderer.clone()),
            settings: Arc::new(self.settings.clone()),
            history: Arc::new(self.history.clone()),
        }
    }

    /// Orchestrator over `collaborators`, delivering through this harness's transport.
    pub fn build_orchestrator(
        &self,
        collaborators: Collaborators,
        max_parallel: usize,
    ) -> BatchOrchestrator {
        orchestrator(
            collaborators,
            &self.transport,
            &self.reporter,
            &self.dispatch_reporter,
            max_parallel,
        )
    }

    /// Expected artifact path for a beneficiary name.
    pub fn artifact_path(&self, full_name: &str) -> PathBuf {
        self.artifact_dir
            .path()
            .join(format!("{}.pdf", full_name.trim().replace(' ', "_")))
    }
}

fn orchestrator(
    collaborators: Collaborators,
    transport: &MockTransport,
    reporter: &RecordingReporter,
    dispatch_reporter: &RecordingReporter,
    max_parallel: usize,
) -> BatchOrchestrator {
    let dispatcher = Dispatcher::new(
        DispatcherConfig::default().with_max_parallel(max_parallel),
        Arc::new(transport.clone()),
    )
    .with_reporter(Arc::new(dispatch_reporter.clone()));

    BatchOrchestrator::new(
        PipelineConfig::default().with_body("Your receipt is attached."),
        collaborators,
        dispatcher,
    )
    .with_reporter(Arc::new(reporter.clone()))
}

/// Write a file per name into `dir` and return the paths.
pub fn write_artifacts(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(format!("{}.pdf", name));
            std::fs::write(&path, b"receipt").expect("Failed to write artifact");
            path
        })
        .collect()
}
