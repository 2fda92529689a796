//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of every collaborator trait and
//! of the transport, so whole batches can run without real infrastructure.
//!
//! # Example
//!
//! ```rust,ignore
//! use remit_core::testing::{fixtures, MockTransport, MockSourceParser};
//!
//! let transport = MockTransport::new();
//! transport.fail_recipient("b@example.com", TransportError::Timeout).await;
//!
//! let parser = MockSourceParser::new(
//!     vec![fixtures::beneficiary("Ivanov Ivan", "1200")],
//!     fixtures::organization_profile(),
//! );
//! ```

mod mock_collaborators;
mod mock_transport;
mod recording_reporter;

pub use mock_collaborators::{
    MockArtifactRenderer, MockHistoryStore, MockPaymentCodeGenerator, MockRecipientMappingStore,
    MockSourceParser, MockSourceStore,
};
pub use mock_transport::{MockTransport, RecordedDelivery};
pub use recording_reporter::{RecordingReporter, ReportedEvent};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::PathBuf;

    use crate::dispatcher::DeliveryJob;
    use crate::pipeline::{Beneficiary, OrganizationProfile, RecipientMapping, RecipientSettings};

    pub const SENDER: &str = "billing@example.com";

    /// Create a beneficiary with reasonable defaults.
    pub fn beneficiary(full_name: &str, amount: &str) -> Beneficiary {
        Beneficiary {
            full_name: full_name.to_string(),
            personal_account: format!("LS-{:04}", full_name.len()),
            purpose: "Tuition fee".to_string(),
            budget_code: "18210102010011000110".to_string(),
            territory_code: "45000000".to_string(),
            amount: amount.to_string(),
        }
    }

    /// Create a test organization profile.
    pub fn organization_profile() -> OrganizationProfile {
        OrganizationProfile {
            name: "School No. 7".to_string(),
            settlement_account: "40702810900000000001".to_string(),
            bank_name: "Example Bank".to_string(),
            bic: "044525225".to_string(),
            correspondent_account: "30101810400000000225".to_string(),
            payee_inn: "7701234567".to_string(),
            kpp: "770101001".to_string(),
            extra_params: String::new(),
        }
    }

    /// Settings with the default sender and the given name/address pairs.
    pub fn settings(pairs: &[(&str, &str)]) -> RecipientSettings {
        RecipientSettings {
            mapping: Some(pairs.iter().copied().collect::<RecipientMapping>()),
            sender_address: SENDER.to_string(),
        }
    }

    /// Create a delivery job from the default sender.
    pub fn delivery_job(recipient: &str, artifact_path: impl Into<PathBuf>) -> DeliveryJob {
        DeliveryJob::new(SENDER, recipient, "Payment receipt", "", artifact_path.into())
    }
}
