//! Trait definitions for the dispatcher module.

use async_trait::async_trait;

use super::error::TransportError;
use super::types::DeliveryJob;

/// Delivers one message with its attachment to the messaging backend.
///
/// A single transport instance is shared by every task of a batch, so
/// implementations must be safe for concurrent use. Implementations that
/// hold a session open it when they are constructed, never lazily from
/// inside `deliver`.
///
/// The dispatcher applies no per-delivery timeout; implementations talking
/// to a backend without one of its own must bound the call themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the name of this transport implementation.
    fn name(&self) -> &str;

    /// Delivers the job. Called exactly once per job.
    async fn deliver(&self, job: &DeliveryJob) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct RejectingTransport;

    #[async_trait]
    impl Transport for RejectingTransport {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn deliver(&self, job: &DeliveryJob) -> Result<(), TransportError> {
            Err(TransportError::Rejected(job.recipient.clone()))
        }
    }

    #[tokio::test]
    async fn test_transport_object_safety() {
        let transport: Box<dyn Transport> = Box::new(RejectingTransport);
        let job = DeliveryJob::new(
            "sender@example.com",
            "a@example.com",
            "Receipt",
            "",
            PathBuf::from("/tmp/a.pdf"),
        );

        let err = transport.deliver(&job).await.unwrap_err();
        assert_eq!(err, TransportError::Rejected("a@example.com".into()));
        assert_eq!(transport.name(), "rejecting");
    }
}
