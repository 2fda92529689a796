//! Error taxonomy shared by every stage of a batch.
//!
//! Errors fall into three kinds:
//! - **System**: infrastructure failures (I/O, storage, templates)
//! - **User**: validation and business-rule failures
//! - **External**: third-party service failures (message transport)
//!
//! Partial failures that do not abort a batch are carried by
//! [`MissingMappingError`] and [`DeliveryFailedError`], bundled in stage
//! order by [`CompositeError`].

mod collaborator;
mod kind;
mod partial;

pub use collaborator::CollaboratorError;
pub use kind::ErrorKind;
pub use partial::{CompositeError, DeliveryFailedError, MissingMappingError, PartialError};
