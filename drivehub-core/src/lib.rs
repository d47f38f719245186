pub mod booking;
pub mod documents;
pub mod fleet;
pub mod notify;
pub mod repository;
pub mod session;

use drivehub_booking::{BookingError, ReservationStatus, ReservationSummary};
use drivehub_catalog::CatalogError;
use uuid::Uuid;

pub use booking::{Availability, BlockRequest, BookingService, BookingUploads, Quote};
pub use documents::{DocumentError, DocumentStore, Upload};
pub use fleet::FleetService;
pub use notify::NotificationSink;
pub use repository::{Collaborators, ServiceRules, StoreError};
pub use session::Actor;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed on {field}: {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Interval conflicts with reservation {} ({})", .0.id, .0.status)]
    ConflictError(ReservationSummary),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    /// `retryable` marks failures where repeating the whole operation may succeed.
    #[error("Storage error: {message}")]
    StorageError { message: String, retryable: bool },

    #[error("Document upload failed for {document}: {message}")]
    DocumentUploadError {
        document: &'static str,
        message: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::ValidationError {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::StorageError { retryable: true, .. })
    }
}

impl From<BookingError> for CoreError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation { field, reason } => CoreError::validation(field, reason),
            BookingError::Conflict(summary) => CoreError::ConflictError(summary),
            BookingError::InvalidTransition { from, to } => CoreError::InvalidTransition { from, to },
        }
    }
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ShareOutOfRange(_) => CoreError::validation("share_percentage", err.to_string()),
            CatalogError::InvalidField { field, reason } => CoreError::validation(field, reason),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overlap(existing) => CoreError::ConflictError(existing.summary()),
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            StoreError::Referenced { vehicle_id, open } => CoreError::validation(
                "vehicle_id",
                format!("vehicle {vehicle_id} still has {open} open reservation(s)"),
            ),
            other => CoreError::StorageError {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_store_errors_keep_retry_hint() {
        let timeout: CoreError = StoreError::Timeout(Duration::from_secs(5)).into();
        assert!(timeout.is_retryable());

        let rejected: CoreError = StoreError::Rejected("constraint violation".to_string()).into();
        assert!(!rejected.is_retryable());
    }

    #[test]
    fn test_share_error_names_field() {
        let err: CoreError = CatalogError::ShareOutOfRange(140).into();
        match err {
            CoreError::ValidationError { field, reason } => {
                assert_eq!(field, "share_percentage");
                assert!(reason.contains("140"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
