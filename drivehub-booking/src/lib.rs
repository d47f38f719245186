pub mod calendar;
pub mod conflict;
pub mod finance;
pub mod lifecycle;
pub mod models;
pub mod stats;

pub use calendar::{CellAction, CellState, DayCell, MonthGrid, VehicleRow};
pub use conflict::{find_conflict, OverlapPolicy};
pub use finance::{FleetRevenueReport, RevenueAllocation};
pub use lifecycle::{BookingRequest, DocumentRefs, RenterDetails};
pub use models::{
    Interval, Renter, Reservation, ReservationDraft, ReservationStatus, ReservationSummary,
    TripDetails,
};
pub use stats::DashboardStats;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BookingError {
    #[error("Validation failed on {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    #[error("Interval overlaps reservation {} ({})", .0.id, .0.status)]
    Conflict(ReservationSummary),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
}

impl BookingError {
    pub(crate) fn missing(field: &'static str) -> Self {
        BookingError::Validation {
            field,
            reason: "is required".to_string(),
        }
    }
}
