use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingCreatedEvent {
    pub reservation_id: Uuid,
    pub vehicle_id: Uuid,
    pub renter_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_amount: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingStatusChangedEvent {
    pub reservation_id: Uuid,
    pub vehicle_id: Uuid,
    pub from_status: String,
    pub to_status: String,
    pub forced: bool,
    pub timestamp: i64,
}

/// Everything the notification sink can be handed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    BookingCreated(BookingCreatedEvent),
    StatusChanged(BookingStatusChangedEvent),
}

impl BookingEvent {
    /// Topic suffix used by sinks that route per event kind.
    pub fn topic(&self) -> &'static str {
        match self {
            BookingEvent::BookingCreated(_) => "booking.created",
            BookingEvent::StatusChanged(_) => "booking.status_changed",
        }
    }

    pub fn reservation_id(&self) -> Uuid {
        match self {
            BookingEvent::BookingCreated(e) => e.reservation_id,
            BookingEvent::StatusChanged(e) => e.reservation_id,
        }
    }
}
