pub mod models;
pub mod pii;

pub use models::events::{BookingCreatedEvent, BookingEvent, BookingStatusChangedEvent};
pub use pii::Masked;
