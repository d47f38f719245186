use drivehub_shared::BookingEvent;

/// Fire-and-forget delivery of booking events. Implementations must return without
/// waiting on the network and must swallow (and log) their own failures: a lost
/// notification never undoes a booking.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, event: BookingEvent);
}

/// Drops every event. Useful where nobody listens.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn publish(&self, event: BookingEvent) {
        tracing::debug!(reservation_id = %event.reservation_id(), topic = event.topic(), "Notification dropped");
    }
}
