use serde::Serialize;
use skywings_shared::models::{BookingEvent, SeatStatusChangedEvent};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// In-process fan-out of domain events to SSE subscribers and background listeners.
#[derive(Clone)]
pub struct EventBus {
    seats: broadcast::Sender<SeatStatusChangedEvent>,
    bookings: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (seats, _) = broadcast::channel(capacity);
        let (bookings, _) = broadcast::channel(capacity);
        Self { seats, bookings }
    }

    pub fn subscribe_seats(&self) -> broadcast::Receiver<SeatStatusChangedEvent> {
        self.seats.subscribe()
    }

    pub fn subscribe_bookings(&self) -> broadcast::Receiver<BookingEvent> {
        self.bookings.subscribe()
    }

    pub fn publish_seat(&self, event: SeatStatusChangedEvent) {
        log_publish("seat.status_changed", &event.flight_id.to_string(), &event);
        // No subscribers is fine
        let _ = self.seats.send(event);
    }

    pub fn publish_booking(&self, event: BookingEvent) {
        log_publish(event.kind.topic(), &event.booking_id.to_string(), &event);
        let _ = self.bookings.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

fn log_publish<T: Serialize>(topic: &str, key: &str, payload: &T) {
    info!("Published event to {}/{}", topic, key);
    if let Ok(json) = serde_json::to_string(payload) {
        debug!("{} payload: {}", topic, json);
    }
}
