use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted whenever a seat changes status, carrying the flight's fresh availability.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SeatStatusChangedEvent {
    pub flight_id: Uuid,
    pub seat_id: String,
    pub seat_label: String,
    /// Serialized seat status (`AVAILABLE`, `OCCUPIED`, `BLOCKED`)
    pub status: String,
    pub available_seats: u32,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEventKind {
    Created,
    PaymentCompleted,
    Cancelled,
    Expired,
}

impl BookingEventKind {
    pub fn topic(&self) -> &'static str {
        match self {
            BookingEventKind::Created => "booking.created",
            BookingEventKind::PaymentCompleted => "booking.payment_completed",
            BookingEventKind::Cancelled => "booking.cancelled",
            BookingEventKind::Expired => "booking.expired",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub kind: BookingEventKind,
    pub total_cents: i64,
    pub occurred_at: DateTime<Utc>,
}
