pub mod events;

pub use events::{BookingEvent, BookingEventKind, SeatStatusChangedEvent};
