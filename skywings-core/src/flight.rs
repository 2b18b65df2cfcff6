use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightStatus {
    Scheduled,
    Delayed,
    Cancelled,
    Boarding,
    Departed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: Uuid,
    pub flight_number: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub duration: String,
    pub price_cents: i64,
    pub total_seats: u32,
    pub available_seats: u32,
    pub aircraft: String,
    pub status: FlightStatus,
}

impl Flight {
    pub fn duration_minutes(&self) -> i64 {
        (self.arrival_time - self.departure_time).num_minutes()
    }

    /// Whether new bookings may be taken on this flight at `now`.
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, FlightStatus::Scheduled | FlightStatus::Delayed)
            && self.departure_time > now
    }

    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }

    /// Share of seats no longer available, 0.0 - 1.0.
    pub fn occupancy_rate(&self) -> f64 {
        if self.total_seats == 0 {
            return 0.0;
        }
        (self.total_seats - self.available_seats.min(self.total_seats)) as f64
            / self.total_seats as f64
    }

    /// Overwrite schedule and commercial fields from an admin update, keeping identity and seat counts.
    pub fn apply_update(&mut self, update: NewFlight) {
        self.flight_number = update.flight_number.trim().to_string();
        self.airline = update.airline.trim().to_string();
        self.origin = update.origin.trim().to_string();
        self.destination = update.destination.trim().to_string();
        self.departure_time = update.departure_time;
        self.arrival_time = update.arrival_time;
        self.duration = format_duration(update.departure_time, update.arrival_time);
        self.price_cents = update.price_cents;
        self.aircraft = update.aircraft.trim().to_string();
        if let Some(status) = update.status {
            self.status = status;
        }
    }
}

/// "{hours}h {minutes}m" between two instants.
pub fn format_duration(departure: DateTime<Utc>, arrival: DateTime<Utc>) -> String {
    let minutes = (arrival - departure).num_minutes().max(0);
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Admin input for creating or replacing a flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFlight {
    pub flight_number: String,
    pub airline: String,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub price_cents: i64,
    pub aircraft: String,
    #[serde(default)]
    pub status: Option<FlightStatus>,
}

impl NewFlight {
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("flight_number", &self.flight_number),
            ("airline", &self.airline),
            ("origin", &self.origin),
            ("destination", &self.destination),
            ("aircraft", &self.aircraft),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::ValidationError(format!("{} must not be blank", field)));
            }
        }
        if self.arrival_time <= self.departure_time {
            return Err(CoreError::ValidationError(
                "arrival_time must be after departure_time".to_string(),
            ));
        }
        if self.price_cents <= 0 {
            return Err(CoreError::ValidationError("price_cents must be positive".to_string()));
        }
        Ok(())
    }

    /// Build a flight with a fresh id. Seat counts start at zero until a seat map is attached.
    pub fn into_flight(self) -> Flight {
        Flight {
            id: Uuid::new_v4(),
            duration: format_duration(self.departure_time, self.arrival_time),
            flight_number: self.flight_number.trim().to_string(),
            airline: self.airline.trim().to_string(),
            origin: self.origin.trim().to_string(),
            destination: self.destination.trim().to_string(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
            price_cents: self.price_cents,
            total_seats: 0,
            available_seats: 0,
            aircraft: self.aircraft.trim().to_string(),
            status: self.status.unwrap_or(FlightStatus::Scheduled),
        }
    }
}
