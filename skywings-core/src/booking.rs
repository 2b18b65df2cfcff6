use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Blocked,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaggageInfo {
    pub weight_kg: u32,
    pub extra_weight_kg: u32,
    pub charges_cents: i64,
}

/// A purchased (or deposit-held) seat on a flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub flight_id: Uuid,
    pub seat_id: String,
    pub seat_label: String,
    pub passenger_name: String,
    pub booking_date: DateTime<Utc>,
    /// Departure time of the booked flight
    pub flight_date: DateTime<Utc>,
    pub status: BookingStatus,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub remaining_cents: i64,
    pub baggage: BaggageInfo,
    /// Loyalty discount, in percent
    pub discount_applied: u32,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub is_blocking: bool,
    pub points_earned: i64,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.flight_date > now
    }

    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.flight_date < now
    }

    pub fn is_payment_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == BookingStatus::Blocked
            && self.payment_due_date.map(|due| due < now).unwrap_or(false)
    }

    /// Blocked -> Confirmed once the remaining balance is paid.
    pub fn complete_payment(&mut self) -> CoreResult<()> {
        if self.status != BookingStatus::Blocked {
            return Err(CoreError::ValidationError(
                "Booking is not in blocked status".to_string(),
            ));
        }
        self.paid_cents = self.total_cents;
        self.remaining_cents = 0;
        self.payment_due_date = None;
        self.status = BookingStatus::Confirmed;
        Ok(())
    }

    /// Cancel on the passenger's request. Refused inside `cutoff` of departure.
    pub fn cancel(&mut self, now: DateTime<Utc>, cutoff: Duration) -> CoreResult<()> {
        if self.status == BookingStatus::Cancelled {
            return Err(CoreError::Conflict("Booking is already cancelled".to_string()));
        }
        if self.flight_date < now + cutoff {
            return Err(CoreError::ValidationError(format!(
                "Cannot cancel booking less than {} hours before departure",
                cutoff.num_hours()
            )));
        }
        self.status = BookingStatus::Cancelled;
        Ok(())
    }

    /// Cancel a blocked booking whose deposit balance was never paid.
    pub fn expire(&mut self) -> CoreResult<()> {
        if self.status != BookingStatus::Blocked {
            return Err(CoreError::Conflict(format!(
                "Booking {} is not blocked",
                self.id
            )));
        }
        self.status = BookingStatus::Cancelled;
        Ok(())
    }
}
