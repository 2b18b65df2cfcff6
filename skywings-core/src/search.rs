use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::{Booking, BookingStatus};
use crate::flight::{Flight, FlightStatus};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Price,
    Time,
    Duration,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightSearchRequest {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<NaiveDate>,
    /// Set for round trips: the reverse route is searched on this date
    pub return_date: Option<NaiveDate>,
    pub passengers: Option<u32>,
    pub min_price_cents: Option<i64>,
    pub max_price_cents: Option<i64>,
    #[serde(default)]
    pub sort_by: SortBy,
}

#[derive(Debug, Serialize)]
pub struct FlightSearchResult {
    pub outbound: Vec<Flight>,
    pub inbound: Option<Vec<Flight>>,
}

fn contains_ignore_case(haystack: &str, needle: &Option<String>) -> bool {
    match needle.as_deref().map(str::trim) {
        None | Some("") => true,
        Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
    }
}

impl FlightSearchRequest {
    pub fn validate(&self) -> CoreResult<()> {
        if self.passengers == Some(0) {
            return Err(CoreError::ValidationError("passengers must be at least 1".into()));
        }
        if let (Some(min), Some(max)) = (self.min_price_cents, self.max_price_cents) {
            if min > max {
                return Err(CoreError::ValidationError(
                    "min_price_cents must not exceed max_price_cents".into(),
                ));
            }
        }
        if let (Some(out), Some(back)) = (self.departure_date, self.return_date) {
            if back < out {
                return Err(CoreError::ValidationError(
                    "return_date must not be before departure_date".into(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, flight: &Flight) -> bool {
        matches!(flight.status, FlightStatus::Scheduled | FlightStatus::Delayed)
            && contains_ignore_case(&flight.origin, &self.origin)
            && contains_ignore_case(&flight.destination, &self.destination)
            && self
                .departure_date
                .map(|d| flight.departure_time.date_naive() == d)
                .unwrap_or(true)
            && flight.available_seats >= self.passengers.unwrap_or(1)
            && self.min_price_cents.map(|min| flight.price_cents >= min).unwrap_or(true)
            && self.max_price_cents.map(|max| flight.price_cents <= max).unwrap_or(true)
    }

    pub fn sort(&self, flights: &mut [Flight]) {
        match self.sort_by {
            SortBy::Price => flights.sort_by_key(|f| (f.price_cents, f.departure_time)),
            SortBy::Time => flights.sort_by_key(|f| f.departure_time),
            SortBy::Duration => flights.sort_by_key(|f| (f.duration_minutes(), f.departure_time)),
        }
    }

    /// The reverse leg of a round trip, if a return date was given.
    pub fn return_leg(&self) -> Option<FlightSearchRequest> {
        self.return_date.map(|date| FlightSearchRequest {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            departure_date: Some(date),
            return_date: None,
            ..self.clone()
        })
    }

    /// Filter and sort a flight list for one leg.
    pub fn apply(&self, flights: &[Flight]) -> Vec<Flight> {
        let mut found: Vec<Flight> = flights.iter().filter(|f| self.matches(f)).cloned().collect();
        self.sort(&mut found);
        found
    }

    pub fn search(&self, flights: &[Flight]) -> FlightSearchResult {
        FlightSearchResult {
            outbound: self.apply(flights),
            inbound: self.return_leg().map(|leg| leg.apply(flights)),
        }
    }
}

/// Booking history tabs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingFilter {
    #[default]
    All,
    Upcoming,
    Past,
    Cancelled,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking, now: DateTime<Utc>) -> bool {
        match self {
            BookingFilter::All => true,
            BookingFilter::Upcoming => booking.is_upcoming(now),
            BookingFilter::Past => booking.is_past(now),
            BookingFilter::Cancelled => booking.status == BookingStatus::Cancelled,
        }
    }
}

/// Admin flight table filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightFilter {
    pub q: Option<String>,
    pub status: Option<FlightStatus>,
}

impl FlightFilter {
    pub fn matches(&self, flight: &Flight) -> bool {
        let text = contains_ignore_case(&flight.flight_number, &self.q)
            || contains_ignore_case(&flight.origin, &self.q)
            || contains_ignore_case(&flight.destination, &self.q);
        text && self.status.map(|s| flight.status == s).unwrap_or(true)
    }
}
