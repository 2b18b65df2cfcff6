use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::booking::{Booking, BookingStatus};
use crate::flight::Flight;
use crate::seat::{Seat, SeatStatus};
use crate::user::User;
use crate::CoreResult;

/// Repository trait for flights and the seat map that belongs to each flight
#[async_trait]
pub trait FlightRepository: Send + Sync {
    async fn list_flights(&self) -> CoreResult<Vec<Flight>>;

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>>;

    /// Store a new flight with its seat map. Seat counts on the flight are
    /// derived from `seats`. Duplicate flight numbers are a conflict.
    async fn insert_flight(&self, flight: Flight, seats: Vec<Seat>) -> CoreResult<Flight>;

    /// Replace schedule/commercial fields; the seat map is untouched.
    async fn update_flight(&self, flight: Flight) -> CoreResult<Flight>;

    async fn delete_flight(&self, id: Uuid) -> CoreResult<bool>;

    /// Seats ordered by row, then column.
    async fn seats_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Seat>>;

    async fn get_seat(&self, flight_id: Uuid, seat_id: &str) -> CoreResult<Option<Seat>>;

    /// Compare-and-set a seat's status. Fails with a conflict when the seat is
    /// not currently in `from`. Returns the updated seat and the flight's new
    /// available seat count.
    async fn transition_seat(
        &self,
        flight_id: Uuid,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
    ) -> CoreResult<(Seat, u32)>;
}

/// Repository trait for bookings
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: Booking) -> CoreResult<()>;

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>>;

    /// Replace a booking only if its stored status is still `expected`.
    /// Fails with a conflict otherwise.
    async fn update_booking(&self, booking: Booking, expected: BookingStatus) -> CoreResult<()>;

    /// Move every booking on a flight to a new departure time. Blocked bookings
    /// get a due date of `departure - deposit_due`. Returns how many were touched.
    async fn reschedule_flight(
        &self,
        flight_id: Uuid,
        departure: DateTime<Utc>,
        deposit_due: Duration,
    ) -> CoreResult<usize>;

    /// Newest first.
    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>>;

    async fn list_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Booking>>;

    /// Newest first, optionally restricted to one status.
    async fn list_all(&self, status: Option<BookingStatus>) -> CoreResult<Vec<Booking>>;

    /// Blocked bookings whose payment due date is before `now`.
    async fn list_overdue_blocked(&self, now: DateTime<Utc>) -> CoreResult<Vec<Booking>>;
}

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: User) -> CoreResult<()>;

    async fn get_user(&self, id: Uuid) -> CoreResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    /// Count one more flight for the user and promote their tier, atomically.
    async fn record_flight(&self, user_id: Uuid) -> CoreResult<User>;

    async fn list_users(&self) -> CoreResult<Vec<User>>;
}
