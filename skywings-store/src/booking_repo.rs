use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use skywings_core::repository::BookingRepository;
use skywings_core::{Booking, BookingStatus, CoreError, CoreResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryBookingRepository {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, keep: F) -> Vec<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        let bookings = self.bookings.read().await;
        let mut list: Vec<Booking> = bookings.values().filter(|b| keep(b)).cloned().collect();
        list.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        list
    }
}

#[async_trait]
impl BookingRepository for MemoryBookingRepository {
    async fn insert_booking(&self, booking: Booking) -> CoreResult<()> {
        let mut bookings = self.bookings.write().await;
        if bookings.contains_key(&booking.id) {
            return Err(CoreError::Conflict(format!("Booking {} already exists", booking.id)));
        }
        bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> CoreResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn update_booking(&self, booking: Booking, expected: BookingStatus) -> CoreResult<()> {
        let mut bookings = self.bookings.write().await;
        let existing = bookings
            .get_mut(&booking.id)
            .ok_or_else(|| CoreError::not_found("Booking", booking.id))?;
        if existing.status != expected {
            return Err(CoreError::Conflict(format!(
                "Booking {} is {:?}, expected {:?}",
                booking.id, existing.status, expected
            )));
        }
        *existing = booking;
        Ok(())
    }

    async fn reschedule_flight(
        &self,
        flight_id: Uuid,
        departure: DateTime<Utc>,
        deposit_due: Duration,
    ) -> CoreResult<usize> {
        let mut bookings = self.bookings.write().await;
        let mut touched = 0;
        for booking in bookings.values_mut().filter(|b| b.flight_id == flight_id) {
            booking.flight_date = departure;
            if booking.status == BookingStatus::Blocked {
                booking.payment_due_date = Some(departure - deposit_due);
            }
            touched += 1;
        }
        Ok(touched)
    }

    async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(self.collect(|b| b.user_id == user_id).await)
    }

    async fn list_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(self.collect(|b| b.flight_id == flight_id).await)
    }

    async fn list_all(&self, status: Option<BookingStatus>) -> CoreResult<Vec<Booking>> {
        Ok(self
            .collect(|b| status.map(|s| b.status == s).unwrap_or(true))
            .await)
    }

    async fn list_overdue_blocked(&self, now: DateTime<Utc>) -> CoreResult<Vec<Booking>> {
        Ok(self.collect(|b| b.is_payment_overdue(now)).await)
    }
}
