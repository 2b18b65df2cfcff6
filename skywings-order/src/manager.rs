use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use skywings_catalog::{FareCalculator, FareQuote, PricingError};
use skywings_core::payment::{PaymentAdapter, PaymentReceipt, PaymentRequest};
use skywings_core::repository::{BookingRepository, FlightRepository, UserRepository};
use skywings_core::search::BookingFilter;
use skywings_core::{
    BaggageInfo, Booking, BookingStatus, CoreError, CoreResult, Flight, NewFlight, Role, Seat,
    SeatStatus, User,
};
use skywings_shared::models::{BookingEvent, BookingEventKind, SeatStatusChangedEvent};
use skywings_store::app_config::BusinessRules;
use skywings_store::EventBus;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Time windows applied to bookings
#[derive(Debug, Clone, Copy)]
pub struct BookingRules {
    /// Balance of a blocked booking is due this long before departure
    pub deposit_due: Duration,
    /// Cancellations are refused inside this window before departure
    pub cancellation_cutoff: Duration,
}

impl From<&BusinessRules> for BookingRules {
    fn from(rules: &BusinessRules) -> Self {
        Self {
            deposit_due: Duration::hours(rules.deposit_due_hours),
            cancellation_cutoff: Duration::hours(rules.cancellation_cutoff_hours),
        }
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            deposit_due: Duration::hours(48),
            cancellation_cutoff: Duration::hours(24),
        }
    }
}

/// Authenticated caller of a booking operation
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    pub user_id: Uuid,
    pub role: Role,
}

impl Requester {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    fn can_read(&self, booking: &Booking) -> bool {
        self.role == Role::Admin || booking.user_id == self.user_id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub flight_id: Uuid,
    pub seat_id: String,
    #[serde(default)]
    pub baggage_weight_kg: u32,
    #[serde(default)]
    pub is_blocking: bool,
}

/// Fare breakdown plus what would be charged now
#[derive(Debug, Clone, Serialize)]
pub struct BookingQuote {
    #[serde(flatten)]
    pub fare: FareQuote,
    pub amount_due_cents: i64,
    pub remaining_cents: i64,
    pub payment_due_date: Option<DateTime<Utc>>,
    pub points_earned: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub flight_id: Uuid,
    pub seat_id: String,
    pub passenger_name: String,
    #[serde(default)]
    pub baggage_weight_kg: u32,
    #[serde(default)]
    pub is_blocking: bool,
}

fn pricing_error(err: PricingError) -> CoreError {
    CoreError::ValidationError(err.to_string())
}

fn access_denied() -> CoreError {
    CoreError::Forbidden("Access denied".to_string())
}

/// Booking lifecycle: quote, purchase or block, settle, cancel, expire.
pub struct BookingManager {
    flights: Arc<dyn FlightRepository>,
    bookings: Arc<dyn BookingRepository>,
    users: Arc<dyn UserRepository>,
    payments: Arc<dyn PaymentAdapter>,
    events: EventBus,
    fares: FareCalculator,
    rules: BookingRules,
}

impl BookingManager {
    pub fn new(
        flights: Arc<dyn FlightRepository>,
        bookings: Arc<dyn BookingRepository>,
        users: Arc<dyn UserRepository>,
        payments: Arc<dyn PaymentAdapter>,
        events: EventBus,
        fares: FareCalculator,
        rules: BookingRules,
    ) -> Self {
        Self {
            flights,
            bookings,
            users,
            payments,
            events,
            fares,
            rules,
        }
    }

    pub fn fares(&self) -> &FareCalculator {
        &self.fares
    }

    async fn flight(&self, flight_id: Uuid) -> CoreResult<Flight> {
        self.flights
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Flight", flight_id))
    }

    async fn seat(&self, flight_id: Uuid, seat_id: &str) -> CoreResult<Seat> {
        self.flights
            .get_seat(flight_id, seat_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Seat", seat_id))
    }

    async fn user(&self, user_id: Uuid) -> CoreResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", user_id))
    }

    async fn booking(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Booking", booking_id))
    }

    fn price(
        &self,
        flight: &Flight,
        seat: &Seat,
        baggage_kg: u32,
        user: &User,
        is_blocking: bool,
        now: DateTime<Utc>,
    ) -> CoreResult<BookingQuote> {
        let fare = self
            .fares
            .quote(flight.price_cents, seat.upgrade_price_cents, baggage_kg, user.loyalty_tier)
            .map_err(pricing_error)?;
        let (amount_due_cents, remaining_cents, payment_due_date) = if is_blocking {
            let due = flight.departure_time - self.rules.deposit_due;
            if due <= now {
                return Err(CoreError::ValidationError(format!(
                    "Seats cannot be blocked less than {} hours before departure",
                    self.rules.deposit_due.num_hours()
                )));
            }
            let (paid, remaining) = FareCalculator::split_deposit(fare.total_cents);
            (paid, remaining, Some(due))
        } else {
            (fare.total_cents, 0, None)
        };
        Ok(BookingQuote {
            points_earned: FareCalculator::loyalty_points(fare.total_cents),
            fare,
            amount_due_cents,
            remaining_cents,
            payment_due_date,
        })
    }

    /// Price a seat and baggage choice for `user` without reserving anything.
    pub async fn quote(&self, user: &User, request: &QuoteRequest) -> CoreResult<BookingQuote> {
        let flight = self.flight(request.flight_id).await?;
        let seat = self.seat(flight.id, &request.seat_id).await?;
        self.price(&flight, &seat, request.baggage_weight_kg, user, request.is_blocking, Utc::now())
    }

    /// Apply an admin edit to a flight and carry a new departure time over to its bookings.
    pub async fn update_flight(&self, flight_id: Uuid, update: NewFlight) -> CoreResult<Flight> {
        update.validate()?;
        let mut flight = self.flight(flight_id).await?;
        let previous_departure = flight.departure_time;
        flight.apply_update(update);
        let flight = self.flights.update_flight(flight).await?;

        if flight.departure_time != previous_departure {
            let moved = self
                .bookings
                .reschedule_flight(flight.id, flight.departure_time, self.rules.deposit_due)
                .await?;
            info!(
                "Flight {} rescheduled to {}, {} bookings updated",
                flight.flight_number, flight.departure_time, moved
            );
        }
        Ok(flight)
    }

    fn publish_seat(&self, seat: &Seat, available_seats: u32, now: DateTime<Utc>) {
        self.events.publish_seat(SeatStatusChangedEvent {
            flight_id: seat.flight_id,
            seat_id: seat.id.clone(),
            seat_label: seat.label(),
            status: seat.status.as_str().to_string(),
            available_seats,
            changed_at: now,
        });
    }

    fn publish_booking(&self, booking: &Booking, kind: BookingEventKind, now: DateTime<Utc>) {
        self.events.publish_booking(BookingEvent {
            booking_id: booking.id,
            user_id: booking.user_id,
            flight_id: booking.flight_id,
            kind,
            total_cents: booking.total_cents,
            occurred_at: now,
        });
    }

    /// Book a seat, paying in full or blocking it with a deposit.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        request: BookingRequest,
        payment: PaymentRequest,
    ) -> CoreResult<(Booking, PaymentReceipt)> {
        let now = Utc::now();
        let passenger_name = request.passenger_name.trim().to_string();
        if passenger_name.is_empty() {
            return Err(CoreError::ValidationError("passenger_name must not be blank".into()));
        }

        let user = self.user(user_id).await?;
        let flight = self.flight(request.flight_id).await?;
        if !flight.is_bookable(now) {
            return Err(CoreError::ValidationError(format!(
                "Flight {} is not open for booking",
                flight.flight_number
            )));
        }
        let seat = self.seat(flight.id, &request.seat_id).await?;
        if !seat.is_available() {
            return Err(CoreError::Conflict("Seat is not available".into()));
        }
        let quote = self.price(&flight, &seat, request.baggage_weight_kg, &user, request.is_blocking, now)?;
        payment.validate(now)?;

        let held = if request.is_blocking { SeatStatus::Blocked } else { SeatStatus::Occupied };
        let (seat, available) = self
            .flights
            .transition_seat(flight.id, &seat.id, SeatStatus::Available, held)
            .await?;

        let receipt = match self.payments.charge(&payment, quote.amount_due_cents).await {
            Ok(receipt) => receipt,
            Err(e) => {
                // Hand the seat back before reporting the failed charge
                let (seat, available) = self
                    .flights
                    .transition_seat(flight.id, &seat.id, held, SeatStatus::Available)
                    .await?;
                self.publish_seat(&seat, available, now);
                return Err(e);
            }
        };

        let booking = Booking {
            id: Uuid::new_v4(),
            user_id,
            flight_id: flight.id,
            seat_id: seat.id.clone(),
            seat_label: seat.label(),
            passenger_name,
            booking_date: now,
            flight_date: flight.departure_time,
            status: if request.is_blocking { BookingStatus::Blocked } else { BookingStatus::Confirmed },
            total_cents: quote.fare.total_cents,
            paid_cents: quote.amount_due_cents,
            remaining_cents: quote.remaining_cents,
            baggage: BaggageInfo {
                weight_kg: quote.fare.baggage_weight_kg,
                extra_weight_kg: quote.fare.extra_baggage_kg,
                charges_cents: quote.fare.baggage_charges_cents,
            },
            discount_applied: quote.fare.discount_percent,
            payment_due_date: quote.payment_due_date,
            is_blocking: request.is_blocking,
            points_earned: quote.points_earned,
        };
        self.bookings.insert_booking(booking.clone()).await?;

        self.users.record_flight(user_id).await?;

        info!(
            "Booking {} created: flight {} seat {} ({:?}, {} of {} cents paid)",
            booking.id,
            flight.flight_number,
            booking.seat_label,
            booking.status,
            booking.paid_cents,
            booking.total_cents
        );
        self.publish_seat(&seat, available, now);
        self.publish_booking(&booking, BookingEventKind::Created, now);
        Ok((booking, receipt))
    }

    /// Pay the outstanding balance of a blocked booking.
    pub async fn complete_payment(
        &self,
        booking_id: Uuid,
        requester: &Requester,
        payment: PaymentRequest,
    ) -> CoreResult<(Booking, PaymentReceipt)> {
        let now = Utc::now();
        let booking = self.booking(booking_id).await?;
        if booking.user_id != requester.user_id {
            return Err(access_denied());
        }

        if booking.is_payment_overdue(now) {
            return Err(CoreError::ValidationError(
                "Payment due date has passed".to_string(),
            ));
        }

        let amount_due = booking.remaining_cents;
        let mut settled = booking.clone();
        settled.complete_payment()?;

        // Claim the seat before charging
        let (seat, available) = self
            .flights
            .transition_seat(booking.flight_id, &booking.seat_id, SeatStatus::Blocked, SeatStatus::Occupied)
            .await?;

        let receipt = match self.payments.charge(&payment, amount_due).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.flights
                    .transition_seat(booking.flight_id, &booking.seat_id, SeatStatus::Occupied, SeatStatus::Blocked)
                    .await?;
                return Err(e);
            }
        };
        self.bookings
            .update_booking(settled.clone(), BookingStatus::Blocked)
            .await?;

        info!("Booking {} paid in full ({} cents)", settled.id, amount_due);
        self.publish_seat(&seat, available, now);
        self.publish_booking(&settled, BookingEventKind::PaymentCompleted, now);
        Ok((settled, receipt))
    }

    /// Cancel a booking on its owner's request and release the seat.
    pub async fn cancel_booking(&self, booking_id: Uuid, requester: &Requester) -> CoreResult<Booking> {
        let now = Utc::now();
        let booking = self.booking(booking_id).await?;
        if booking.user_id != requester.user_id {
            return Err(access_denied());
        }

        let held = held_status(&booking);
        let mut cancelled = booking.clone();
        cancelled.cancel(now, self.rules.cancellation_cutoff)?;

        let (seat, available) = self
            .flights
            .transition_seat(booking.flight_id, &booking.seat_id, held, SeatStatus::Available)
            .await?;
        if let Err(e) = self.bookings.update_booking(cancelled.clone(), booking.status).await {
            self.flights
                .transition_seat(booking.flight_id, &booking.seat_id, SeatStatus::Available, held)
                .await?;
            return Err(e);
        }

        info!("Booking {} cancelled, seat {} released", cancelled.id, cancelled.seat_label);
        self.publish_seat(&seat, available, now);
        self.publish_booking(&cancelled, BookingEventKind::Cancelled, now);
        Ok(cancelled)
    }

    pub async fn get_booking(&self, booking_id: Uuid, requester: &Requester) -> CoreResult<Booking> {
        let booking = self.booking(booking_id).await?;
        if !requester.can_read(&booking) {
            return Err(access_denied());
        }
        Ok(booking)
    }

    /// A user's bookings, newest first, narrowed by `filter`.
    pub async fn user_bookings(
        &self,
        user_id: Uuid,
        filter: BookingFilter,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Booking>> {
        let bookings = self.bookings.list_for_user(user_id).await?;
        Ok(bookings.into_iter().filter(|b| filter.matches(b, now)).collect())
    }

    pub async fn all_bookings(&self, status: Option<BookingStatus>) -> CoreResult<Vec<Booking>> {
        self.bookings.list_all(status).await
    }

    /// Cancel blocked bookings whose balance is overdue. Returns how many expired.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> CoreResult<usize> {
        let overdue = self.bookings.list_overdue_blocked(now).await?;
        let mut expired = 0;

        for mut booking in overdue {
            booking.expire()?;
            // A seat no longer BLOCKED means the booking was paid or cancelled since the listing
            let (seat, available) = match self
                .flights
                .transition_seat(booking.flight_id, &booking.seat_id, SeatStatus::Blocked, SeatStatus::Available)
                .await
            {
                Ok(moved) => moved,
                Err(e) => {
                    warn!("Skipping expiry of booking {}: {}", booking.id, e);
                    continue;
                }
            };
            if let Err(e) = self
                .bookings
                .update_booking(booking.clone(), BookingStatus::Blocked)
                .await
            {
                warn!("Seat {} released but booking {} changed underneath: {}", booking.seat_label, booking.id, e);
                self.publish_seat(&seat, available, now);
                continue;
            }
            self.publish_seat(&seat, available, now);
            info!("Blocked booking {} expired unpaid", booking.id);
            self.publish_booking(&booking, BookingEventKind::Expired, now);
            expired += 1;
        }
        Ok(expired)
    }
}

fn held_status(booking: &Booking) -> SeatStatus {
    match booking.status {
        BookingStatus::Blocked => SeatStatus::Blocked,
        _ => SeatStatus::Occupied,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use skywings_catalog::{generate_seat_map, CabinLayout};
    use skywings_core::payment::{MockPaymentAdapter, PaymentMethod};
    use skywings_core::LoyaltyTier;
    use skywings_store::{MemoryBookingRepository, MemoryFlightRepository, MemoryUserRepository};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    pub(crate) struct Fixture {
        pub manager: Arc<BookingManager>,
        pub flights: Arc<MemoryFlightRepository>,
        pub bookings: Arc<MemoryBookingRepository>,
        pub users: Arc<MemoryUserRepository>,
        pub events: EventBus,
        pub user: User,
        pub flight: Flight,
    }

    pub(crate) fn paypal(amount_cents: i64) -> PaymentRequest {
        PaymentRequest {
            amount_cents,
            payment_method: PaymentMethod::Paypal,
            card_number: None,
            card_holder_name: None,
            expiry_date: None,
            cvv: None,
        }
    }

    pub(crate) async fn fixture_departing_in(hours: i64) -> Fixture {
        fixture_with_payments(hours, Arc::new(MockPaymentAdapter)).await
    }

    async fn fixture_with_payments(hours: i64, payments: Arc<dyn PaymentAdapter>) -> Fixture {
        let flights = Arc::new(MemoryFlightRepository::new());
        let bookings = Arc::new(MemoryBookingRepository::new());
        let users = Arc::new(MemoryUserRepository::new());
        let events = EventBus::default();

        let mut user = User::new("john@example.com", String::new(), "John", "Doe", Role::User);
        user.loyalty_tier = LoyaltyTier::Gold;
        user.total_flights = 24;
        users.insert_user(user.clone()).await.unwrap();

        let departure = Utc::now() + Duration::hours(hours);
        let flight = NewFlight {
            flight_number: "SW101".into(),
            airline: "SkyWings".into(),
            origin: "New York (JFK)".into(),
            destination: "Los Angeles (LAX)".into(),
            departure_time: departure,
            arrival_time: departure + Duration::minutes(330),
            price_cents: 29900,
            aircraft: "Boeing 737-800".into(),
            status: None,
        }
        .into_flight();
        let seats = generate_seat_map(flight.id, &CabinLayout::standard());
        let flight = flights.insert_flight(flight, seats).await.unwrap();

        let manager = BookingManager::new(
            flights.clone(),
            bookings.clone(),
            users.clone(),
            payments,
            events.clone(),
            FareCalculator::default(),
            BookingRules::default(),
        );
        let manager = Arc::new(manager);
        Fixture { manager, flights, bookings, users, events, user, flight }
    }

    fn request(f: &Fixture, seat: &str, is_blocking: bool) -> BookingRequest {
        BookingRequest {
            flight_id: f.flight.id,
            seat_id: Seat::seat_id(f.flight.id, 9, seat),
            passenger_name: "John Doe".into(),
            baggage_weight_kg: 25,
            is_blocking,
        }
    }

    #[tokio::test]
    async fn test_quote_applies_tier_and_deposit() {
        let f = fixture_departing_in(24 * 7).await;
        let mut req = QuoteRequest {
            flight_id: f.flight.id,
            seat_id: Seat::seat_id(f.flight.id, 9, "A"),
            baggage_weight_kg: 25,
            is_blocking: false,
        };
        let full = f.manager.quote(&f.user, &req).await.unwrap();
        // 299 + 0 + 2kg * 15 = 329, minus 10% = 296.10
        assert_eq!(full.fare.total_cents, 29610);
        assert_eq!(full.amount_due_cents, 29610);
        assert_eq!(full.points_earned, 2961);

        req.is_blocking = true;
        let blocked = f.manager.quote(&f.user, &req).await.unwrap();
        assert_eq!(blocked.amount_due_cents, 14805);
        assert_eq!(blocked.remaining_cents, 14805);
        assert_eq!(blocked.payment_due_date, Some(f.flight.departure_time - Duration::hours(48)));

        req.seat_id = "nope".into();
        assert!(matches!(f.manager.quote(&f.user, &req).await, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_full_booking_occupies_seat_and_counts_flight() {
        let f = fixture_departing_in(24 * 7).await;
        let mut seat_rx = f.events.subscribe_seats();
        let mut booking_rx = f.events.subscribe_bookings();

        let (booking, receipt) = f
            .manager
            .create_booking(f.user.id, request(&f, "A", false), paypal(29610))
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.paid_cents, 29610);
        assert_eq!(booking.remaining_cents, 0);
        assert_eq!(booking.discount_applied, 10);
        assert_eq!(booking.baggage.extra_weight_kg, 2);
        assert_eq!(receipt.amount_cents, 29610);

        let seat = f.flights.get_seat(f.flight.id, &booking.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Occupied);
        let flight = f.flights.get_flight(f.flight.id).await.unwrap().unwrap();
        assert_eq!(flight.available_seats, 163);

        // Already Gold, so only the count moves
        let user = f.users.get_user(f.user.id).await.unwrap().unwrap();
        assert_eq!(user.total_flights, 25);
        assert_eq!(user.loyalty_tier, LoyaltyTier::Gold);

        assert_eq!(seat_rx.recv().await.unwrap().status, "OCCUPIED");
        assert_eq!(booking_rx.recv().await.unwrap().kind, BookingEventKind::Created);
    }

    #[tokio::test]
    async fn test_taken_seat_and_wrong_amount() {
        let f = fixture_departing_in(24 * 7).await;
        f.manager
            .create_booking(f.user.id, request(&f, "A", false), paypal(29610))
            .await
            .unwrap();

        let err = f
            .manager
            .create_booking(f.user.id, request(&f, "A", false), paypal(29610))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Conflict("Seat is not available".into()));

        // A failed charge hands the seat back
        let err = f
            .manager
            .create_booking(f.user.id, request(&f, "B", false), paypal(100))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        let seat = f
            .flights
            .get_seat(f.flight.id, &Seat::seat_id(f.flight.id, 9, "B"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seat.status, SeatStatus::Available);
        assert_eq!(f.bookings.list_all(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_passenger_and_heavy_bag_rejected() {
        let f = fixture_departing_in(24 * 7).await;
        let mut req = request(&f, "A", false);
        req.passenger_name = "  ".into();
        assert!(matches!(
            f.manager.create_booking(f.user.id, req, paypal(1)).await,
            Err(CoreError::ValidationError(_))
        ));

        let mut req = request(&f, "A", false);
        req.baggage_weight_kg = 51;
        assert!(matches!(
            f.manager.create_booking(f.user.id, req, paypal(1)).await,
            Err(CoreError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_blocking_then_complete_payment() {
        let f = fixture_departing_in(24 * 7).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "C", true), paypal(14805))
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Blocked);
        assert!(booking.is_blocking);
        let seat = f.flights.get_seat(f.flight.id, &booking.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Blocked);

        let stranger = Requester::new(Uuid::new_v4(), Role::User);
        let err = f
            .manager
            .complete_payment(booking.id, &stranger, paypal(14805))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Forbidden("Access denied".into()));

        let owner = Requester::new(f.user.id, Role::User);
        let (paid, receipt) = f
            .manager
            .complete_payment(booking.id, &owner, paypal(14805))
            .await
            .unwrap();
        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert_eq!(paid.paid_cents, paid.total_cents);
        assert_eq!(paid.payment_due_date, None);
        assert_eq!(receipt.amount_cents, 14805);
        let seat = f.flights.get_seat(f.flight.id, &booking.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Occupied);

        let err = f
            .manager
            .complete_payment(booking.id, &owner, paypal(14805))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::ValidationError("Booking is not in blocked status".into()));
    }

    #[tokio::test]
    async fn test_cancel_releases_seat() {
        let f = fixture_departing_in(24 * 7).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "D", false), paypal(29610))
            .await
            .unwrap();
        let owner = Requester::new(f.user.id, Role::User);

        let cancelled = f.manager.cancel_booking(booking.id, &owner).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        let flight = f.flights.get_flight(f.flight.id).await.unwrap().unwrap();
        assert_eq!(flight.available_seats, 164);

        let err = f.manager.cancel_booking(booking.id, &owner).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let cancelled_tab = f
            .manager
            .user_bookings(f.user.id, BookingFilter::Cancelled, Utc::now())
            .await
            .unwrap();
        assert_eq!(cancelled_tab.len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_refused_close_to_departure() {
        let f = fixture_departing_in(12).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "E", false), paypal(29610))
            .await
            .unwrap();
        let owner = Requester::new(f.user.id, Role::User);
        let err = f.manager.cancel_booking(booking.id, &owner).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::ValidationError("Cannot cancel booking less than 24 hours before departure".into())
        );
    }

    #[tokio::test]
    async fn test_admin_may_read_any_booking() {
        let f = fixture_departing_in(24 * 7).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "F", false), paypal(29610))
            .await
            .unwrap();

        let admin = Requester::new(Uuid::new_v4(), Role::Admin);
        assert_eq!(f.manager.get_booking(booking.id, &admin).await.unwrap().id, booking.id);

        let stranger = Requester::new(Uuid::new_v4(), Role::User);
        assert!(matches!(
            f.manager.get_booking(booking.id, &stranger).await,
            Err(CoreError::Forbidden(_))
        ));
    }

    /// Counts charges and can park the next one until released.
    #[derive(Default)]
    struct GatedPayments {
        charges: AtomicUsize,
        hold_next: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PaymentAdapter for GatedPayments {
        async fn charge(&self, request: &PaymentRequest, amount_cents: i64) -> CoreResult<PaymentReceipt> {
            self.charges.fetch_add(1, Ordering::SeqCst);
            if self.hold_next.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            MockPaymentAdapter.charge(request, amount_cents).await
        }
    }

    fn moved_departure(flight: &Flight, departure: DateTime<Utc>) -> NewFlight {
        NewFlight {
            flight_number: flight.flight_number.clone(),
            airline: flight.airline.clone(),
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: departure,
            arrival_time: departure + Duration::minutes(330),
            price_cents: flight.price_cents,
            aircraft: flight.aircraft.clone(),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_expire_overdue_frees_blocked_seats() {
        let f = fixture_departing_in(24 * 7).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "A", true), paypal(14805))
            .await
            .unwrap();

        assert_eq!(f.manager.expire_overdue(Utc::now()).await.unwrap(), 0);

        let after_deadline = f.flight.departure_time - Duration::hours(47);
        assert_eq!(f.manager.expire_overdue(after_deadline).await.unwrap(), 1);
        let expired = f.bookings.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(expired.status, BookingStatus::Cancelled);
        let seat = f.flights.get_seat(f.flight.id, &booking.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Available);

        assert_eq!(f.manager.expire_overdue(after_deadline).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blocking_refused_inside_deposit_window() {
        // Departs in 30h, so the 48h balance deadline has already passed
        let f = fixture_departing_in(30).await;
        let err = f
            .manager
            .create_booking(f.user.id, request(&f, "A", true), paypal(14805))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::ValidationError("Seats cannot be blocked less than 48 hours before departure".into())
        );
        let seat = f
            .flights
            .get_seat(f.flight.id, &Seat::seat_id(f.flight.id, 9, "A"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seat.status, SeatStatus::Available);

        let req = QuoteRequest {
            flight_id: f.flight.id,
            seat_id: Seat::seat_id(f.flight.id, 9, "A"),
            baggage_weight_kg: 25,
            is_blocking: true,
        };
        assert!(matches!(f.manager.quote(&f.user, &req).await, Err(CoreError::ValidationError(_))));

        // Paying in full is still fine
        f.manager
            .create_booking(f.user.id, request(&f, "A", false), paypal(29610))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_balance_charge_keeps_seat_blocked() {
        let f = fixture_departing_in(24 * 7).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "B", true), paypal(14805))
            .await
            .unwrap();
        let owner = Requester::new(f.user.id, Role::User);

        let err = f.manager.complete_payment(booking.id, &owner, paypal(1)).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
        let seat = f.flights.get_seat(f.flight.id, &booking.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Blocked);
        let stored = f.bookings.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Blocked);

        f.manager.complete_payment(booking.id, &owner, paypal(14805)).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_completions_charge_once() {
        let payments = Arc::new(GatedPayments::default());
        let f = fixture_with_payments(24 * 7, payments.clone()).await;
        let (booking, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "C", true), paypal(14805))
            .await
            .unwrap();
        assert_eq!(payments.charges.load(Ordering::SeqCst), 1);

        payments.hold_next.store(true, Ordering::SeqCst);
        let owner = Requester::new(f.user.id, Role::User);
        let first = tokio::spawn({
            let manager = f.manager.clone();
            async move { manager.complete_payment(booking.id, &owner, paypal(14805)).await }
        });
        payments.entered.notified().await;

        // The first completion holds the seat while its charge is in flight
        let second = f.manager.complete_payment(booking.id, &owner, paypal(14805)).await;
        assert!(matches!(second, Err(CoreError::Conflict(_))));

        // Neither expiry nor cancellation can take the seat meanwhile
        let after_deadline = f.flight.departure_time - Duration::hours(47);
        assert_eq!(f.manager.expire_overdue(after_deadline).await.unwrap(), 0);
        assert!(matches!(
            f.manager.cancel_booking(booking.id, &owner).await,
            Err(CoreError::Conflict(_))
        ));

        payments.release.notify_one();
        let (paid, _) = first.await.unwrap().unwrap();
        assert_eq!(paid.status, BookingStatus::Confirmed);
        assert_eq!(payments.charges.load(Ordering::SeqCst), 2);

        let stored = f.bookings.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        let seat = f.flights.get_seat(f.flight.id, &booking.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Occupied);
    }

    #[tokio::test]
    async fn test_rescheduled_flight_moves_booking_deadlines() {
        let f = fixture_departing_in(24 * 7).await;
        let (confirmed, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "D", false), paypal(29610))
            .await
            .unwrap();
        let (blocked, _) = f
            .manager
            .create_booking(f.user.id, request(&f, "E", true), paypal(14805))
            .await
            .unwrap();

        let departure = Utc::now() + Duration::hours(6);
        let flight = f
            .manager
            .update_flight(f.flight.id, moved_departure(&f.flight, departure))
            .await
            .unwrap();
        assert_eq!(flight.departure_time, departure);

        let stored = f.bookings.get_booking(confirmed.id).await.unwrap().unwrap();
        assert_eq!(stored.flight_date, departure);
        let stored = f.bookings.get_booking(blocked.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_due_date, Some(departure - Duration::hours(48)));

        let owner = Requester::new(f.user.id, Role::User);
        let err = f.manager.cancel_booking(confirmed.id, &owner).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::ValidationError("Cannot cancel booking less than 24 hours before departure".into())
        );

        let err = f
            .manager
            .complete_payment(blocked.id, &owner, paypal(14805))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::ValidationError("Payment due date has passed".into()));
        let seat = f.flights.get_seat(f.flight.id, &blocked.seat_id).await.unwrap().unwrap();
        assert_eq!(seat.status, SeatStatus::Blocked);
    }
}
