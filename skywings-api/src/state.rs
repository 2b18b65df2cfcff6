use std::sync::Arc;

use skywings_catalog::{BaggagePolicy, CabinLayout, FareCalculator};
use skywings_core::payment::{MockPaymentAdapter, PaymentAdapter};
use skywings_core::repository::{BookingRepository, FlightRepository, UserRepository};
use skywings_order::{BookingManager, BookingRules};
use skywings_store::app_config::BusinessRules;
use skywings_store::{EventBus, MemoryBookingRepository, MemoryFlightRepository, MemoryUserRepository};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub flights: Arc<dyn FlightRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub users: Arc<dyn UserRepository>,
    pub manager: Arc<BookingManager>,
    pub events: EventBus,
    pub layout: Arc<CabinLayout>,
    pub auth: AuthConfig,
    pub business_rules: BusinessRules,
}

impl AppState {
    /// Wire the in-memory repositories, mock payment gateway and event bus together.
    pub fn in_memory(auth: AuthConfig, business_rules: BusinessRules) -> Self {
        let flights: Arc<dyn FlightRepository> = Arc::new(MemoryFlightRepository::new());
        let bookings: Arc<dyn BookingRepository> = Arc::new(MemoryBookingRepository::new());
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
        let payments: Arc<dyn PaymentAdapter> = Arc::new(MockPaymentAdapter);
        let events = EventBus::default();

        let fares = FareCalculator::new(BaggagePolicy {
            free_weight_kg: business_rules.free_baggage_kg,
            extra_rate_cents: business_rules.extra_baggage_rate_cents,
            max_weight_kg: business_rules.max_baggage_kg,
        });
        let manager = BookingManager::new(
            flights.clone(),
            bookings.clone(),
            users.clone(),
            payments,
            events.clone(),
            fares,
            BookingRules::from(&business_rules),
        );

        Self {
            flights,
            bookings,
            users,
            manager: Arc::new(manager),
            events,
            layout: Arc::new(CabinLayout::standard()),
            auth,
            business_rules,
        }
    }
}
