pub mod app_config;
pub mod booking_repo;
pub mod credentials;
pub mod events;
pub mod flight_repo;
pub mod seed;
pub mod user_repo;

pub use booking_repo::MemoryBookingRepository;
pub use events::EventBus;
pub use flight_repo::MemoryFlightRepository;
pub use user_repo::MemoryUserRepository;
