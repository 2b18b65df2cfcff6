pub mod booking;
pub mod flight;
pub mod payment;
pub mod repository;
pub mod search;
pub mod seat;
pub mod user;

pub use booking::{BaggageInfo, Booking, BookingStatus};
pub use flight::{Flight, FlightStatus, NewFlight};
pub use seat::{Seat, SeatClass, SeatStatus};
pub use user::{LoyaltyTier, Role, User};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        CoreError::NotFound(format!("{} not found with id: {}", what, id))
    }
}
