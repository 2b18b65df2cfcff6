pub mod seatmap;
pub mod pricing;
pub mod inventory;

pub use seatmap::{CabinLayout, CabinSection, generate_seat_map, apply_random_occupancy};
pub use pricing::{BaggagePolicy, FareCalculator, FareQuote, PricingError};
pub use inventory::SeatInventory;
