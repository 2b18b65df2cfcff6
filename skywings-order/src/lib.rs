pub mod analytics;
pub mod manager;

pub use analytics::{DashboardStats, LoyaltyShare, MonthlySummary, RouteStats};
pub use manager::{BookingManager, BookingQuote, BookingRequest, BookingRules, QuoteRequest, Requester};
