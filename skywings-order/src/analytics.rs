use chrono::{DateTime, Utc};
use serde::Serialize;
use skywings_core::{Booking, BookingStatus, Flight, LoyaltyTier, User};
use std::collections::{BTreeMap, HashMap};

/// Headline numbers for the admin overview
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_flights: usize,
    /// Confirmed plus blocked
    pub active_bookings: usize,
    pub flights_today: usize,
    /// Money actually collected on bookings that still stand
    pub revenue_cents: i64,
    /// Balances still owed on blocked bookings
    pub outstanding_cents: i64,
}

impl DashboardStats {
    pub fn compute(flights: &[Flight], bookings: &[Booking], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        Self {
            total_flights: flights.len(),
            active_bookings: bookings.iter().filter(|b| b.is_active()).count(),
            flights_today: flights
                .iter()
                .filter(|f| f.departure_time.date_naive() == today)
                .count(),
            revenue_cents: bookings
                .iter()
                .filter(|b| b.is_active())
                .map(|b| b.paid_cents)
                .sum(),
            outstanding_cents: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Blocked)
                .map(|b| b.remaining_cents)
                .sum(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlySummary {
    /// `YYYY-MM`
    pub month: String,
    pub bookings: usize,
    pub revenue_cents: i64,
}

/// Bookings and collected revenue per booking month, oldest month first.
/// Cancelled bookings count toward volume but not revenue.
pub fn monthly_summary(bookings: &[Booking]) -> Vec<MonthlySummary> {
    let mut months: BTreeMap<String, (usize, i64)> = BTreeMap::new();
    for booking in bookings {
        let entry = months
            .entry(booking.booking_date.format("%Y-%m").to_string())
            .or_default();
        entry.0 += 1;
        if booking.is_active() {
            entry.1 += booking.paid_cents;
        }
    }
    months
        .into_iter()
        .map(|(month, (bookings, revenue_cents))| MonthlySummary {
            month,
            bookings,
            revenue_cents,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RouteStats {
    pub route: String,
    pub bookings: usize,
    pub revenue_cents: i64,
}

/// The `limit` busiest routes among non-cancelled bookings.
pub fn top_routes(flights: &[Flight], bookings: &[Booking], limit: usize) -> Vec<RouteStats> {
    let routes: HashMap<_, _> = flights.iter().map(|f| (f.id, f.route())).collect();
    let mut totals: HashMap<String, (usize, i64)> = HashMap::new();
    for booking in bookings.iter().filter(|b| b.is_active()) {
        let Some(route) = routes.get(&booking.flight_id) else {
            continue;
        };
        let entry = totals.entry(route.clone()).or_default();
        entry.0 += 1;
        entry.1 += booking.paid_cents;
    }

    let mut stats: Vec<RouteStats> = totals
        .into_iter()
        .map(|(route, (bookings, revenue_cents))| RouteStats {
            route,
            bookings,
            revenue_cents,
        })
        .collect();
    stats.sort_by(|a, b| b.bookings.cmp(&a.bookings).then_with(|| a.route.cmp(&b.route)));
    stats.truncate(limit);
    stats
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoyaltyShare {
    pub tier: LoyaltyTier,
    pub users: usize,
    /// Whole percent of all users
    pub percent: u32,
}

/// Member count per tier, every tier listed even when empty.
pub fn loyalty_distribution(users: &[User]) -> Vec<LoyaltyShare> {
    let total = users.len();
    LoyaltyTier::ALL
        .iter()
        .map(|&tier| {
            let count = users.iter().filter(|u| u.loyalty_tier == tier).count();
            let percent = if total == 0 {
                0
            } else {
                ((count * 100 + total / 2) / total) as u32
            };
            LoyaltyShare {
                tier,
                users: count,
                percent,
            }
        })
        .collect()
}

pub fn recent_bookings(bookings: &[Booking], limit: usize) -> Vec<Booking> {
    let mut recent = bookings.to_vec();
    recent.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
    recent.truncate(limit);
    recent
}
