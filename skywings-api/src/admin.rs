use axum::{
    extract::{Query, State},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use skywings_core::search::FlightFilter;
use skywings_core::{Booking, Flight};
use skywings_order::analytics::{
    loyalty_distribution, monthly_summary, recent_bookings, top_routes, DashboardStats,
    LoyaltyShare, MonthlySummary, RouteStats,
};

use crate::{error::AppError, middleware::auth::require_admin, state::AppState};

const RECENT_BOOKINGS: usize = 10;
const TOP_ROUTES: usize = 5;

#[derive(Debug, Serialize)]
pub struct Overview {
    pub stats: DashboardStats,
    pub recent_bookings: Vec<Booking>,
}

#[derive(Debug, Serialize)]
pub struct Analytics {
    pub monthly: Vec<MonthlySummary>,
    pub top_routes: Vec<RouteStats>,
    pub loyalty_distribution: Vec<LoyaltyShare>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/overview", get(overview))
        .route("/api/admin/analytics", get(analytics))
        .route("/api/admin/flights", get(flights))
        .route_layer(from_fn_with_state(state, require_admin))
}

async fn overview(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Overview>, AppError> {
    let flights = state.flights.list_flights().await?;
    let bookings = state.bookings.list_all(None).await?;

    Ok(Json(Overview {
        stats: DashboardStats::compute(&flights, &bookings, Utc::now()),
        recent_bookings: recent_bookings(&bookings, query.limit.unwrap_or(RECENT_BOOKINGS)),
    }))
}

async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Analytics>, AppError> {
    let flights = state.flights.list_flights().await?;
    let bookings = state.bookings.list_all(None).await?;
    let users = state.users.list_users().await?;

    Ok(Json(Analytics {
        monthly: monthly_summary(&bookings),
        top_routes: top_routes(&flights, &bookings, query.limit.unwrap_or(TOP_ROUTES)),
        loyalty_distribution: loyalty_distribution(&users),
    }))
}

async fn flights(
    State(state): State<AppState>,
    Query(filter): Query<FlightFilter>,
) -> Result<Json<Vec<Flight>>, AppError> {
    let flights = state.flights.list_flights().await?;
    Ok(Json(flights.into_iter().filter(|f| filter.matches(f)).collect()))
}
