use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use skywings_catalog::{generate_seat_map, SeatInventory};
use skywings_core::search::{FlightSearchRequest, FlightSearchResult};
use skywings_core::{CoreError, Flight, NewFlight, Seat};
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::require_admin, state::AppState};

#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub flight_id: Uuid,
    pub seats: Vec<Seat>,
    pub inventory: SeatInventory,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/api/flights", post(create_flight))
        .route("/api/flights/{id}", put(update_flight).delete(delete_flight))
        .route_layer(from_fn_with_state(state, require_admin));

    Router::new()
        .route("/api/flights", get(list_flights))
        .route("/api/flights/search", post(search_flights))
        .route("/api/flights/{id}", get(get_flight))
        .route("/api/flights/{id}/seats", get(get_seats))
        .merge(admin)
}

pub(crate) async fn load_flight(state: &AppState, id: Uuid) -> Result<Flight, AppError> {
    Ok(state
        .flights
        .get_flight(id)
        .await?
        .ok_or_else(|| CoreError::not_found("Flight", id))?)
}

async fn list_flights(State(state): State<AppState>) -> Result<Json<Vec<Flight>>, AppError> {
    Ok(Json(state.flights.list_flights().await?))
}

async fn search_flights(
    State(state): State<AppState>,
    Json(req): Json<FlightSearchRequest>,
) -> Result<Json<FlightSearchResult>, AppError> {
    req.validate()?;
    let flights = state.flights.list_flights().await?;
    let result = req.search(&flights);
    tracing::debug!(
        "Search {:?} -> {:?}: {} outbound, {:?} inbound",
        req.origin,
        req.destination,
        result.outbound.len(),
        result.inbound.as_ref().map(Vec::len)
    );
    Ok(Json(result))
}

async fn get_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Flight>, AppError> {
    Ok(Json(load_flight(&state, id).await?))
}

async fn get_seats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let seats = state.flights.seats_for_flight(id).await?;
    Ok(Json(SeatMapResponse {
        flight_id: id,
        inventory: SeatInventory::from_seats(&seats),
        seats,
    }))
}

async fn create_flight(
    State(state): State<AppState>,
    Json(req): Json<NewFlight>,
) -> Result<(StatusCode, Json<Flight>), AppError> {
    req.validate()?;
    let flight = req.into_flight();
    let seats = generate_seat_map(flight.id, &state.layout);
    let flight = state.flights.insert_flight(flight, seats).await?;
    tracing::info!("Admin created flight {} ({})", flight.flight_number, flight.route());
    Ok((StatusCode::CREATED, Json(flight)))
}

async fn update_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<NewFlight>,
) -> Result<Json<Flight>, AppError> {
    let flight = state.manager.update_flight(id, req).await?;
    tracing::info!("Admin updated flight {}", flight.flight_number);
    Ok(Json(flight))
}

async fn delete_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let flight = load_flight(&state, id).await?;
    let bookings = state.bookings.list_for_flight(id).await?;
    if bookings.iter().any(|b| b.is_active()) {
        return Err(AppError::ConflictError(format!(
            "Flight {} has active bookings and cannot be deleted",
            flight.flight_number
        )));
    }
    state.flights.delete_flight(id).await?;
    tracing::info!("Admin deleted flight {}", flight.flight_number);
    Ok(StatusCode::NO_CONTENT)
}
