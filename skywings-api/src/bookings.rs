use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use skywings_core::payment::{PaymentReceipt, PaymentRequest};
use skywings_core::search::BookingFilter;
use skywings_core::{Booking, BookingStatus, CoreError};
use skywings_order::{BookingQuote, BookingRequest, QuoteRequest};
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::auth::{require_admin, require_user, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub booking: BookingRequest,
    pub payment: PaymentRequest,
}

#[derive(Debug, Deserialize)]
pub struct CompletePaymentRequest {
    pub payment: PaymentRequest,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking: Booking,
    pub payment: PaymentReceipt,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub filter: BookingFilter,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<BookingStatus>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/api/bookings", get(list_all_bookings))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let user = Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/quote", post(quote))
        .route("/api/bookings/user", get(user_bookings))
        .route("/api/bookings/{id}", get(get_booking).delete(cancel_booking))
        .route("/api/bookings/{id}/complete-payment", post(complete_payment))
        .route_layer(from_fn_with_state(state, require_user));

    Router::new().merge(user).merge(admin)
}

async fn quote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<BookingQuote>, AppError> {
    let user = state
        .users
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| CoreError::not_found("User", claims.sub))?;
    Ok(Json(state.manager.quote(&user, &req).await?))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let (booking, payment) = state
        .manager
        .create_booking(claims.sub, req.booking, req.payment)
        .await?;
    Ok((StatusCode::CREATED, Json(BookingResponse { booking, payment })))
}

async fn user_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = state
        .manager
        .user_bookings(claims.sub, query.filter, Utc::now())
        .await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.manager.get_booking(id, &claims.requester()).await?))
}

async fn complete_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompletePaymentRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let (booking, payment) = state
        .manager
        .complete_payment(id, &claims.requester(), req.payment)
        .await?;
    Ok(Json(BookingResponse { booking, payment }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.manager.cancel_booking(id, &claims.requester()).await?))
}

async fn list_all_bookings(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.manager.all_bookings(query.status).await?))
}
