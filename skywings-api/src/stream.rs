use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use uuid::Uuid;

use crate::{error::AppError, flights::load_flight, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/flights/{id}/seats/stream", get(seat_stream))
}

/// Live seat status changes for one flight.
async fn seat_stream(
    State(state): State<AppState>,
    Path(flight_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    load_flight(&state, flight_id).await?;
    let rx = state.events.subscribe_seats();
    tracing::debug!("Seat stream opened for flight {}", flight_id);

    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(event) if event.flight_id == flight_id => Event::default()
            .event("seat")
            .json_data(&event)
            .ok()
            .map(Ok::<_, Infallible>),
        Ok(_) => None,
        Err(e) => {
            // Lagged receivers skip ahead; clients re-fetch the seat map
            tracing::warn!("Seat stream for {} lagged: {}", flight_id, e);
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
