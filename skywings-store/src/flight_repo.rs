use async_trait::async_trait;
use skywings_core::repository::FlightRepository;
use skywings_core::{CoreError, CoreResult, Flight, Seat, SeatStatus};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

struct FlightRecord {
    flight: Flight,
    seats: Vec<Seat>,
}

impl FlightRecord {
    fn recount(&mut self) {
        self.flight.total_seats = self.seats.len() as u32;
        self.flight.available_seats = self.seats.iter().filter(|s| s.is_available()).count() as u32;
    }
}

/// Flights and seat maps held in process memory
#[derive(Default)]
pub struct MemoryFlightRepository {
    flights: RwLock<HashMap<Uuid, FlightRecord>>,
}

impl MemoryFlightRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn number_taken(records: &HashMap<Uuid, FlightRecord>, number: &str, except: Option<Uuid>) -> bool {
    records.values().any(|r| {
        Some(r.flight.id) != except && r.flight.flight_number.eq_ignore_ascii_case(number)
    })
}

#[async_trait]
impl FlightRepository for MemoryFlightRepository {
    async fn list_flights(&self) -> CoreResult<Vec<Flight>> {
        let flights = self.flights.read().await;
        let mut list: Vec<Flight> = flights.values().map(|r| r.flight.clone()).collect();
        list.sort_by_key(|f| f.departure_time);
        Ok(list)
    }

    async fn get_flight(&self, id: Uuid) -> CoreResult<Option<Flight>> {
        Ok(self.flights.read().await.get(&id).map(|r| r.flight.clone()))
    }

    async fn insert_flight(&self, flight: Flight, seats: Vec<Seat>) -> CoreResult<Flight> {
        let mut flights = self.flights.write().await;
        if number_taken(&flights, &flight.flight_number, None) {
            return Err(CoreError::Conflict(format!(
                "Flight number {} already exists",
                flight.flight_number
            )));
        }
        if seats.iter().any(|s| s.flight_id != flight.id) {
            return Err(CoreError::ValidationError("seat map belongs to another flight".into()));
        }

        let mut record = FlightRecord { flight, seats };
        record.recount();
        let stored = record.flight.clone();
        info!("Stored flight {} with {} seats", stored.flight_number, stored.total_seats);
        flights.insert(stored.id, record);
        Ok(stored)
    }

    async fn update_flight(&self, flight: Flight) -> CoreResult<Flight> {
        let mut flights = self.flights.write().await;
        if number_taken(&flights, &flight.flight_number, Some(flight.id)) {
            return Err(CoreError::Conflict(format!(
                "Flight number {} already exists",
                flight.flight_number
            )));
        }
        let record = flights
            .get_mut(&flight.id)
            .ok_or_else(|| CoreError::not_found("Flight", flight.id))?;
        record.flight = flight;
        record.recount();
        Ok(record.flight.clone())
    }

    async fn delete_flight(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.flights.write().await.remove(&id).is_some())
    }

    async fn seats_for_flight(&self, flight_id: Uuid) -> CoreResult<Vec<Seat>> {
        let flights = self.flights.read().await;
        let record = flights
            .get(&flight_id)
            .ok_or_else(|| CoreError::not_found("Flight", flight_id))?;
        let mut seats = record.seats.clone();
        seats.sort_by(|a, b| (a.row, &a.column).cmp(&(b.row, &b.column)));
        Ok(seats)
    }

    async fn get_seat(&self, flight_id: Uuid, seat_id: &str) -> CoreResult<Option<Seat>> {
        let flights = self.flights.read().await;
        Ok(flights
            .get(&flight_id)
            .and_then(|r| r.seats.iter().find(|s| s.id == seat_id).cloned()))
    }

    async fn transition_seat(
        &self,
        flight_id: Uuid,
        seat_id: &str,
        from: SeatStatus,
        to: SeatStatus,
    ) -> CoreResult<(Seat, u32)> {
        let mut flights = self.flights.write().await;
        let record = flights
            .get_mut(&flight_id)
            .ok_or_else(|| CoreError::not_found("Flight", flight_id))?;
        let seat = record
            .seats
            .iter_mut()
            .find(|s| s.id == seat_id)
            .ok_or_else(|| CoreError::not_found("Seat", seat_id))?;

        if seat.status != from {
            return Err(CoreError::Conflict(if from == SeatStatus::Available {
                "Seat is not available".to_string()
            } else {
                format!("Seat {} is {}, expected {}", seat.label(), seat.status.as_str(), from.as_str())
            }));
        }
        seat.status = to;
        let updated = seat.clone();
        record.recount();
        Ok((updated, record.flight.available_seats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use skywings_catalog::{generate_seat_map, CabinLayout};
    use skywings_core::NewFlight;
    use std::sync::Arc;

    fn new_flight(number: &str) -> Flight {
        let departure = Utc::now() + Duration::days(7);
        NewFlight {
            flight_number: number.into(),
            airline: "SkyWings".into(),
            origin: "Miami (MIA)".into(),
            destination: "Boston (BOS)".into(),
            departure_time: departure,
            arrival_time: departure + Duration::minutes(210),
            price_cents: 24900,
            aircraft: "Boeing 737-800".into(),
            status: None,
        }
        .into_flight()
    }

    async fn seeded(repo: &MemoryFlightRepository, number: &str) -> Flight {
        let flight = new_flight(number);
        let seats = generate_seat_map(flight.id, &CabinLayout::standard());
        repo.insert_flight(flight, seats).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_derives_seat_counts() {
        let repo = MemoryFlightRepository::new();
        let flight = seeded(&repo, "SW303").await;
        assert_eq!(flight.total_seats, 164);
        assert_eq!(flight.available_seats, 164);

        let err = repo
            .insert_flight(new_flight("sw303"), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = MemoryFlightRepository::new();
        let flight = seeded(&repo, "SW101").await;
        let seat_id = Seat::seat_id(flight.id, 12, "A");

        let (seat, available) = repo
            .transition_seat(flight.id, &seat_id, SeatStatus::Available, SeatStatus::Occupied)
            .await
            .unwrap();
        assert_eq!(seat.status, SeatStatus::Occupied);
        assert_eq!(available, 163);

        let err = repo
            .transition_seat(flight.id, &seat_id, SeatStatus::Available, SeatStatus::Blocked)
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Conflict("Seat is not available".into()));

        let stored = repo.get_flight(flight.id).await.unwrap().unwrap();
        assert_eq!(stored.available_seats, 163);
    }

    #[tokio::test]
    async fn test_concurrent_claims_have_single_winner() {
        let repo = Arc::new(MemoryFlightRepository::new());
        let flight = seeded(&repo, "SW202").await;
        let flight_id = flight.id;
        let seat_id = Seat::seat_id(flight_id, 1, "A");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            let seat_id = seat_id.clone();
            handles.push(tokio::spawn(async move {
                repo.transition_seat(flight_id, &seat_id, SeatStatus::Available, SeatStatus::Occupied)
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_seat_map() {
        let repo = MemoryFlightRepository::new();
        let mut flight = seeded(&repo, "SW404").await;
        flight.price_cents = 19900;
        let updated = repo.update_flight(flight.clone()).await.unwrap();
        assert_eq!(updated.price_cents, 19900);
        assert_eq!(updated.total_seats, 164);
        assert_eq!(repo.seats_for_flight(flight.id).await.unwrap().len(), 164);

        assert!(repo.delete_flight(flight.id).await.unwrap());
        assert!(!repo.delete_flight(flight.id).await.unwrap());
    }
}
