use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatClass {
    Economy,
    Business,
    First,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Occupied,
    /// Held by a deposit-only booking
    Blocked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Occupied => "OCCUPIED",
            SeatStatus::Blocked => "BLOCKED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub flight_id: Uuid,
    pub row: u32,
    pub column: String,
    pub class: SeatClass,
    pub upgrade_price_cents: i64,
    pub status: SeatStatus,
    #[serde(default)]
    pub features: Vec<String>,
}

impl Seat {
    pub fn seat_id(flight_id: Uuid, row: u32, column: &str) -> String {
        format!("{}-{}{}", flight_id, row, column)
    }

    /// Passenger-facing label, e.g. "12A".
    pub fn label(&self) -> String {
        format!("{}{}", self.row, self.column)
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_identity() {
        let flight_id = Uuid::new_v4();
        let seat = Seat {
            id: Seat::seat_id(flight_id, 12, "A"),
            flight_id,
            row: 12,
            column: "A".into(),
            class: SeatClass::Economy,
            upgrade_price_cents: 0,
            status: SeatStatus::Available,
            features: vec![],
        };
        assert_eq!(seat.label(), "12A");
        assert_eq!(seat.id, format!("{}-12A", flight_id));
        assert!(seat.is_available());
    }
}
