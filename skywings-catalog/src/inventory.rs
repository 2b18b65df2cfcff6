use serde::{Deserialize, Serialize};
use skywings_core::{Seat, SeatClass, SeatStatus};

/// Availability for one cabin class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassAvailability {
    pub class: SeatClass,
    pub total: u32,
    pub available: u32,
    pub upgrade_price_cents: i64,
}

/// Occupancy summary of a flight's seat map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeatInventory {
    pub total: u32,
    pub available: u32,
    pub occupied: u32,
    pub blocked: u32,
    pub occupancy_rate: f64,
    pub by_class: Vec<ClassAvailability>,
}

impl SeatInventory {
    pub fn from_seats(seats: &[Seat]) -> Self {
        let count = |status: SeatStatus| seats.iter().filter(|s| s.status == status).count() as u32;
        let total = seats.len() as u32;
        let available = count(SeatStatus::Available);

        let mut by_class: Vec<ClassAvailability> = Vec::new();
        for seat in seats {
            let idx = match by_class.iter().position(|c| c.class == seat.class) {
                Some(idx) => idx,
                None => {
                    by_class.push(ClassAvailability {
                        class: seat.class,
                        total: 0,
                        available: 0,
                        upgrade_price_cents: seat.upgrade_price_cents,
                    });
                    by_class.len() - 1
                }
            };
            by_class[idx].total += 1;
            if seat.is_available() {
                by_class[idx].available += 1;
            }
        }

        Self {
            total,
            available,
            occupied: count(SeatStatus::Occupied),
            blocked: count(SeatStatus::Blocked),
            occupancy_rate: if total == 0 {
                0.0
            } else {
                1.0 - (available as f64 / total as f64)
            },
            by_class,
        }
    }
}
