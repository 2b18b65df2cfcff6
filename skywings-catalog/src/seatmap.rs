use rand::Rng;
use serde::{Deserialize, Serialize};
use skywings_core::{Seat, SeatClass, SeatStatus};
use uuid::Uuid;

/// A contiguous block of rows sharing a class, column set and upgrade price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabinSection {
    pub class: SeatClass,
    pub first_row: u32,
    pub last_row: u32,
    pub columns: Vec<String>,
    pub upgrade_price_cents: i64,
    pub features: Vec<String>,
    /// Chance that a demo seat in this section starts out occupied
    pub demo_occupancy: f64,
}

impl CabinSection {
    pub fn capacity(&self) -> u32 {
        (self.last_row + 1).saturating_sub(self.first_row) * self.columns.len() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CabinLayout {
    pub sections: Vec<CabinSection>,
}

fn columns(n: usize) -> Vec<String> {
    ('A'..='Z').take(n).map(String::from).collect()
}

fn features(list: &[&str]) -> Vec<String> {
    list.iter().map(|f| f.to_string()).collect()
}

impl CabinLayout {
    /// Narrow-body layout: first rows 1-3 (4 abreast), business rows 4-8 (4 abreast),
    /// economy rows 9-30 (6 abreast).
    pub fn standard() -> Self {
        Self {
            sections: vec![
                CabinSection {
                    class: SeatClass::First,
                    first_row: 1,
                    last_row: 3,
                    columns: columns(4),
                    upgrade_price_cents: 15000,
                    features: features(&["Extra legroom", "Priority boarding", "Complimentary meal"]),
                    demo_occupancy: 0.3,
                },
                CabinSection {
                    class: SeatClass::Business,
                    first_row: 4,
                    last_row: 8,
                    columns: columns(4),
                    upgrade_price_cents: 7500,
                    features: features(&["Extra legroom", "Priority boarding"]),
                    demo_occupancy: 0.4,
                },
                CabinSection {
                    class: SeatClass::Economy,
                    first_row: 9,
                    last_row: 30,
                    columns: columns(6),
                    upgrade_price_cents: 0,
                    features: Vec::new(),
                    demo_occupancy: 0.6,
                },
            ],
        }
    }

    pub fn capacity(&self) -> u32 {
        self.sections.iter().map(CabinSection::capacity).sum()
    }

    fn section_for(&self, class: SeatClass) -> Option<&CabinSection> {
        self.sections.iter().find(|s| s.class == class)
    }
}

impl Default for CabinLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Every seat of the layout for one flight, all available, ordered by row then column.
pub fn generate_seat_map(flight_id: Uuid, layout: &CabinLayout) -> Vec<Seat> {
    let mut seats = Vec::with_capacity(layout.capacity() as usize);
    for section in &layout.sections {
        for row in section.first_row..=section.last_row {
            for column in &section.columns {
                seats.push(Seat {
                    id: Seat::seat_id(flight_id, row, column),
                    flight_id,
                    row,
                    column: column.clone(),
                    class: section.class,
                    upgrade_price_cents: section.upgrade_price_cents,
                    status: SeatStatus::Available,
                    features: section.features.clone(),
                });
            }
        }
    }
    seats.sort_by(|a, b| (a.row, &a.column).cmp(&(b.row, &b.column)));
    seats
}

/// Mark demo seats occupied using each section's occupancy probability.
pub fn apply_random_occupancy<R: Rng + ?Sized>(seats: &mut [Seat], layout: &CabinLayout, rng: &mut R) {
    for seat in seats.iter_mut() {
        let p = layout
            .section_for(seat.class)
            .map(|s| s.demo_occupancy)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);
        if rng.gen_bool(p) {
            seat.status = SeatStatus::Occupied;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_standard_layout_shape() {
        let flight_id = Uuid::new_v4();
        let layout = CabinLayout::standard();
        let seats = generate_seat_map(flight_id, &layout);

        assert_eq!(layout.capacity(), 164);
        assert_eq!(seats.len(), 164);
        assert_eq!(seats[0].label(), "1A");
        assert_eq!(seats.last().unwrap().label(), "30F");
        assert!(seats.iter().all(|s| s.is_available()));

        let first: Vec<_> = seats.iter().filter(|s| s.class == SeatClass::First).collect();
        assert_eq!(first.len(), 12);
        assert!(first.iter().all(|s| s.upgrade_price_cents == 15000 && s.features.len() == 3));

        let business = seats.iter().filter(|s| s.class == SeatClass::Business).count();
        assert_eq!(business, 20);
        let row9: Vec<_> = seats.iter().filter(|s| s.row == 9).map(|s| s.column.as_str()).collect();
        assert_eq!(row9, vec!["A", "B", "C", "D", "E", "F"]);
        assert_eq!(seats.iter().find(|s| s.row == 9).unwrap().class, SeatClass::Economy);
    }

    #[test]
    fn test_wide_rows_get_letters_past_f() {
        assert_eq!(columns(8), vec!["A", "B", "C", "D", "E", "F", "G", "H"]);
        assert_eq!(columns(0).len(), 0);
        assert_eq!(columns(40).len(), 26);
    }

    #[test]
    fn test_random_occupancy_is_seeded() {
        let layout = CabinLayout::standard();
        let flight_id = Uuid::new_v4();

        let mut a = generate_seat_map(flight_id, &layout);
        let mut b = generate_seat_map(flight_id, &layout);
        apply_random_occupancy(&mut a, &layout, &mut StdRng::seed_from_u64(7));
        apply_random_occupancy(&mut b, &layout, &mut StdRng::seed_from_u64(7));

        let occupied_a: Vec<_> = a.iter().filter(|s| !s.is_available()).map(|s| s.id.clone()).collect();
        let occupied_b: Vec<_> = b.iter().filter(|s| !s.is_available()).map(|s| s.id.clone()).collect();
        assert_eq!(occupied_a, occupied_b);
        assert!(!occupied_a.is_empty());
        assert!(occupied_a.len() < a.len());
    }
}
