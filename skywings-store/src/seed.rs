use chrono::{DateTime, Duration, NaiveTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use skywings_catalog::{apply_random_occupancy, generate_seat_map, CabinLayout};
use skywings_core::repository::{FlightRepository, UserRepository};
use skywings_core::{CoreResult, LoyaltyTier, NewFlight, Role, User};
use tracing::info;

use crate::app_config::SeedConfig;
use crate::credentials::hash_password;

struct DemoUser {
    email: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: Role,
    tier: LoyaltyTier,
    total_flights: u32,
}

const DEMO_USERS: [DemoUser; 2] = [
    DemoUser {
        email: "user@example.com",
        password: "user123",
        first_name: "John",
        last_name: "Doe",
        role: Role::User,
        tier: LoyaltyTier::Gold,
        total_flights: 24,
    },
    DemoUser {
        email: "admin@skywings.com",
        password: "admin123",
        first_name: "Admin",
        last_name: "User",
        role: Role::Admin,
        tier: LoyaltyTier::Platinum,
        total_flights: 0,
    },
];

struct DemoFlight {
    number: &'static str,
    origin: &'static str,
    destination: &'static str,
    days_ahead: i64,
    departs: (u32, u32),
    minutes: i64,
    price_cents: i64,
    aircraft: &'static str,
}

const DEMO_FLIGHTS: [DemoFlight; 3] = [
    DemoFlight {
        number: "SW101",
        origin: "New York (JFK)",
        destination: "Los Angeles (LAX)",
        days_ahead: 7,
        departs: (8, 0),
        minutes: 330,
        price_cents: 29900,
        aircraft: "Boeing 737-800",
    },
    DemoFlight {
        number: "SW202",
        origin: "Los Angeles (LAX)",
        destination: "Chicago (ORD)",
        days_ahead: 10,
        departs: (14, 30),
        minutes: 225,
        price_cents: 18900,
        aircraft: "Airbus A320",
    },
    DemoFlight {
        number: "SW303",
        origin: "Miami (MIA)",
        destination: "Boston (BOS)",
        days_ahead: 14,
        departs: (9, 15),
        minutes: 210,
        price_cents: 24900,
        aircraft: "Boeing 737-800",
    },
];

fn departure_at(now: DateTime<Utc>, days_ahead: i64, (hour, minute): (u32, u32)) -> DateTime<Utc> {
    let day = (now + Duration::days(days_ahead)).date_naive();
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);
    day.and_time(time).and_utc()
}

/// Load the demo accounts and schedule. Existing emails and flight numbers are left alone.
pub async fn seed_demo_data(
    flights: &dyn FlightRepository,
    users: &dyn UserRepository,
    config: &SeedConfig,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if !config.enabled {
        info!("Demo seeding disabled");
        return Ok(());
    }

    for demo in &DEMO_USERS {
        if users.find_by_email(demo.email).await?.is_some() {
            continue;
        }
        let mut user = User::new(
            demo.email,
            hash_password(demo.password)?,
            demo.first_name,
            demo.last_name,
            demo.role,
        );
        user.loyalty_tier = demo.tier;
        user.total_flights = demo.total_flights;
        users.insert_user(user).await?;
        info!("Seeded demo user {}", demo.email);
    }

    let existing = flights.list_flights().await?;
    let layout = CabinLayout::standard();
    let mut rng = StdRng::seed_from_u64(config.rng_seed);

    for demo in &DEMO_FLIGHTS {
        if existing.iter().any(|f| f.flight_number.eq_ignore_ascii_case(demo.number)) {
            continue;
        }
        let departure_time = departure_at(now, demo.days_ahead, demo.departs);
        let flight = NewFlight {
            flight_number: demo.number.to_string(),
            airline: "SkyWings".to_string(),
            origin: demo.origin.to_string(),
            destination: demo.destination.to_string(),
            departure_time,
            arrival_time: departure_time + Duration::minutes(demo.minutes),
            price_cents: demo.price_cents,
            aircraft: demo.aircraft.to_string(),
            status: None,
        }
        .into_flight();

        let mut seats = generate_seat_map(flight.id, &layout);
        if config.random_occupancy {
            apply_random_occupancy(&mut seats, &layout, &mut rng);
        }
        let flight = flights.insert_flight(flight, seats).await?;
        info!(
            "Seeded flight {} ({}), {}/{} seats available",
            flight.flight_number,
            flight.route(),
            flight.available_seats,
            flight.total_seats
        );
    }
    Ok(())
}
