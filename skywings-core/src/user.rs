use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }
}

/// Loyalty tiers, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    pub const ALL: [LoyaltyTier; 4] = [
        LoyaltyTier::Bronze,
        LoyaltyTier::Silver,
        LoyaltyTier::Gold,
        LoyaltyTier::Platinum,
    ];

    /// Percentage taken off the fare subtotal.
    pub fn discount_percent(&self) -> u32 {
        match self {
            LoyaltyTier::Bronze => 0,
            LoyaltyTier::Silver => 5,
            LoyaltyTier::Gold => 10,
            LoyaltyTier::Platinum => 15,
        }
    }

    /// Tier earned purely by flight count.
    pub fn for_flight_count(total_flights: u32) -> Self {
        if total_flights >= 50 {
            LoyaltyTier::Platinum
        } else if total_flights >= 25 {
            LoyaltyTier::Gold
        } else if total_flights >= 10 {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub loyalty_tier: LoyaltyTier,
    pub total_flights: u32,
    pub member_since: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: &str,
        password_hash: String,
        first_name: &str,
        last_name: &str,
        role: Role,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            password_hash,
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            role,
            loyalty_tier: LoyaltyTier::Bronze,
            total_flights: 0,
            member_since: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Count a booked flight and promote the tier if the new count earns it.
    /// Tiers are never lowered here.
    pub fn record_flight(&mut self) {
        self.total_flights += 1;
        self.loyalty_tier = self
            .loyalty_tier
            .max(LoyaltyTier::for_flight_count(self.total_flights));
    }
}
