use serde::{Deserialize, Serialize};
use skywings_core::LoyaltyTier;

/// Checked-baggage allowance and surcharge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaggagePolicy {
    /// Weight carried free of charge (kg)
    pub free_weight_kg: u32,

    /// Surcharge per kg above the free allowance (in cents)
    pub extra_rate_cents: i64,

    /// Heaviest bag accepted (kg)
    pub max_weight_kg: u32,
}

impl Default for BaggagePolicy {
    fn default() -> Self {
        Self {
            free_weight_kg: 23,
            extra_rate_cents: 1500,
            max_weight_kg: 50,
        }
    }
}

/// Itemized fare, all amounts in cents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FareQuote {
    pub base_price_cents: i64,
    pub seat_upgrade_cents: i64,
    pub baggage_weight_kg: u32,
    pub extra_baggage_kg: u32,
    pub baggage_charges_cents: i64,
    pub subtotal_cents: i64,
    pub discount_percent: u32,
    pub discount_cents: i64,
    pub total_cents: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Baggage weight {weight} kg exceeds the maximum of {max} kg")]
    BaggageTooHeavy { weight: u32, max: u32 },

    #[error("Invalid fare component: {0}")]
    InvalidAmount(String),
}

/// Fare calculator: base fare + seat upgrade + baggage surcharge - loyalty discount
pub struct FareCalculator {
    baggage: BaggagePolicy,
}

impl FareCalculator {
    pub fn new(baggage: BaggagePolicy) -> Self {
        Self { baggage }
    }

    pub fn baggage_policy(&self) -> &BaggagePolicy {
        &self.baggage
    }

    /// (extra kg, surcharge in cents) for a bag of `weight_kg`
    pub fn baggage_charges(&self, weight_kg: u32) -> Result<(u32, i64), PricingError> {
        if weight_kg > self.baggage.max_weight_kg {
            return Err(PricingError::BaggageTooHeavy {
                weight: weight_kg,
                max: self.baggage.max_weight_kg,
            });
        }
        let extra = weight_kg.saturating_sub(self.baggage.free_weight_kg);
        Ok((extra, extra as i64 * self.baggage.extra_rate_cents))
    }

    pub fn quote(
        &self,
        base_price_cents: i64,
        seat_upgrade_cents: i64,
        baggage_weight_kg: u32,
        tier: LoyaltyTier,
    ) -> Result<FareQuote, PricingError> {
        if base_price_cents <= 0 {
            return Err(PricingError::InvalidAmount(format!("base price {}", base_price_cents)));
        }
        if seat_upgrade_cents < 0 {
            return Err(PricingError::InvalidAmount(format!("seat upgrade {}", seat_upgrade_cents)));
        }

        let (extra_baggage_kg, baggage_charges_cents) = self.baggage_charges(baggage_weight_kg)?;
        let subtotal_cents = base_price_cents + seat_upgrade_cents + baggage_charges_cents;
        let discount_percent = tier.discount_percent();
        let discount_cents = percent_of(subtotal_cents, discount_percent);

        Ok(FareQuote {
            base_price_cents,
            seat_upgrade_cents,
            baggage_weight_kg,
            extra_baggage_kg,
            baggage_charges_cents,
            subtotal_cents,
            discount_percent,
            discount_cents,
            total_cents: subtotal_cents - discount_cents,
        })
    }

    /// Deposit for a blocked seat: half the total, rounded up to the cent,
    /// so that paid + remaining always equals the total.
    pub fn split_deposit(total_cents: i64) -> (i64, i64) {
        let paid = (total_cents + 1) / 2;
        (paid, total_cents - paid)
    }

    /// Ten loyalty points per dollar spent, rounded to the nearest point.
    pub fn loyalty_points(total_cents: i64) -> i64 {
        (total_cents * 10 + 50) / 100
    }
}

impl Default for FareCalculator {
    fn default() -> Self {
        Self::new(BaggagePolicy::default())
    }
}

/// `amount * pct / 100`, rounded half up.
fn percent_of(amount_cents: i64, pct: u32) -> i64 {
    (amount_cents * pct as i64 + 50) / 100
}
