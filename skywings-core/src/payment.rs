use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use skywings_shared::Masked;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Paypal,
}

/// Payment form as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount the client expects to be charged, in cents
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub card_number: Option<Masked<String>>,
    #[serde(default)]
    pub card_holder_name: Option<String>,
    /// MM/YY
    #[serde(default)]
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub cvv: Option<Masked<String>>,
}

impl PaymentRequest {
    /// Field-level checks on the payment form. Card payments need every card field.
    pub fn validate(&self, today: DateTime<Utc>) -> CoreResult<()> {
        if self.amount_cents <= 0 {
            return Err(CoreError::ValidationError("amount_cents must be positive".into()));
        }
        if self.payment_method == PaymentMethod::Paypal {
            return Ok(());
        }

        let number = self
            .card_number
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("card_number is required".into()))?;
        let digits: String = number.expose().chars().filter(|c| !c.is_whitespace()).collect();
        if !(13..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::ValidationError("card_number is invalid".into()));
        }

        match self.card_holder_name.as_deref().map(str::trim) {
            None | Some("") => {
                return Err(CoreError::ValidationError("card_holder_name is required".into()))
            }
            _ => {}
        }

        let expiry = self
            .expiry_date
            .as_deref()
            .ok_or_else(|| CoreError::ValidationError("expiry_date is required".into()))?;
        let (month, year) = parse_expiry(expiry)
            .ok_or_else(|| CoreError::ValidationError("expiry_date must be MM/YY".into()))?;
        if (year, month) < (today.year(), today.month()) {
            return Err(CoreError::ValidationError("card has expired".into()));
        }

        let cvv = self
            .cvv
            .as_ref()
            .ok_or_else(|| CoreError::ValidationError("cvv is required".into()))?;
        if !(3..=4).contains(&cvv.expose().len()) || !cvv.expose().chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::ValidationError("cvv is invalid".into()));
        }
        Ok(())
    }
}

fn parse_expiry(value: &str) -> Option<(u32, i32)> {
    let (mm, yy) = value.trim().split_once('/')?;
    let month: u32 = mm.trim().parse().ok()?;
    let year: i32 = yy.trim().parse().ok()?;
    if !(1..=12).contains(&month) || !(0..=99).contains(&year) {
        return None;
    }
    Some((month, 2000 + year))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub id: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub card_last4: Option<String>,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Charge `amount_cents` using the submitted payment details.
    async fn charge(&self, request: &PaymentRequest, amount_cents: i64) -> CoreResult<PaymentReceipt>;
}

/// Approves every well-formed payment; no gateway is contacted.
pub struct MockPaymentAdapter;

#[async_trait]
impl PaymentAdapter for MockPaymentAdapter {
    async fn charge(&self, request: &PaymentRequest, amount_cents: i64) -> CoreResult<PaymentReceipt> {
        let now = Utc::now();
        request.validate(now)?;
        if request.amount_cents != amount_cents {
            return Err(CoreError::ValidationError(format!(
                "Payment amount {} does not match amount due {}",
                request.amount_cents, amount_cents
            )));
        }

        tracing::info!(
            "Approving {:?} payment of {} cents (card {:?})",
            request.payment_method,
            amount_cents,
            request.card_number
        );

        Ok(PaymentReceipt {
            id: format!("pay_{}", Uuid::new_v4().simple()),
            amount_cents,
            payment_method: request.payment_method,
            card_last4: request.card_number.as_ref().map(|c| c.last4()),
            processed_at: now,
        })
    }
}
