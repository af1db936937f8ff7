use crate::error::IntakeError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const CURRENCY_CODE_LEN: usize = 3;
pub const MAX_MERCHANT_ID_LEN: usize = 255;
pub const AMOUNT_SCALE: u32 = 2;
/// 9,999,999,999.99, the largest value a `NUMERIC(12, 2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Lifecycle state of a ledger row.
///
/// The intake sequence only ever writes `Completed`; the other states exist so
/// rows written by future flows still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

/// A persisted ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub merchant_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Inbound body of a create-payment call. Every field is optional at the wire
/// level so that missing fields surface as validation errors, not as body
/// rejections from the extractor.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub merchant_id: Option<String>,
}

impl PaymentRequest {
    pub fn new(amount: Decimal, currency: &str, merchant_id: &str) -> Self {
        Self {
            amount: Some(amount),
            currency: Some(currency.to_string()),
            merchant_id: Some(merchant_id.to_string()),
        }
    }

    /// Checks the request without touching any collaborator.
    pub fn validate(&self) -> Result<NewPayment, IntakeError> {
        let amount = self
            .amount
            .ok_or_else(|| IntakeError::Validation("amount is required".to_string()))?;
        let currency = required_text(self.currency.as_deref(), "currency")?;
        let merchant_id = required_text(self.merchant_id.as_deref(), "merchantId")?;

        if amount <= Decimal::ZERO {
            return Err(IntakeError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if amount.normalize().scale() > AMOUNT_SCALE {
            return Err(IntakeError::Validation(format!(
                "amount must have at most {} decimal places",
                AMOUNT_SCALE
            )));
        }
        if amount > MAX_AMOUNT {
            return Err(IntakeError::Validation(format!(
                "amount must not exceed {}",
                MAX_AMOUNT
            )));
        }
        if currency.chars().count() != CURRENCY_CODE_LEN {
            return Err(IntakeError::Validation(format!(
                "currency must be a {}-character code",
                CURRENCY_CODE_LEN
            )));
        }
        if merchant_id.chars().count() > MAX_MERCHANT_ID_LEN {
            return Err(IntakeError::Validation(format!(
                "merchantId must be at most {} characters",
                MAX_MERCHANT_ID_LEN
            )));
        }

        Ok(NewPayment {
            amount,
            currency: currency.to_string(),
            merchant_id: merchant_id.to_string(),
        })
    }
}

fn required_text<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, IntakeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(IntakeError::Validation(format!("{} is required", field))),
    }
}

/// A validated payment, ready to be written to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub amount: Decimal,
    pub currency: String,
    pub merchant_id: String,
}

/// Outcome of a successful intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    pub id: i64,
    pub amount: Decimal,
    pub currency: String,
    pub merchant_id: String,
    pub status: PaymentStatus,
    pub processed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}
