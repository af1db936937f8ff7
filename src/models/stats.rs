use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregates over the trailing 24 hours of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub total_payments: i64,
    pub total_amount: Decimal,
    pub average_amount: Decimal,
    pub unique_merchants: i64,
}

impl DailyStats {
    pub fn empty() -> Self {
        Self {
            total_payments: 0,
            total_amount: Decimal::ZERO,
            average_amount: Decimal::ZERO,
            unique_merchants: 0,
        }
    }

    /// Builds stats from raw aggregates. The average is rounded to cents.
    pub fn from_totals(total_payments: i64, total_amount: Decimal, unique_merchants: i64) -> Self {
        if total_payments <= 0 {
            return Self::empty();
        }

        let average_amount = (total_amount / Decimal::from(total_payments)).round_dp(2);

        Self {
            total_payments,
            total_amount,
            average_amount,
            unique_merchants,
        }
    }
}
