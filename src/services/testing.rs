//! In-memory collaborators for unit tests.

use crate::models::{DailyStats, MerchantValidationRecord, NewPayment, Payment, PaymentStatus};
use crate::services::cache::{CacheUnavailable, MerchantCache};
use crate::services::ledger::{LedgerError, LedgerStore};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeLedger {
    rows: Mutex<Vec<Payment>>,
    fail: bool,
}

impl FakeLedger {
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn rows(&self) -> Vec<Payment> {
        self.rows.lock().unwrap().clone()
    }

    /// Inserts a row with an explicit age, for windowed stats.
    pub fn insert_aged(&self, amount: Decimal, merchant_id: &str, age: ChronoDuration) {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(Payment {
            id,
            amount,
            currency: "USD".to_string(),
            merchant_id: merchant_id.to_string(),
            status: PaymentStatus::Completed,
            created_at: Utc::now() - age,
        });
    }
}

#[async_trait]
impl LedgerStore for FakeLedger {
    async fn ensure_schema(&self) -> Result<(), LedgerError> {
        Ok(())
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<i64, LedgerError> {
        if self.fail {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }

        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(Payment {
            id,
            amount: payment.amount,
            currency: payment.currency.clone(),
            merchant_id: payment.merchant_id.clone(),
            status: PaymentStatus::Completed,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_recent_payments(&self, limit: i64) -> Result<Vec<Payment>, LedgerError> {
        if self.fail {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }

        let mut rows = self.rows();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn compute_daily_stats(&self) -> Result<DailyStats, LedgerError> {
        if self.fail {
            return Err(LedgerError::Unavailable("connection refused".to_string()));
        }

        let cutoff = Utc::now() - ChronoDuration::hours(24);
        let rows: Vec<Payment> = self
            .rows()
            .into_iter()
            .filter(|p| p.created_at >= cutoff)
            .collect();
        let total: Decimal = rows.iter().map(|p| p.amount).sum();
        let merchants: HashSet<&str> = rows.iter().map(|p| p.merchant_id.as_str()).collect();

        Ok(DailyStats::from_totals(
            rows.len() as i64,
            total,
            merchants.len() as i64,
        ))
    }

    async fn ping(&self) -> bool {
        !self.fail
    }
}

pub struct FailingCache;

#[async_trait]
impl MerchantCache for FailingCache {
    async fn lookup(
        &self,
        _merchant_id: &str,
    ) -> Result<Option<MerchantValidationRecord>, CacheUnavailable> {
        Err(CacheUnavailable("connection refused".to_string()))
    }

    async fn store(
        &self,
        _merchant_id: &str,
        _record: &MerchantValidationRecord,
        _ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        Err(CacheUnavailable("connection refused".to_string()))
    }

    async fn ping(&self) -> bool {
        false
    }
}

/// Answers every call only after the given delay.
pub struct SlowCache(pub Duration);

#[async_trait]
impl MerchantCache for SlowCache {
    async fn lookup(
        &self,
        _merchant_id: &str,
    ) -> Result<Option<MerchantValidationRecord>, CacheUnavailable> {
        tokio::time::sleep(self.0).await;
        Ok(None)
    }

    async fn store(
        &self,
        _merchant_id: &str,
        _record: &MerchantValidationRecord,
        _ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }

    async fn ping(&self) -> bool {
        tokio::time::sleep(self.0).await;
        true
    }
}

/// Misses on every lookup, then fails or stalls on the write that follows.
pub enum UnwritableCache {
    Refused,
    Stalled(Duration),
}

#[async_trait]
impl MerchantCache for UnwritableCache {
    async fn lookup(
        &self,
        _merchant_id: &str,
    ) -> Result<Option<MerchantValidationRecord>, CacheUnavailable> {
        Ok(None)
    }

    async fn store(
        &self,
        _merchant_id: &str,
        _record: &MerchantValidationRecord,
        _ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        match self {
            Self::Refused => Err(CacheUnavailable("READONLY replica".to_string())),
            Self::Stalled(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }

    async fn ping(&self) -> bool {
        true
    }
}
