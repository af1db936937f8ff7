use crate::models::{DailyStats, NewPayment, Payment, PaymentStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPool, FromRow};
use thiserror::Error;

/// Serializes schema bootstrap across instances starting at once.
const SCHEMA_LOCK_KEY: i64 = 0x7061_796d_656e_7473;

const SCHEMA_STATEMENTS: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id BIGSERIAL PRIMARY KEY,
        amount NUMERIC(12, 2) NOT NULL CHECK (amount > 0),
        currency VARCHAR(3) NOT NULL,
        merchant_id VARCHAR(255) NOT NULL,
        status VARCHAR(20) NOT NULL DEFAULT 'COMPLETED',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_payments_merchant_id ON payments (merchant_id)",
    "CREATE INDEX IF NOT EXISTS idx_payments_created_at ON payments (created_at)",
];

// duplicate_table, unique_violation (catalog race on CREATE ... IF NOT EXISTS)
const ALREADY_EXISTS_CODES: [&str; 2] = ["42P07", "23505"];

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt ledger row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for LedgerError {
    /// No connection could be had from the pool; nothing reached the database.
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                LedgerError::Unavailable(error.to_string())
            }
            other => LedgerError::Database(other),
        }
    }
}

/// Durable record of completed payments.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Idempotent; safe to race with other instances.
    async fn ensure_schema(&self) -> Result<(), LedgerError>;

    /// Writes one `COMPLETED` row and returns its generated id.
    async fn insert_payment(&self, payment: &NewPayment) -> Result<i64, LedgerError>;

    async fn list_recent_payments(&self, limit: i64) -> Result<Vec<Payment>, LedgerError>;

    /// Aggregates over the trailing 24 hours.
    async fn compute_daily_stats(&self) -> Result<DailyStats, LedgerError>;

    async fn ping(&self) -> bool;
}

#[derive(FromRow)]
struct PaymentRow {
    id: i64,
    amount: Decimal,
    currency: String,
    merchant_id: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = LedgerError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PaymentStatus>()
            .map_err(|e| LedgerError::Corrupt(format!("payment {}: {}", row.id, e)))?;

        Ok(Payment {
            id: row.id,
            amount: row.amount,
            currency: row.currency,
            merchant_id: row.merchant_id,
            status,
            created_at: row.created_at,
        })
    }
}

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn create_schema(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        tx.commit().await
    }
}

fn is_already_exists(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| ALREADY_EXISTS_CODES.iter().any(|known| code == *known))
        .unwrap_or(false)
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn ensure_schema(&self) -> Result<(), LedgerError> {
        match self.create_schema().await {
            Ok(()) => {
                tracing::info!("Ledger schema ready");
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                tracing::debug!("Ledger schema created concurrently: {}", e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_payment(&self, payment: &NewPayment) -> Result<i64, LedgerError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO payments (amount, currency, merchant_id, status) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.merchant_id)
        .bind(PaymentStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_recent_payments(&self, limit: i64) -> Result<Vec<Payment>, LedgerError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT id, amount, currency, merchant_id, status, created_at \
             FROM payments ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    async fn compute_daily_stats(&self) -> Result<DailyStats, LedgerError> {
        let (total_payments, total_amount, unique_merchants): (i64, Option<Decimal>, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), SUM(amount), COUNT(DISTINCT merchant_id) \
                 FROM payments WHERE created_at >= NOW() - INTERVAL '24 hours'",
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(DailyStats::from_totals(
            total_payments,
            total_amount.unwrap_or(Decimal::ZERO),
            unique_merchants,
        ))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
