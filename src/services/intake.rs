use crate::{
    error::IntakeError,
    models::{PaymentRequest, PaymentResult, PaymentStatus},
    services::{Analytics, LedgerStore, MerchantValidator},
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Turns a payment request into a validated, persisted ledger row.
///
/// Per call: at most one cache write and at most one ledger write. The cache
/// write is advisory and not transactional with the ledger write. Nothing is
/// retried here, and there is no idempotency key: two identical requests
/// produce two rows.
pub struct PaymentIntake {
    validator: MerchantValidator,
    ledger: Arc<dyn LedgerStore>,
    analytics: Arc<Analytics>,
}

impl PaymentIntake {
    pub fn new(
        validator: MerchantValidator,
        ledger: Arc<dyn LedgerStore>,
        analytics: Arc<Analytics>,
    ) -> Self {
        Self {
            validator,
            ledger,
            analytics,
        }
    }

    pub async fn process_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentResult, IntakeError> {
        let started = Instant::now();

        let payment = request.validate().map_err(|e| {
            self.analytics.record_validation_failure();
            e
        })?;

        let verdict = self.validator.resolve(&payment.merchant_id).await;
        self.analytics.record_verdict(verdict);

        if !verdict.is_valid() {
            self.analytics.record_rejected();
            tracing::warn!(merchant_id = %payment.merchant_id, "Merchant rejected");
            return Err(IntakeError::MerchantRejected {
                merchant_id: payment.merchant_id,
            });
        }

        let id = self.ledger.insert_payment(&payment).await.map_err(|e| {
            self.analytics.record_persistence_failure();
            tracing::error!(
                merchant_id = %payment.merchant_id,
                "Ledger write failed: {}",
                e
            );
            IntakeError::Persistence(e)
        })?;

        let elapsed = started.elapsed();
        self.analytics.record_completed();

        tracing::info!(
            payment_id = id,
            merchant_id = %payment.merchant_id,
            verdict = ?verdict,
            "Payment completed: {} {} in {}ms",
            payment.amount,
            payment.currency,
            elapsed.as_millis()
        );

        Ok(PaymentResult {
            id,
            amount: payment.amount,
            currency: payment.currency,
            merchant_id: payment.merchant_id,
            status: PaymentStatus::Completed,
            processed_at: Utc::now(),
            processing_time_ms: elapsed.as_millis() as u64,
        })
    }
}
