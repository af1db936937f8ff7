pub mod health;
pub mod payments;
pub mod stats;

pub use health::*;
pub use payments::*;
pub use stats::*;

use crate::services::{Analytics, LedgerStore, MerchantCache, PaymentIntake};
use axum::{
    routing::get,
    Router,
};
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<PaymentIntake>,
    pub ledger: Arc<dyn LedgerStore>,
    pub cache: Arc<dyn MerchantCache>,
    pub analytics: Arc<Analytics>,
    /// Bounds the cache ping in `/health`.
    pub cache_timeout: Duration,
}

/// Application routes without the global middleware stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/payments",
            get(list_recent_payments).post(create_payment),
        )
        .route("/api/stats", get(get_stats))
        .with_state(state)
}
