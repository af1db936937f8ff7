use crate::{handlers::AppState, models::HealthStatus};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

pub async fn health_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<HealthStatus>) {
    let (database_ok, cache_ok) = tokio::join!(
        state.ledger.ping(),
        tokio::time::timeout(state.cache_timeout, state.cache.ping()),
    );
    let cache_ok = cache_ok.unwrap_or(false);

    let (status, code) = if database_ok && cache_ok {
        ("healthy", StatusCode::OK)
    } else if database_ok {
        ("degraded", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        code,
        Json(HealthStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
            cache: cache_ok,
            uptime_seconds: state.analytics.uptime_seconds(),
            intake: state.analytics.counters(),
            timestamp: Utc::now(),
        }),
    )
}
