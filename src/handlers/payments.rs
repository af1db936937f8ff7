use crate::{
    error::IntakeError,
    handlers::AppState,
    models::{ApiResponse, Payment, PaymentRequest, PaymentResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;

pub const DEFAULT_RECENT_LIMIT: i64 = 20;
pub const MAX_RECENT_LIMIT: i64 = 100;

pub async fn create_payment(
    State(state): State<AppState>,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResult>>), IntakeError> {
    let Json(request) = payload.map_err(|e| IntakeError::Validation(e.body_text()))?;

    let result = state.intake.process_payment(&request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(result))))
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<i64>,
}

pub async fn list_recent_payments(
    State(state): State<AppState>,
    query: Result<Query<RecentQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Payment>>>, IntakeError> {
    let Query(query) = query.map_err(|e| IntakeError::Validation(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);

    let payments = state.ledger.list_recent_payments(limit).await?;

    Ok(Json(ApiResponse::ok(payments)))
}
