use crate::{
    error::IntakeError,
    handlers::AppState,
    models::{ApiResponse, DailyStats},
};
use axum::{extract::State, Json};

pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DailyStats>>, IntakeError> {
    let stats = state.ledger.compute_daily_stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
