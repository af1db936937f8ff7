use crate::services::ledger::LedgerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Merchant rejected: {merchant_id}")]
    MerchantRejected { merchant_id: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] LedgerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl IntakeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            IntakeError::Validation(_) => "VALIDATION_ERROR",
            IntakeError::MerchantRejected { .. } => "MERCHANT_REJECTED",
            IntakeError::Persistence(_) => "PERSISTENCE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            IntakeError::Validation(_) => StatusCode::BAD_REQUEST,
            IntakeError::MerchantRejected { .. } => StatusCode::FORBIDDEN,
            IntakeError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub timestamp: chrono::DateTime<Utc>,
    pub request_id: String,
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let status = self.status_code();
        let error_code = self.error_code();

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: error_code.to_string(),
            timestamp: Utc::now(),
            request_id,
        };

        tracing::error!(
            error = ?self,
            error_code = error_code,
            "Request failed"
        );

        (status, Json(body)).into_response()
    }
}
