use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now(),
            request_id: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntakeCounters {
    pub payments_completed: u64,
    pub merchants_rejected: u64,
    pub validation_failures: u64,
    pub persistence_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_degraded: u64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub database: bool,
    pub cache: bool,
    pub uptime_seconds: u64,
    pub intake: IntakeCounters,
    pub timestamp: DateTime<Utc>,
}
