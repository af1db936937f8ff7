use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verdict held in the validation cache for one merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantValidationRecord {
    pub valid: bool,
    pub checked_at: DateTime<Utc>,
    pub check_count: u32,
}

impl MerchantValidationRecord {
    pub fn first_check(valid: bool) -> Self {
        Self {
            valid,
            checked_at: Utc::now(),
            check_count: 1,
        }
    }
}
