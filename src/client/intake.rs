use crate::error::ErrorResponse;
use crate::models::{ApiResponse, DailyStats, HealthStatus, Payment, PaymentRequest, PaymentResult};
use anyhow::{bail, Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

/// Typed HTTP client for the intake API.
pub struct IntakeClient {
    base_url: String,
    http: Client,
}

impl IntakeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentResult> {
        let response = self
            .http
            .post(format!("{}/api/payments", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to send payment")?;

        Ok(decode::<ApiResponse<PaymentResult>>(response).await?.data)
    }

    pub async fn recent_payments(&self, limit: i64) -> Result<Vec<Payment>> {
        let response = self
            .http
            .get(format!("{}/api/payments", self.base_url))
            .query(&[("limit", limit)])
            .send()
            .await?;

        Ok(decode::<ApiResponse<Vec<Payment>>>(response).await?.data)
    }

    pub async fn stats(&self) -> Result<DailyStats> {
        let response = self
            .http
            .get(format!("{}/api/stats", self.base_url))
            .send()
            .await?;

        Ok(decode::<ApiResponse<DailyStats>>(response).await?.data)
    }

    /// Returns the health document even when the service reports itself
    /// unhealthy.
    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        response
            .json()
            .await
            .context("Malformed health response")
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        return response.json().await.context("Malformed response body");
    }

    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(error) => bail!("{} ({}): {}", error.error_code, status, error.error),
        Err(_) => bail!("Request failed with {}: {}", status, body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    #[tokio::test]
    async fn create_payment_decodes_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/payments")
            .match_body(mockito::Matcher::PartialJson(json!({"merchantId": "M1", "currency": "USD"})))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": {
                        "id": 7,
                        "amount": "10.00",
                        "currency": "USD",
                        "merchantId": "M1",
                        "status": "COMPLETED",
                        "processedAt": "2024-05-01T12:00:00Z",
                        "processingTimeMs": 4
                    },
                    "timestamp": "2024-05-01T12:00:00Z",
                    "requestId": "req-1"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = IntakeClient::new(&server.url());
        let result = client
            .create_payment(&PaymentRequest::new(Decimal::new(1000, 2), "USD", "M1"))
            .await
            .unwrap();

        assert_eq!(result.id, 7);
        assert_eq!(result.amount, Decimal::new(1000, 2));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_envelope_becomes_error_with_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/payments")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": false,
                    "error": "Merchant rejected: M9",
                    "errorCode": "MERCHANT_REJECTED",
                    "timestamp": "2024-05-01T12:00:00Z",
                    "requestId": "req-2"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = IntakeClient::new(&server.url());
        let error = client
            .create_payment(&PaymentRequest::new(Decimal::ONE, "USD", "M9"))
            .await
            .unwrap_err();

        assert!(error.to_string().contains("MERCHANT_REJECTED"));
    }

    #[tokio::test]
    async fn recent_payments_sends_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/payments")
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "success": true,
                    "data": [],
                    "timestamp": "2024-05-01T12:00:00Z",
                    "requestId": "req-3"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = IntakeClient::new(&format!("{}/", server.url()));
        let payments = client.recent_payments(5).await.unwrap();

        assert!(payments.is_empty());
        mock.assert_async().await;
    }
}
