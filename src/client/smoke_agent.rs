use anyhow::Result;
use payment_intake::{client::IntakeClient, models::PaymentRequest};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let base_url = std::env::var("PAYMENT_INTAKE_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let merchant_id = std::env::var("SMOKE_MERCHANT_ID").unwrap_or_else(|_| "M1".to_string());

    println!("Payment Intake Smoke Agent");
    println!("==========================");
    println!("Server: {}", base_url);
    println!("Merchant: {}", merchant_id);
    println!();

    let client = IntakeClient::new(&base_url);

    let health = client.health().await?;
    println!("Health: {} (database: {}, cache: {})", health.status, health.database, health.cache);
    println!();

    for amount in [Decimal::new(1000, 2), Decimal::new(2550, 2)] {
        let request = PaymentRequest::new(amount, "USD", &merchant_id);
        match client.create_payment(&request).await {
            Ok(result) => println!(
                "[OK] Payment {} recorded: {} {} in {}ms",
                result.id, result.amount, result.currency, result.processing_time_ms
            ),
            Err(e) => println!("[FAILED] {}", e),
        }
    }
    println!();

    let stats = client.stats().await?;
    println!("Last 24h:");
    println!("{}", serde_json::to_string_pretty(&stats)?);

    let recent = client.recent_payments(5).await?;
    println!();
    println!("Most recent payments:");
    for payment in recent {
        println!(
            "  #{} {} {} {} {}",
            payment.id, payment.created_at, payment.merchant_id, payment.amount, payment.currency
        );
    }

    Ok(())
}
