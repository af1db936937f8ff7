use anyhow::{Context, Result};
use payment_intake::{
    config::{Config, SecretsSource},
    handlers::{router, AppState},
    middleware::with_rate_limit,
    services::{
        secrets::{self, CacheCredentials, DatabaseCredentials, EnvSecretResolver, FileSecretResolver},
        *,
    },
};
use redis::ConnectionInfo;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting payment intake v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    let resolver: Box<dyn SecretResolver> = match &config.secrets_source {
        SecretsSource::Env => Box::new(EnvSecretResolver),
        SecretsSource::File(dir) => Box::new(FileSecretResolver::new(dir.clone())),
    };

    // Ledger
    let connect_options = database_options(&config, resolver.as_ref()).await?;
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .connect_with(connect_options)
        .await
        .context("Failed to connect to the ledger database")?;
    let ledger = Arc::new(PgLedgerStore::new(pool));
    ledger
        .ensure_schema()
        .await
        .context("Failed to bootstrap ledger schema")?;

    // Merchant cache
    let cache = connect_cache(&config, resolver.as_ref()).await;

    // Intake
    let analytics = Arc::new(Analytics::new());
    let validator = MerchantValidator::new(
        cache.clone(),
        Arc::new(TrustOnFirstCheck),
        config.merchant_cache_ttl,
        config.cache_timeout,
    );
    let intake = Arc::new(PaymentIntake::new(validator, ledger.clone(), analytics.clone()));

    let app_state = AppState {
        intake,
        ledger,
        cache,
        analytics,
        cache_timeout: config.cache_timeout,
    };

    // Build router
    let app = with_rate_limit(
        router(app_state),
        config.rate_limit_per_second,
        config.rate_limit_burst,
    )?
    .layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::default().include_headers(true)),
    )
    .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn database_options(
    config: &Config,
    resolver: &dyn SecretResolver,
) -> Result<PgConnectOptions> {
    if let Some(url) = &config.database_url {
        tracing::info!("Using DATABASE_URL for ledger connection");
        return url.parse().context("Invalid DATABASE_URL");
    }

    let creds: DatabaseCredentials = secrets::resolve_json(resolver, &config.database_secret)
        .await
        .context("Failed to resolve database credentials")?;
    tracing::info!(
        "Resolved ledger credentials for {}@{}:{}/{}",
        creds.username,
        creds.host,
        creds.port,
        creds.dbname
    );

    Ok(PgConnectOptions::new()
        .host(&creds.host)
        .port(creds.port)
        .username(&creds.username)
        .password(&creds.password)
        .database(&creds.dbname))
}

/// The cache is advisory: when Redis cannot be reached at startup the service
/// runs on an in-process cache instead of refusing to start.
async fn connect_cache(config: &Config, resolver: &dyn SecretResolver) -> Arc<dyn MerchantCache> {
    let target: Option<ConnectionInfo> = match &config.redis_url {
        Some(url) => match url.parse() {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!("Invalid REDIS_URL: {}", e);
                None
            }
        },
        None => match secrets::resolve_json::<CacheCredentials>(resolver, &config.cache_secret).await {
            Ok(creds) => Some(creds.connection_info()),
            Err(e) => {
                tracing::warn!("Cache credentials unavailable: {}", e);
                None
            }
        },
    };

    if let Some(info) = target {
        match RedisMerchantCache::connect(info).await {
            Ok(cache) => return Arc::new(cache),
            Err(e) => tracing::warn!("Redis connection failed: {}, using memory cache only", e),
        }
    }

    Arc::new(MemoryMerchantCache::new(config.merchant_cache_ttl))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl+c");
    tracing::info!("Shutting down gracefully...");
}
