use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SecretsSource {
    Env,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub host: String,
    pub port: u16,

    // Credentials
    pub secrets_source: SecretsSource,
    pub database_secret: String,
    pub cache_secret: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,

    // Ledger pool
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,

    // Merchant cache
    pub merchant_cache_ttl: Duration,
    pub cache_timeout: Duration,

    // Rate Limiting
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let secrets_source = match var("SECRETS_SOURCE", "env").to_lowercase().as_str() {
            "env" => SecretsSource::Env,
            "file" => SecretsSource::File(PathBuf::from(var(
                "SECRETS_DIR",
                "/var/run/secrets/payment-intake",
            ))),
            other => bail!("Unknown SECRETS_SOURCE: {}", other),
        };

        let config = Self {
            environment: Self::parse_environment(&var("ENVIRONMENT", "development"))?,
            host: var("HOST", "0.0.0.0"),
            port: parse(&var("PORT", "8080"), "PORT")?,

            secrets_source,
            database_secret: var("DATABASE_SECRET", "database"),
            cache_secret: var("CACHE_SECRET", "cache"),
            database_url: lookup("DATABASE_URL"),
            redis_url: lookup("REDIS_URL"),

            db_max_connections: parse(&var("DB_MAX_CONNECTIONS", "10"), "DB_MAX_CONNECTIONS")?,
            db_acquire_timeout: Duration::from_secs(parse(
                &var("DB_ACQUIRE_TIMEOUT_SECS", "5"),
                "DB_ACQUIRE_TIMEOUT_SECS",
            )?),

            merchant_cache_ttl: Duration::from_secs(parse(
                &var("MERCHANT_CACHE_TTL_SECS", "300"),
                "MERCHANT_CACHE_TTL_SECS",
            )?),
            cache_timeout: Duration::from_millis(parse(
                &var("CACHE_TIMEOUT_MS", "250"),
                "CACHE_TIMEOUT_MS",
            )?),

            rate_limit_per_second: parse(
                &var("RATE_LIMIT_PER_SECOND", "10"),
                "RATE_LIMIT_PER_SECOND",
            )?,
            rate_limit_burst: parse(&var("RATE_LIMIT_BURST", "30"), "RATE_LIMIT_BURST")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_environment(env: &str) -> Result<Environment> {
        match env.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => bail!("Unknown environment: {}", env),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres") {
                bail!("DATABASE_URL must be a postgres:// URL");
            }
        }
        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis") {
                bail!("REDIS_URL must be a redis:// or rediss:// URL");
            }
        }
        if self.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be positive");
        }
        if self.merchant_cache_ttl.is_zero() {
            bail!("MERCHANT_CACHE_TTL_SECS must be positive");
        }
        if self.cache_timeout.is_zero() {
            bail!("CACHE_TIMEOUT_MS must be positive");
        }
        if self.rate_limit_per_second == 0 || self.rate_limit_burst == 0 {
            bail!("Rate limits must be positive");
        }

        tracing::info!(
            "Configuration validated for {:?} environment",
            self.environment
        );

        Ok(())
    }
}

fn parse<T>(value: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.port, 8080);
        assert_eq!(config.secrets_source, SecretsSource::Env);
        assert_eq!(config.database_secret, "database");
        assert_eq!(config.merchant_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cache_timeout, Duration::from_millis(250));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn file_secrets_use_configured_dir() {
        let config = config_from(&[("SECRETS_SOURCE", "file"), ("SECRETS_DIR", "/mnt/secrets")]).unwrap();
        assert_eq!(config.secrets_source, SecretsSource::File(PathBuf::from("/mnt/secrets")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
        assert!(config_from(&[("ENVIRONMENT", "qa")]).is_err());
        assert!(config_from(&[("SECRETS_SOURCE", "vault")]).is_err());
        assert!(config_from(&[("MERCHANT_CACHE_TTL_SECS", "0")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "mysql://localhost/payments")]).is_err());
    }
}
