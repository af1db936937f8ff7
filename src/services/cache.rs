use crate::models::MerchantValidationRecord;
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use redis::{AsyncCommands, IntoConnectionInfo};
use std::time::{Duration, Instant};
use thiserror::Error;

const KEY_PREFIX: &str = "merchant:";

/// The cache could not be reached or answered with garbage. Callers treat
/// this as "no opinion", never as "merchant invalid".
#[derive(Error, Debug, Clone)]
#[error("merchant cache unavailable: {0}")]
pub struct CacheUnavailable(pub String);

impl From<redis::RedisError> for CacheUnavailable {
    fn from(e: redis::RedisError) -> Self {
        CacheUnavailable(e.to_string())
    }
}

/// Best-effort store of merchant validation verdicts.
#[async_trait]
pub trait MerchantCache: Send + Sync {
    async fn lookup(
        &self,
        merchant_id: &str,
    ) -> Result<Option<MerchantValidationRecord>, CacheUnavailable>;

    async fn store(
        &self,
        merchant_id: &str,
        record: &MerchantValidationRecord,
        ttl: Duration,
    ) -> Result<(), CacheUnavailable>;

    async fn ping(&self) -> bool;
}

pub fn cache_key(merchant_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, merchant_id)
}

pub struct RedisMerchantCache {
    redis: redis::aio::ConnectionManager,
}

impl RedisMerchantCache {
    pub async fn connect(target: impl IntoConnectionInfo) -> Result<Self> {
        let client = redis::Client::open(target)?;
        let redis = client.get_connection_manager().await?;
        tracing::info!("Redis connected successfully");
        Ok(Self { redis })
    }
}

#[async_trait]
impl MerchantCache for RedisMerchantCache {
    async fn lookup(
        &self,
        merchant_id: &str,
    ) -> Result<Option<MerchantValidationRecord>, CacheUnavailable> {
        let key = cache_key(merchant_id);
        let mut redis = self.redis.clone();

        match redis.get::<_, Option<String>>(&key).await? {
            Some(cached) => match serde_json::from_str(&cached) {
                Ok(record) => {
                    tracing::debug!("Redis cache hit for key: {}", key);
                    Ok(Some(record))
                }
                Err(e) => {
                    // an unreadable record is replaced on the next miss
                    tracing::warn!("Discarding malformed cache entry {}: {}", key, e);
                    Ok(None)
                }
            },
            None => {
                tracing::debug!("Cache miss for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn store(
        &self,
        merchant_id: &str,
        record: &MerchantValidationRecord,
        ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        let key = cache_key(merchant_id);
        let serialized =
            serde_json::to_string(record).map_err(|e| CacheUnavailable(e.to_string()))?;
        let mut redis = self.redis.clone();

        redis
            .set_ex::<_, _, ()>(&key, serialized, ttl.as_secs().max(1))
            .await?;
        tracing::debug!("Cached key: {} with TTL: {}s", key, ttl.as_secs());
        Ok(())
    }

    async fn ping(&self) -> bool {
        let mut redis = self.redis.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut redis)
            .await
            .is_ok()
    }
}

#[derive(Clone)]
struct MemoryEntry {
    payload: String,
    expires_at: Instant,
}

/// In-process cache used when Redis is not reachable at startup. Entries are
/// local to this instance.
pub struct MemoryMerchantCache {
    memory: Cache<String, MemoryEntry>,
}

impl MemoryMerchantCache {
    pub fn new(max_ttl: Duration) -> Self {
        let memory = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(max_ttl)
            .build();

        Self { memory }
    }
}

#[async_trait]
impl MerchantCache for MemoryMerchantCache {
    async fn lookup(
        &self,
        merchant_id: &str,
    ) -> Result<Option<MerchantValidationRecord>, CacheUnavailable> {
        let key = cache_key(merchant_id);
        let Some(entry) = self.memory.get(&key).await else {
            tracing::debug!("Cache miss for key: {}", key);
            return Ok(None);
        };

        if Instant::now() >= entry.expires_at {
            self.memory.invalidate(&key).await;
            return Ok(None);
        }

        match serde_json::from_str(&entry.payload) {
            Ok(record) => {
                tracing::debug!("Memory cache hit for key: {}", key);
                Ok(Some(record))
            }
            Err(_) => {
                self.memory.invalidate(&key).await;
                Ok(None)
            }
        }
    }

    async fn store(
        &self,
        merchant_id: &str,
        record: &MerchantValidationRecord,
        ttl: Duration,
    ) -> Result<(), CacheUnavailable> {
        let payload =
            serde_json::to_string(record).map_err(|e| CacheUnavailable(e.to_string()))?;
        let entry = MemoryEntry {
            payload,
            expires_at: Instant::now() + ttl,
        };
        self.memory.insert(cache_key(merchant_id), entry).await;
        Ok(())
    }

    /// Entries here are local to this instance; the shared cache counts as
    /// down while this fallback is in use.
    async fn ping(&self) -> bool {
        false
    }
}
