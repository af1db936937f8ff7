use crate::models::MerchantValidationRecord;
use crate::services::{cache::CacheUnavailable, MerchantCache};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Authority consulted when a merchant has no cached verdict.
#[async_trait]
pub trait MerchantVerifier: Send + Sync {
    async fn verify(&self, merchant_id: &str) -> bool;
}

/// Accepts every merchant it is asked about. The first verdict is cached, so
/// later requests skip verification until the entry expires.
pub struct TrustOnFirstCheck;

#[async_trait]
impl MerchantVerifier for TrustOnFirstCheck {
    async fn verify(&self, _merchant_id: &str) -> bool {
        true
    }
}

/// How a merchant's validity was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MerchantVerdict {
    /// Verdict read from the cache.
    Cached(bool),
    /// Cache miss; the verifier was asked and its answer cached.
    Verified(bool),
    /// Cache unreachable or too slow; treated as valid.
    Degraded,
}

impl MerchantVerdict {
    pub fn is_valid(&self) -> bool {
        match self {
            MerchantVerdict::Cached(valid) | MerchantVerdict::Verified(valid) => *valid,
            MerchantVerdict::Degraded => true,
        }
    }
}

pub struct MerchantValidator {
    cache: Arc<dyn MerchantCache>,
    verifier: Arc<dyn MerchantVerifier>,
    ttl: Duration,
    timeout: Duration,
}

impl MerchantValidator {
    pub fn new(
        cache: Arc<dyn MerchantCache>,
        verifier: Arc<dyn MerchantVerifier>,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            cache,
            verifier,
            ttl,
            timeout,
        }
    }

    /// Never fails: cache trouble resolves to [`MerchantVerdict::Degraded`].
    pub async fn resolve(&self, merchant_id: &str) -> MerchantVerdict {
        let lookup = tokio::time::timeout(self.timeout, self.cache.lookup(merchant_id)).await;

        match flatten_timeout(lookup, self.timeout) {
            Ok(Some(record)) => MerchantVerdict::Cached(record.valid),
            Ok(None) => {
                let valid = self.verifier.verify(merchant_id).await;
                self.remember(merchant_id, valid).await;
                MerchantVerdict::Verified(valid)
            }
            Err(e) => {
                tracing::warn!(
                    merchant_id = merchant_id,
                    "Merchant cache lookup failed, failing open: {}",
                    e
                );
                MerchantVerdict::Degraded
            }
        }
    }

    async fn remember(&self, merchant_id: &str, valid: bool) {
        let record = MerchantValidationRecord::first_check(valid);
        let store = tokio::time::timeout(
            self.timeout,
            self.cache.store(merchant_id, &record, self.ttl),
        )
        .await;

        if let Err(e) = flatten_timeout(store, self.timeout) {
            tracing::warn!(
                merchant_id = merchant_id,
                "Could not cache merchant verdict: {}",
                e
            );
        }
    }
}

fn flatten_timeout<T>(
    result: Result<Result<T, CacheUnavailable>, tokio::time::error::Elapsed>,
    timeout: Duration,
) -> Result<T, CacheUnavailable> {
    result.unwrap_or_else(|_| {
        Err(CacheUnavailable(format!(
            "timed out after {}ms",
            timeout.as_millis()
        )))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{FailingCache, SlowCache, UnwritableCache};
    use crate::services::MemoryMerchantCache;

    struct Deny;

    #[async_trait]
    impl MerchantVerifier for Deny {
        async fn verify(&self, _merchant_id: &str) -> bool {
            false
        }
    }

    fn validator(cache: Arc<dyn MerchantCache>, verifier: Arc<dyn MerchantVerifier>) -> MerchantValidator {
        MerchantValidator::new(
            cache,
            verifier,
            Duration::from_secs(300),
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn miss_trusts_and_records_merchant() {
        let cache = Arc::new(MemoryMerchantCache::new(Duration::from_secs(300)));
        let validator = validator(cache.clone(), Arc::new(TrustOnFirstCheck));

        assert_eq!(validator.resolve("M1").await, MerchantVerdict::Verified(true));

        let record = cache.lookup("M1").await.unwrap().expect("verdict cached");
        assert!(record.valid);
        assert_eq!(record.check_count, 1);

        assert_eq!(validator.resolve("M1").await, MerchantVerdict::Cached(true));
    }

    #[tokio::test]
    async fn cached_rejection_is_honoured() {
        let cache = Arc::new(MemoryMerchantCache::new(Duration::from_secs(300)));
        cache
            .store("M1", &MerchantValidationRecord::first_check(false), Duration::from_secs(300))
            .await
            .unwrap();
        let validator = validator(cache, Arc::new(TrustOnFirstCheck));

        let verdict = validator.resolve("M1").await;
        assert_eq!(verdict, MerchantVerdict::Cached(false));
        assert!(!verdict.is_valid());
    }

    #[tokio::test]
    async fn pluggable_verifier_decides_on_miss() {
        let cache = Arc::new(MemoryMerchantCache::new(Duration::from_secs(300)));
        let validator = validator(cache.clone(), Arc::new(Deny));

        assert_eq!(validator.resolve("M1").await, MerchantVerdict::Verified(false));
        assert_eq!(validator.resolve("M1").await, MerchantVerdict::Cached(false));
    }

    #[tokio::test]
    async fn unreachable_cache_fails_open() {
        let validator = validator(Arc::new(FailingCache), Arc::new(Deny));

        let verdict = validator.resolve("M1").await;
        assert_eq!(verdict, MerchantVerdict::Degraded);
        assert!(verdict.is_valid());
    }

    #[tokio::test]
    async fn slow_cache_is_treated_as_unavailable() {
        let cache = Arc::new(SlowCache(Duration::from_millis(500)));
        let validator = validator(cache, Arc::new(TrustOnFirstCheck));

        assert_eq!(validator.resolve("M1").await, MerchantVerdict::Degraded);
    }

    #[tokio::test]
    async fn failed_store_after_miss_still_trusts_merchant() {
        let caches = [
            UnwritableCache::Refused,
            UnwritableCache::Stalled(Duration::from_millis(500)),
        ];

        for cache in caches {
            let validator = validator(Arc::new(cache), Arc::new(TrustOnFirstCheck));
            assert_eq!(validator.resolve("M1").await, MerchantVerdict::Verified(true));
        }
    }
}
