use crate::{models::IntakeCounters, services::merchant::MerchantVerdict};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Process-local intake counters. Reset on restart.
pub struct Analytics {
    payments_completed: AtomicU64,
    merchants_rejected: AtomicU64,
    validation_failures: AtomicU64,
    persistence_failures: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_degraded: AtomicU64,
    start_time: Instant,
}

impl Analytics {
    pub fn new() -> Self {
        Self {
            payments_completed: AtomicU64::new(0),
            merchants_rejected: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            persistence_failures: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            cache_degraded: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_verdict(&self, verdict: MerchantVerdict) {
        let counter = match verdict {
            MerchantVerdict::Cached(_) => &self.cache_hits,
            MerchantVerdict::Verified(_) => &self.cache_misses,
            MerchantVerdict::Degraded => &self.cache_degraded,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.payments_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.merchants_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persistence_failure(&self) {
        self.persistence_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn counters(&self) -> IntakeCounters {
        IntakeCounters {
            payments_completed: self.payments_completed.load(Ordering::Relaxed),
            merchants_rejected: self.merchants_rejected.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            cache_degraded: self.cache_degraded.load(Ordering::Relaxed),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for Analytics {
    fn default() -> Self {
        Self::new()
    }
}
