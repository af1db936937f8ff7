use anyhow::{anyhow, bail, Result};
use axum::Router;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Wraps the router in one token bucket shared by every caller. Per-client
/// limits belong to the ingress in front of this service.
pub fn with_rate_limit(router: Router, per_second: u64, burst: u32) -> Result<Router> {
    if per_second == 0 {
        bail!("rate limit must allow at least one request per second");
    }

    // the builder takes the replenish interval, not a rate
    let config = GovernorConfigBuilder::default()
        .per_nanosecond(NANOS_PER_SECOND / per_second)
        .burst_size(burst)
        .key_extractor(GlobalKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {}/s burst {}", per_second, burst))?;

    // lives for the whole process
    let config = Box::leak(Box::new(config));

    Ok(router.layer(GovernorLayer { config }))
}
