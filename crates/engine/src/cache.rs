//! Result cache integration: key computation, lookup before dispatch and
//! population after completion. Cache malfunctions degrade to a miss.

use tracing::{trace, warn};
use ursa_core::{BearInstance, CacheKey, ResultItem};

/// Key for a file unit, if the instance has a cache and its bear is cacheable.
pub(crate) fn key_for(instance: &BearInstance, filename: &str, lines: &[String]) -> Option<CacheKey> {
    instance.cache()?;
    if !instance.spec().is_cache_eligible() {
        return None;
    }
    Some(CacheKey::for_file(instance.name(), filename, lines, instance.params()))
}

/// Cached results for `key`; lookup errors count as a miss.
pub(crate) fn lookup(instance: &BearInstance, key: &CacheKey) -> Option<Vec<ResultItem>> {
    let cache = instance.cache()?;
    match cache.lookup(key) {
        Ok(hit) => {
            trace!(bear = %instance.name(), fingerprint = %key.fingerprint, hit = hit.is_some(), "cache lookup");
            hit
        }
        Err(e) => {
            warn!(bear = %instance.name(), error = %e, "cache lookup failed, recomputing");
            None
        }
    }
}

pub(crate) fn store(instance: &BearInstance, key: CacheKey, results: &[ResultItem]) {
    let Some(cache) = instance.cache() else {
        return;
    };
    if let Err(e) = cache.insert(key, results.to_vec()) {
        warn!(bear = %instance.name(), error = %e, "cache store failed");
    }
}
