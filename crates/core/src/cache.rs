use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CacheError;
use crate::params::BoundParams;
use crate::result::ResultItem;

/// Identifies one cacheable unit: bear type plus an input fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub bear: String,
    pub fingerprint: String,
}

impl CacheKey {
    /// Key for a file unit. The fingerprint covers the filename, every line
    /// byte-for-byte and the instance's bound parameters.
    pub fn for_file(bear: &str, filename: &str, lines: &[String], params: &BoundParams) -> Self {
        let mut hasher = Sha256::new();
        update_framed(&mut hasher, filename.as_bytes());
        hasher.update((lines.len() as u64).to_le_bytes());
        for line in lines {
            update_framed(&mut hasher, line.as_bytes());
        }
        // BTreeMap-backed, so the encoding is stable across runs.
        let params = serde_json::to_vec(params).unwrap_or_default();
        update_framed(&mut hasher, &params);

        Self {
            bear: bear.to_string(),
            fingerprint: format!("{:x}", hasher.finalize()),
        }
    }
}

/// Length-prefix each field so adjacent fields can't alias.
fn update_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

/// Result cache shared by the caller across runs.
///
/// The engine only performs lookups and inserts; eviction is up to the
/// implementation.
pub trait ResultCache: Send + Sync {
    fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<ResultItem>>, CacheError>;

    fn insert(&self, key: CacheKey, results: Vec<ResultItem>) -> Result<(), CacheError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory [`ResultCache`] without eviction.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Vec<ResultItem>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }
}

impl ResultCache for MemoryCache {
    fn lookup(&self, key: &CacheKey) -> Result<Option<Vec<ResultItem>>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn insert(&self, key: CacheKey, results: Vec<ResultItem>) -> Result<(), CacheError> {
        self.entries.insert(key, results);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
