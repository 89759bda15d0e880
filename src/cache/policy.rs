//! Eviction Policy Module
//!
//! Ranks cache entries for batch eviction when the store reaches capacity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::cache::CacheEntry;

// == Eviction Policy ==
/// Ranking used to pick eviction victims.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// Lowest `access_count` first, older insertions first on ties.
    #[default]
    Lfu,
    /// Least recently touched first (insertion and hits both count as touches).
    Lru,
}

impl EvictionPolicy {
    // == Select Victims ==
    /// Returns up to `count` keys to evict, most evictable first.
    pub fn select_victims<T>(
        &self,
        entries: &HashMap<String, CacheEntry<T>>,
        count: usize,
    ) -> Vec<String> {
        let mut ranked: Vec<(&String, &CacheEntry<T>)> = entries.iter().collect();

        match self {
            EvictionPolicy::Lfu => {
                ranked.sort_by_key(|(_, entry)| (entry.access_count, entry.sequence));
            }
            EvictionPolicy::Lru => {
                ranked.sort_by_key(|(_, entry)| entry.last_touch);
            }
        }

        ranked
            .into_iter()
            .take(count)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

// == Batch Size ==
/// Number of entries to evict from a full store of `len` entries: 20%, at least one.
pub fn eviction_batch_size(len: usize) -> usize {
    (len / 5).max(1)
}

impl FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lfu" | "least-frequently-used" => Ok(EvictionPolicy::Lfu),
            "lru" | "least-recently-used" => Ok(EvictionPolicy::Lru),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvictionPolicy::Lfu => write!(f, "lfu"),
            EvictionPolicy::Lru => write!(f, "lru"),
        }
    }
}
