//! Cache Statistics Module
//!
//! Tracks cache usage: requests, hits, misses, evictions and footprint.

use serde::Serialize;

// == Cache Stats ==
/// Cumulative cache usage metrics.
///
/// Rates are percentages and are recomputed together on every recorded
/// request, so `hit_rate + miss_rate == 100` once any request was made.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Number of `get` calls
    pub total_requests: u64,
    /// Number of `get` calls that returned a value
    pub total_hits: u64,
    /// Number of `get` calls that found nothing usable
    pub total_misses: u64,
    /// Percentage of requests that hit
    pub hit_rate: f64,
    /// Percentage of requests that missed
    pub miss_rate: f64,
    /// Number of entries evicted to stay under capacity
    pub evictions: u64,
    /// Current number of in-memory entries
    pub cache_size: usize,
    /// Approximate footprint in bytes (keys plus serialized entries)
    pub memory_usage: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.total_requests += 1;
        self.total_hits += 1;
        self.recompute_rates();
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.total_requests += 1;
        self.total_misses += 1;
        self.recompute_rates();
    }

    // == Record Eviction ==
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Update Entry Count ==
    /// Updates the live entry count.
    pub fn set_cache_size(&mut self, count: usize) {
        self.cache_size = count;
    }

    fn recompute_rates(&mut self) {
        if self.total_requests == 0 {
            self.hit_rate = 0.0;
            self.miss_rate = 0.0;
            return;
        }
        let total = self.total_requests as f64;
        self.hit_rate = self.total_hits as f64 * 100.0 / total;
        self.miss_rate = 100.0 - self.hit_rate;
    }
}
