//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The stored value
    pub data: T,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Validity window from `created_at`, in milliseconds
    pub ttl_ms: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Last successful read (Unix milliseconds), creation time until first read
    pub last_accessed_at: u64,
    /// Insertion order within the owning store
    #[serde(skip)]
    pub(crate) sequence: u64,
    /// Logical clock value of the last insertion or hit
    #[serde(skip)]
    pub(crate) last_touch: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry valid for `ttl_ms` milliseconds from now.
    pub fn new(data: T, ttl_ms: u64) -> Self {
        let now = current_timestamp_ms();

        Self {
            data,
            created_at: now,
            ttl_ms,
            access_count: 0,
            last_accessed_at: now,
            sequence: 0,
            last_touch: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired only once strictly more than
    /// `ttl_ms` has elapsed since creation.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) > self.ttl_ms
    }

    // == Record Access ==
    /// Bumps the access counter and last-access timestamp.
    pub fn record_access(&mut self) {
        self.access_count += 1;
        self.last_accessed_at = current_timestamp_ms();
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let deadline = self.created_at.saturating_add(self.ttl_ms);
        deadline.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
