//! Cache statistics.
//!
//! Lookup and eviction counters live inside each engine's state; occupancy is
//! filled in when a snapshot is taken.

use serde::Serialize;

/// Point-in-time counters for one cache instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that found nothing or an unreadable value
    pub misses: u64,
    /// Items dropped to make room for writes
    pub evictions: u64,
    /// Stored item count at snapshot time
    pub total_entries: usize,
    /// Stored bytes at snapshot time
    pub total_size: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total lookups recorded.
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            n => self.hits as f64 / n as f64,
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    /// Copies the counters and stamps the current occupancy onto the copy.
    pub fn snapshot(&self, total_entries: usize, total_size: u64) -> Self {
        Self {
            total_entries,
            total_size,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_stats_are_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.lookups(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_tracks_lookups() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert_eq!(stats.lookups(), 4);
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_only_misses() {
        let mut stats = CacheStats::new();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_evictions_accumulate_in_batches() {
        let mut stats = CacheStats::new();
        stats.record_evictions(2);
        stats.record_evictions(0);
        stats.record_evictions(1);
        assert_eq!(stats.evictions, 3);
    }

    #[test]
    fn test_snapshot_keeps_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_evictions(5);

        let snapshot = stats.snapshot(42, 4096);

        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.evictions, 5);
        assert_eq!(snapshot.total_entries, 42);
        assert_eq!(snapshot.total_size, 4096);
        // The live counters carry no occupancy.
        assert_eq!(stats.total_entries, 0);
    }
}
