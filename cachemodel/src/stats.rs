use serde::{Deserialize, Serialize};

/// A snapshot of a cache's counters and the figures derived from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub accesses: u64,
    pub miss_rate: f64,
    pub amat: f64,
}

/// Fraction of accesses which missed, zero before the first access
pub fn miss_rate(hits: u64, misses: u64) -> f64 {
    let accesses = hits + misses;
    if accesses == 0 {
        return 0.0;
    }
    misses as f64 / accesses as f64
}
