use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheLine, CacheSet};
use crate::error::ConfigError;
use crate::replacement_policies::{FirstInFirstOut, GenericPolicy, LeastRecentlyUsed, Random};
use crate::timing::TimingMode;

/// A configuration for a single cache. Immutable once a cache is built from it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub cache_size_bytes: u64,
    pub line_size_bytes: u64,
    pub associativity: u64,
    pub hit_latency_cycles: u64,
    pub timing: TimingMode,
    #[serde(default = "ReplacementPolicyConfig::default")]
    pub policy: ReplacementPolicyConfig,
}

/// The replacement policy - lru, fifo, or random. Defaults to lru.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[serde(alias = "lru", alias = "LRU")]
    LeastRecentlyUsed,
    #[serde(alias = "fifo", alias = "FIFO")]
    FirstInFirstOut,
    #[serde(alias = "random", alias = "RANDOM")]
    Random,
}

impl Default for ReplacementPolicyConfig {
    fn default() -> Self {
        ReplacementPolicyConfig::LeastRecentlyUsed
    }
}

impl ReplacementPolicyConfig {
    pub const ALL: [ReplacementPolicyConfig; 3] = [
        ReplacementPolicyConfig::LeastRecentlyUsed,
        ReplacementPolicyConfig::FirstInFirstOut,
        ReplacementPolicyConfig::Random,
    ];

    /// Short upper case name, as used in result tables
    pub fn name(&self) -> &'static str {
        match self {
            ReplacementPolicyConfig::LeastRecentlyUsed => "LRU",
            ReplacementPolicyConfig::FirstInFirstOut => "FIFO",
            ReplacementPolicyConfig::Random => "RANDOM",
        }
    }

    /// Creates the policy state for a cache with the given geometry
    pub(crate) fn to_policy(self, geometry: &CacheGeometry) -> GenericPolicy {
        match self {
            ReplacementPolicyConfig::LeastRecentlyUsed => LeastRecentlyUsed.into(),
            ReplacementPolicyConfig::FirstInFirstOut => FirstInFirstOut.into(),
            ReplacementPolicyConfig::Random => Random::new(
                geometry.cache_size_bytes,
                geometry.line_size_bytes,
                geometry.associativity,
            )
            .into(),
        }
    }
}

impl fmt::Display for ReplacementPolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The validated shape of a cache
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheGeometry {
    pub cache_size_bytes: u64,
    pub line_size_bytes: u64,
    pub associativity: u64,
    pub num_sets: u64,
}

impl CacheConfig {
    /// A configuration using the default (LRU) replacement policy
    pub fn new(
        cache_size_bytes: u64,
        line_size_bytes: u64,
        associativity: u64,
        hit_latency_cycles: u64,
        timing: TimingMode,
    ) -> Self {
        Self {
            cache_size_bytes,
            line_size_bytes,
            associativity,
            hit_latency_cycles,
            timing,
            policy: ReplacementPolicyConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReplacementPolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    /// Checks the geometry constraints and derives the number of sets
    ///
    /// # Examples
    ///
    /// ```
    /// use cachemodel::config::CacheConfig;
    /// use cachemodel::timing::TimingMode;
    /// let geometry = CacheConfig::new(1024, 64, 1, 1, TimingMode::flat(100)).validate().unwrap();
    /// assert_eq!(geometry.num_sets, 16);
    /// assert!(CacheConfig::new(1000, 64, 1, 1, TimingMode::flat(100)).validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<CacheGeometry, ConfigError> {
        if self.line_size_bytes == 0 || self.associativity == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "line_size_bytes and associativity must be > 0".to_string(),
            ));
        }
        let set_bytes = self
            .line_size_bytes
            .checked_mul(self.associativity)
            .ok_or_else(|| {
                ConfigError::InvalidConfiguration(format!(
                    "line_size_bytes ({}) * associativity ({}) overflows",
                    self.line_size_bytes, self.associativity
                ))
            })?;
        if self.cache_size_bytes == 0 || self.cache_size_bytes % set_bytes != 0 {
            return Err(ConfigError::InvalidConfiguration(format!(
                "cache_size_bytes ({}) must be a non-zero multiple of line_size_bytes * associativity ({set_bytes})",
                self.cache_size_bytes
            )));
        }
        let num_sets = self.cache_size_bytes / set_bytes;
        if num_sets == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "num_sets computed as 0".to_string(),
            ));
        }
        if !fits_in_memory(num_sets, self.associativity) {
            return Err(ConfigError::InvalidConfiguration(format!(
                "{num_sets} sets of {} lines can't be addressed on this platform",
                self.associativity
            )));
        }
        Ok(CacheGeometry {
            cache_size_bytes: self.cache_size_bytes,
            line_size_bytes: self.line_size_bytes,
            associativity: self.associativity,
            num_sets,
        })
    }
}

/// Whether the line metadata for this geometry stays within the largest possible allocation
fn fits_in_memory(num_sets: u64, associativity: u64) -> bool {
    let (Ok(sets), Ok(ways)) = (usize::try_from(num_sets), usize::try_from(associativity)) else {
        return false;
    };
    let line_bytes = sets
        .checked_mul(ways)
        .and_then(|lines| lines.checked_mul(std::mem::size_of::<CacheLine>()));
    let set_bytes = sets.checked_mul(std::mem::size_of::<CacheSet>());
    matches!(
        (line_bytes, set_bytes),
        (Some(lines), Some(sets)) if lines <= isize::MAX as usize && sets <= isize::MAX as usize
    )
}
