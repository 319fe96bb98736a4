use std::collections::TryReserveError;

use log::{debug, trace};

use crate::address::AddressDecoder;
use crate::config::{CacheConfig, CacheGeometry, ReplacementPolicyConfig};
use crate::error::ConfigError;
use crate::replacement_policies::{GenericPolicy, ReplacementPolicy};
use crate::stats::{self, CacheStats};
use crate::storage::BackingStore;
use crate::timing::{self, TimingMode};

/// Metadata for one way of a set. There is no data, the model only tracks residency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u64,
    /// Logical time of the last hit or insertion
    pub last_used: u64,
    /// Logical time the current block was brought in
    pub inserted_at: u64,
}

/// A fixed number of lines, indexed by way
#[derive(Debug, Clone)]
pub struct CacheSet {
    lines: Box<[CacheLine]>,
}

impl CacheSet {
    fn new(associativity: usize) -> Result<Self, TryReserveError> {
        let mut lines = Vec::new();
        lines.try_reserve_exact(associativity)?;
        lines.resize(associativity, CacheLine::default());
        Ok(Self {
            lines: lines.into_boxed_slice(),
        })
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    fn find(&self, tag: u64) -> Option<usize> {
        self.lines.iter().position(|line| line.valid && line.tag == tag)
    }

    fn first_invalid(&self) -> Option<usize> {
        self.lines.iter().position(|line| !line.valid)
    }

    fn flush(&mut self) {
        self.lines.fill(CacheLine::default());
    }
}

/// A read-only set-associative cache with a replacement policy and a timing model
///
/// Every access advances a logical clock, which stamps lines on hits and insertions so LRU and
/// FIFO can compare them. The replacement policy is held by value, including the generator state
/// of the random policy, so caches share nothing and can be run on separate threads without any
/// synchronisation
///
/// # Examples
///
/// ```
/// use cachemodel::cache::Cache;
/// use cachemodel::config::CacheConfig;
/// use cachemodel::timing::TimingMode;
/// let mut cache = Cache::new(&CacheConfig::new(1024, 64, 1, 1, TimingMode::flat(100))).unwrap();
/// assert_eq!(cache.access(0), (false, 101));
/// assert_eq!(cache.access(0), (true, 1));
/// ```
#[derive(Debug, Clone)]
pub struct Cache {
    geometry: CacheGeometry,
    decoder: AddressDecoder,
    hit_latency: u64,
    timing: TimingMode,
    policy_kind: ReplacementPolicyConfig,
    policy: GenericPolicy,
    sets: Vec<CacheSet>,
    access_counter: u64,
    hits: u64,
    misses: u64,
}

impl Cache {
    /// Builds an empty cache, with every line invalid
    ///
    /// Fails if the geometry is inconsistent, in which case nothing is allocated, or if the line
    /// metadata can't be allocated
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let geometry = config.validate()?;
        debug!(
            "Building {}B cache: {}B lines, {}-way, {} sets, {} policy, {:?}",
            geometry.cache_size_bytes,
            geometry.line_size_bytes,
            geometry.associativity,
            geometry.num_sets,
            config.policy,
            config.timing
        );
        let sets = allocate_sets(&geometry)?;
        Ok(Self {
            decoder: AddressDecoder::new(geometry.line_size_bytes, geometry.num_sets),
            hit_latency: config.hit_latency_cycles,
            timing: config.timing,
            policy_kind: config.policy,
            policy: config.policy.to_policy(&geometry),
            geometry,
            sets,
            access_counter: 0,
            hits: 0,
            misses: 0,
        })
    }

    /// Reads the line holding `address`, returning whether it hit and the cycles it took
    ///
    /// On a miss the block is always brought in, replacing an invalid line if the set has one and
    /// the policy's victim otherwise
    pub fn access(&mut self, address: u64) -> (bool, u64) {
        self.access_counter += 1;
        let now = self.access_counter;
        let (tag, index) = self.decoder.split(address);
        let set = &mut self.sets[index as usize];

        if let Some(way) = set.find(tag) {
            self.hits += 1;
            set.lines[way].last_used = now;
            return (true, self.hit_latency);
        }

        self.misses += 1;
        let way = match set.first_invalid() {
            Some(way) => way,
            None => {
                let way = self.policy.pick_victim(&set.lines);
                trace!(
                    "Evicting tag {:#x} from set {index} way {way} for tag {tag:#x}",
                    set.lines[way].tag
                );
                way
            }
        };
        set.lines[way] = CacheLine {
            valid: true,
            tag,
            last_used: now,
            inserted_at: now,
        };
        (false, self.hit_latency.saturating_add(self.effective_miss_penalty()))
    }

    /// Zeroes the counters and the logical clock, and invalidates every line
    ///
    /// The random policy is reseeded too, so a reset cache behaves exactly like a new one
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.access_counter = 0;
        self.sets.iter_mut().for_each(CacheSet::flush);
        self.policy.reset();
    }

    /// Cycles added to the hit latency by a miss
    pub fn effective_miss_penalty(&self) -> u64 {
        self.timing.miss_penalty(self.geometry.line_size_bytes)
    }

    pub fn get_hits(&self) -> u64 {
        self.hits
    }

    pub fn get_misses(&self) -> u64 {
        self.misses
    }

    pub fn get_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn get_miss_rate(&self) -> f64 {
        stats::miss_rate(self.hits, self.misses)
    }

    pub fn get_amat(&self) -> f64 {
        timing::amat(self.hit_latency, self.get_miss_rate(), self.effective_miss_penalty())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            accesses: self.get_accesses(),
            miss_rate: self.get_miss_rate(),
            amat: self.get_amat(),
        }
    }

    pub fn get_geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    pub fn get_decoder(&self) -> &AddressDecoder {
        &self.decoder
    }

    pub fn get_timing(&self) -> &TimingMode {
        &self.timing
    }

    pub fn get_policy(&self) -> ReplacementPolicyConfig {
        self.policy_kind
    }

    pub fn get_hit_latency(&self) -> u64 {
        self.hit_latency
    }

    pub fn get_line_size(&self) -> u64 {
        self.geometry.line_size_bytes
    }

    pub fn get_access_counter(&self) -> u64 {
        self.access_counter
    }

    /// The lines of one set, for inspection
    pub fn get_set(&self, index: u64) -> Option<&CacheSet> {
        self.sets.get(index as usize)
    }

    /// Gets the number of valid cache lines. Useful for analysing cache performance or debugging
    pub fn get_valid_line_count(&self) -> usize {
        self.sets
            .iter()
            .flat_map(|set| set.lines.iter())
            .filter(|line| line.valid)
            .count()
    }
}

// validate() has already bounded both counts by the address space
fn allocate_sets(geometry: &CacheGeometry) -> Result<Vec<CacheSet>, ConfigError> {
    let out_of_memory = |e: TryReserveError| {
        ConfigError::InvalidConfiguration(format!(
            "couldn't allocate {} sets of {} lines: {e}",
            geometry.num_sets, geometry.associativity
        ))
    };
    let mut sets = Vec::new();
    sets.try_reserve_exact(geometry.num_sets as usize).map_err(out_of_memory)?;
    for _ in 0..geometry.num_sets {
        sets.push(CacheSet::new(geometry.associativity as usize).map_err(out_of_memory)?);
    }
    Ok(sets)
}

impl BackingStore for Cache {
    fn access(&mut self, address: u64) -> (bool, u64) {
        Cache::access(self, address)
    }

    fn reset_stats(&mut self) {
        Cache::reset_stats(self)
    }
}
