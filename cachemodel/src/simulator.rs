use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::memory::Memory;
use crate::stats::CacheStats;
use crate::storage::BackingStore;

/// Runs address streams through a cache backed by main memory, and collects results.
///
/// It supports calling simulate multiple times, and will update the time taken to simulate and the
/// results accordingly
pub struct Simulator {
    cache: Cache,
    memory: Memory,
    result: SimulationResult,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised for output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub main_memory_accesses: u64,
    /// Sum of the latencies seen by the requester
    pub total_cycles: u64,
    pub cache: CacheStats,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// The memory level is derived from the cache's timing mode, so it charges exactly the
    /// cache's miss penalty for each line it supplies
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        let cache = Cache::new(config)?;
        let memory = Memory::new(config.timing.memory_timing(), config.line_size_bytes);
        let result = SimulationResult {
            main_memory_accesses: 0,
            total_cycles: 0,
            cache: cache.stats(),
        };
        Ok(Self {
            cache,
            memory,
            result,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Reads one address, walking down the levels until one of them hits
    ///
    /// The first level's latency already covers servicing its miss, so only it is charged to the
    /// requester, lower levels only count the request
    fn read(&mut self, address: u64) {
        let levels: [&mut dyn BackingStore; 2] = [&mut self.cache, &mut self.memory];
        for (depth, level) in levels.into_iter().enumerate() {
            let (hit, latency) = level.access(address);
            if depth == 0 {
                self.result.total_cycles = self.result.total_cycles.saturating_add(latency);
            }
            if hit {
                break;
            }
        }
    }

    /// Simulates the cache over a stream of byte addresses
    ///
    /// # Arguments
    ///
    /// * `addresses`: The addresses to read, in order
    ///
    /// returns: &SimulationResult
    pub fn simulate<I: IntoIterator<Item = u64>>(&mut self, addresses: I) -> &SimulationResult {
        let start = Instant::now();
        for address in addresses {
            self.read(address);
        }
        self.simulation_time += start.elapsed();
        self.result.main_memory_accesses = self.memory.get_accesses();
        self.result.cache = self.cache.stats();
        &self.result
    }

    /// Resets both levels and the collected results, but not the execution time
    pub fn reset(&mut self) {
        let levels: [&mut dyn BackingStore; 2] = [&mut self.cache, &mut self.memory];
        for level in levels {
            level.reset_stats();
        }
        self.result = SimulationResult {
            main_memory_accesses: 0,
            total_cycles: 0,
            cache: self.cache.stats(),
        };
    }

    pub fn get_result(&self) -> &SimulationResult {
        &self.result
    }

    pub fn get_cache(&self) -> &Cache {
        &self.cache
    }

    pub fn get_memory(&self) -> &Memory {
        &self.memory
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }
}
