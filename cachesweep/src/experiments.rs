use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use cachemodel::{Cache, CacheConfig, ConfigError, ReplacementPolicyConfig, TimingMode};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::results::ResultRow;
use crate::traces::TraceSpec;

/// One sweep point: a cache configuration and the trace to run against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experiment {
    pub name: String,
    pub cache: CacheConfig,
    pub trace: TraceSpec,
}

impl Experiment {
    /// Builds a fresh cache, runs the trace against it from empty and reads back the outcome
    pub fn run(&self) -> Result<ResultRow, ConfigError> {
        let mut cache = Cache::new(&self.cache)?;
        cache.reset_stats();
        let accesses = self.trace.replay(&mut cache);
        debug!(
            "{}: {} on {}KiB/{}B/{}-way {} -> {} hits, {} misses over {accesses} accesses",
            self.name,
            self.trace.label(),
            self.cache.cache_size_bytes / 1024,
            self.cache.line_size_bytes,
            self.cache.associativity,
            self.cache.policy,
            cache.get_hits(),
            cache.get_misses()
        );
        Ok(ResultRow::new(&self.name, &self.cache, &self.trace, &cache))
    }
}

/// An ordered list of experiments, which can be read from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentPlan {
    pub experiments: Vec<Experiment>,
}

const KIB: u64 = 1024;
const BASE_CACHE_KB: u64 = 32;
const BASE_LINE_SIZE: u64 = 64;
const BASE_ASSOC: u64 = 4;
const BASE_HIT_LATENCY: u64 = 1;
const BASE_MISS_PENALTY: u64 = 100;

const STREAM_BYTES: u64 = 1 << 20;
const STEP_WORD: u64 = 4;
const REUSE_PASSES: u64 = 50;
const REUSE_WORKING_SET_KB: u64 = 24;
const CONFLICT_ACCESSES: u64 = 200_000;
const STRIDE_ACCESSES: u64 = 200_000;
const STRIDE_WORKING_SET_KB: u64 = 32;

const MEMORY_FIXED_LATENCY: u64 = 60;
const MEMORY_BYTES_PER_CYCLE: u64 = 16;

fn base_cache() -> CacheConfig {
    CacheConfig::new(
        BASE_CACHE_KB * KIB,
        BASE_LINE_SIZE,
        BASE_ASSOC,
        BASE_HIT_LATENCY,
        TimingMode::flat(BASE_MISS_PENALTY),
    )
}

fn reuse(working_set_kb: u64) -> TraceSpec {
    TraceSpec::ReuseWorkingSet {
        working_set_bytes: working_set_kb * KIB,
        step_bytes: STEP_WORD,
        passes: REUSE_PASSES,
    }
}

/// `associativity + 1` lines fighting over one set
fn conflict(associativity: u64) -> TraceSpec {
    TraceSpec::SameSetConflict {
        cache_size_bytes: BASE_CACHE_KB * KIB,
        hot_lines: associativity + 1,
        accesses: CONFLICT_ACCESSES,
    }
}

impl ExperimentPlan {
    /// The standard study: a baseline, then one parameter varied at a time around it
    pub fn builtin() -> Self {
        let mut experiments = Vec::new();
        let mut push = |name: &str, cache: CacheConfig, trace: TraceSpec| {
            experiments.push(Experiment {
                name: name.to_string(),
                cache,
                trace,
            })
        };

        push("baseline", base_cache(), reuse(REUSE_WORKING_SET_KB));

        // Capacity
        for cache_kb in [4, 8, 16, 24, 32, 48, 64, 96, 128] {
            let cache = CacheConfig {
                cache_size_bytes: cache_kb * KIB,
                ..base_cache()
            };
            push("sweep_cache_size", cache, reuse(REUSE_WORKING_SET_KB));
        }

        // Conflicts
        for associativity in [1, 2, 4, 8, 16] {
            let cache = CacheConfig {
                associativity,
                ..base_cache()
            };
            push("sweep_associativity", cache, conflict(associativity));
        }

        // Spatial locality, with the miss cost growing with the line
        for line_size in [16, 32, 64, 128, 256] {
            let cache = CacheConfig {
                line_size_bytes: line_size,
                timing: TimingMode::bandwidth(MEMORY_FIXED_LATENCY, MEMORY_BYTES_PER_CYCLE),
                ..base_cache()
            };
            let trace = TraceSpec::StreamSequential {
                bytes: STREAM_BYTES,
                step_bytes: STEP_WORD,
            };
            push("sweep_line_size", cache, trace);
        }

        for policy in ReplacementPolicyConfig::ALL {
            push("sweep_policy_conflict", base_cache().with_policy(policy), conflict(BASE_ASSOC));
        }

        // Capacity curve, cache fixed
        for working_set_kb in [4, 8, 12, 16, 20, 24, 28, 32, 40, 48, 64, 96, 128] {
            push("sweep_working_set", base_cache(), reuse(working_set_kb));
        }

        // Direct mapped, so strides which are multiples of the set span collide
        for stride_bytes in [4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048] {
            let cache = CacheConfig {
                associativity: 1,
                ..base_cache()
            };
            let trace = TraceSpec::StrideWalk {
                working_set_bytes: STRIDE_WORKING_SET_KB * KIB,
                stride_bytes,
                accesses: STRIDE_ACCESSES,
            };
            push("sweep_stride", cache, trace);
        }

        // Timing sensitivity: miss rates stay put, AMAT moves
        for miss_penalty in [10, 25, 50, 75, 100, 150, 200, 300] {
            let cache = CacheConfig {
                timing: TimingMode::flat(miss_penalty),
                ..base_cache()
            };
            push("sweep_miss_penalty", cache, reuse(REUSE_WORKING_SET_KB));
        }

        for hit_latency in [1, 2, 3, 4, 5] {
            let cache = CacheConfig {
                hit_latency_cycles: hit_latency,
                ..base_cache()
            };
            push("sweep_hit_latency", cache, reuse(REUSE_WORKING_SET_KB));
        }

        for policy in ReplacementPolicyConfig::ALL {
            push("sweep_policy_locality", base_cache().with_policy(policy), reuse(REUSE_WORKING_SET_KB));
        }

        Self { experiments }
    }

    /// Runs every experiment on up to `jobs` threads and returns the rows in plan order
    ///
    /// Each worker builds and owns its caches, nothing is shared but the queue position. An
    /// experiment with an invalid configuration is skipped with a warning
    pub fn run(&self, jobs: usize) -> Vec<ResultRow> {
        let jobs = jobs.clamp(1, self.experiments.len().max(1));
        let next = AtomicUsize::new(0);
        let (snd, rec) = mpsc::channel::<(usize, Result<ResultRow, ConfigError>)>();

        thread::scope(|scope| {
            for _ in 0..jobs {
                let snd = snd.clone();
                let next = &next;
                scope.spawn(move || loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(experiment) = self.experiments.get(index) else {
                        break;
                    };
                    if snd.send((index, experiment.run())).is_err() {
                        break;
                    }
                });
            }
        });
        drop(snd);

        let mut outcomes: Vec<_> = rec.into_iter().collect();
        outcomes.sort_by_key(|(index, _)| *index);
        outcomes
            .into_iter()
            .filter_map(|(index, outcome)| match outcome {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("Skipping experiment {index} ({}): {e}", self.experiments[index].name);
                    None
                }
            })
            .collect()
    }
}
