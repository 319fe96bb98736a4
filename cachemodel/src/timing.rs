use serde::{Deserialize, Serialize};

/// A simple memory transfer model: a fixed latency to the first byte, then a sustained bandwidth
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTiming {
    /// Cycles before the first byte arrives (controller, interconnect, DRAM etc.)
    pub fixed_latency_cycles: u64,
    /// Bytes delivered per cycle once the transfer has started. Zero disables the transfer term
    pub bytes_per_cycle: u64,
}

impl MemoryTiming {
    /// Cycles needed to move `bytes` bytes, rounded up to whole cycles
    ///
    /// A bandwidth of zero is treated as a degenerate model where transfers are free
    ///
    /// # Examples
    ///
    /// ```
    /// use cachemodel::timing::MemoryTiming;
    /// let timing = MemoryTiming { fixed_latency_cycles: 60, bytes_per_cycle: 16 };
    /// assert_eq!(timing.transfer_cycles(64), 4);
    /// assert_eq!(timing.transfer_cycles(65), 5);
    /// ```
    pub fn transfer_cycles(&self, bytes: u64) -> u64 {
        if self.bytes_per_cycle == 0 {
            return 0;
        }
        bytes.div_ceil(self.bytes_per_cycle)
    }

    /// Total time to service a miss by fetching one line
    pub fn miss_service_cycles(&self, line_size_bytes: u64) -> u64 {
        self.fixed_latency_cycles.saturating_add(self.transfer_cycles(line_size_bytes))
    }
}

/// How the cost of a miss is derived. Chosen once when the cache is built
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimingMode {
    /// Every miss costs the same number of cycles
    Flat { miss_penalty_cycles: u64 },
    /// A miss costs the time to fetch one line from memory
    Bandwidth(MemoryTiming),
}

impl TimingMode {
    pub fn flat(miss_penalty_cycles: u64) -> Self {
        TimingMode::Flat { miss_penalty_cycles }
    }

    pub fn bandwidth(fixed_latency_cycles: u64, bytes_per_cycle: u64) -> Self {
        TimingMode::Bandwidth(MemoryTiming {
            fixed_latency_cycles,
            bytes_per_cycle,
        })
    }

    /// Cycles added to the hit latency on a miss, for a given line size
    pub fn miss_penalty(&self, line_size_bytes: u64) -> u64 {
        match self {
            TimingMode::Flat { miss_penalty_cycles } => *miss_penalty_cycles,
            TimingMode::Bandwidth(timing) => timing.miss_service_cycles(line_size_bytes),
        }
    }

    /// The memory model equivalent to this timing mode
    ///
    /// A flat penalty becomes a memory with that fixed latency and no transfer term, so a
    /// [`crate::memory::Memory`] built from it charges exactly the cache's miss penalty
    pub fn memory_timing(&self) -> MemoryTiming {
        match self {
            TimingMode::Flat { miss_penalty_cycles } => MemoryTiming {
                fixed_latency_cycles: *miss_penalty_cycles,
                bytes_per_cycle: 0,
            },
            TimingMode::Bandwidth(timing) => *timing,
        }
    }
}

/// Average memory access time in cycles
pub fn amat(hit_latency_cycles: u64, miss_rate: f64, miss_penalty_cycles: u64) -> f64 {
    hit_latency_cycles as f64 + miss_rate * miss_penalty_cycles as f64
}
