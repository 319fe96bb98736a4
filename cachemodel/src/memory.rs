use crate::storage::BackingStore;
use crate::timing::MemoryTiming;

/// Main memory: the last level, which never hits but always services the request
#[derive(Debug, Clone)]
pub struct Memory {
    timing: MemoryTiming,
    line_size: u64,
    accesses: u64,
}

impl Memory {
    /// `line_size_bytes` is the transfer granularity, normally the line size of the cache above
    pub fn new(timing: MemoryTiming, line_size_bytes: u64) -> Self {
        Self {
            timing,
            line_size: line_size_bytes,
            accesses: 0,
        }
    }

    pub fn get_accesses(&self) -> u64 {
        self.accesses
    }

    pub fn get_timing(&self) -> &MemoryTiming {
        &self.timing
    }

    pub fn get_line_size(&self) -> u64 {
        self.line_size
    }
}

impl BackingStore for Memory {
    fn access(&mut self, _address: u64) -> (bool, u64) {
        self.accesses += 1;
        (false, self.timing.miss_service_cycles(self.line_size))
    }

    fn reset_stats(&mut self) {
        self.accesses = 0;
    }
}
