//! Synthetic address traces
//!
//! Each generator is a lazy iterator of byte addresses. They know nothing about the cache they
//! feed, apart from the same-set conflict pattern which is parameterised by the cache size so its
//! addresses collide

use cachemodel::BackingStore;
use serde::{Deserialize, Serialize};

/// `0, step, 2 * step, ...` up to (not including) `bytes`
///
/// Strong spatial locality, no temporal reuse beyond a line
pub fn stream_sequential(bytes: u64, step_bytes: u64) -> impl Iterator<Item = u64> {
    let count = if step_bytes == 0 { 0 } else { bytes.div_ceil(step_bytes) };
    (0..count).map(move |i| i * step_bytes)
}

/// The sequential walk over a working set, repeated `passes` times
///
/// Shows capacity effects: once the working set fits, only the first pass misses
pub fn reuse_working_set(working_set_bytes: u64, step_bytes: u64, passes: u64) -> impl Iterator<Item = u64> {
    (0..passes).flat_map(move |_| stream_sequential(working_set_bytes, step_bytes))
}

/// Cycles through `hot_lines` addresses spaced `cache_size_bytes` apart, which all map to set 0
pub fn same_set_conflict(cache_size_bytes: u64, hot_lines: u64, accesses: u64) -> impl Iterator<Item = u64> {
    let count = if hot_lines == 0 { 0 } else { accesses };
    (0..count).map(move |i| (i % hot_lines).wrapping_mul(cache_size_bytes))
}

/// Starts at 0 and advances by `stride_bytes`, wrapping within the working set
pub fn stride_walk(working_set_bytes: u64, stride_bytes: u64, accesses: u64) -> impl Iterator<Item = u64> {
    let count = if working_set_bytes == 0 { 0 } else { accesses };
    (0..count).scan(0u64, move |address, _| {
        let current = *address;
        *address = ((current as u128 + stride_bytes as u128) % working_set_bytes as u128) as u64;
        Some(current)
    })
}

/// A named trace generator and its parameters, as used in sweep plans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceSpec {
    StreamSequential {
        bytes: u64,
        step_bytes: u64,
    },
    ReuseWorkingSet {
        working_set_bytes: u64,
        step_bytes: u64,
        passes: u64,
    },
    SameSetConflict {
        cache_size_bytes: u64,
        hot_lines: u64,
        accesses: u64,
    },
    StrideWalk {
        working_set_bytes: u64,
        stride_bytes: u64,
        accesses: u64,
    },
}

impl TraceSpec {
    /// The label written to the `trace` column
    pub fn label(&self) -> &'static str {
        match self {
            TraceSpec::StreamSequential { .. } => "stream_sequential",
            TraceSpec::ReuseWorkingSet { .. } => "reuse_working_set",
            TraceSpec::SameSetConflict { .. } => "same_set_conflict",
            TraceSpec::StrideWalk { .. } => "stride_walk",
        }
    }

    /// Working set in KiB for the traces which have one, otherwise 0
    pub fn working_set_kb(&self) -> u64 {
        match self {
            TraceSpec::ReuseWorkingSet { working_set_bytes, .. }
            | TraceSpec::StrideWalk { working_set_bytes, .. } => working_set_bytes / 1024,
            _ => 0,
        }
    }

    /// Stride for stride walks, otherwise 0
    pub fn stride_bytes(&self) -> u64 {
        match self {
            TraceSpec::StrideWalk { stride_bytes, .. } => *stride_bytes,
            _ => 0,
        }
    }

    /// Feeds every address of the trace to `store`, returning the number of accesses made
    pub fn replay<S: BackingStore + ?Sized>(&self, store: &mut S) -> u64 {
        match *self {
            TraceSpec::StreamSequential { bytes, step_bytes } => feed(store, stream_sequential(bytes, step_bytes)),
            TraceSpec::ReuseWorkingSet {
                working_set_bytes,
                step_bytes,
                passes,
            } => feed(store, reuse_working_set(working_set_bytes, step_bytes, passes)),
            TraceSpec::SameSetConflict {
                cache_size_bytes,
                hot_lines,
                accesses,
            } => feed(store, same_set_conflict(cache_size_bytes, hot_lines, accesses)),
            TraceSpec::StrideWalk {
                working_set_bytes,
                stride_bytes,
                accesses,
            } => feed(store, stride_walk(working_set_bytes, stride_bytes, accesses)),
        }
    }
}

fn feed<S: BackingStore + ?Sized>(store: &mut S, addresses: impl Iterator<Item = u64>) -> u64 {
    let mut count = 0;
    for address in addresses {
        store.access(address);
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachemodel::{Memory, MemoryTiming};

    #[test]
    fn sequential_stops_before_the_end() {
        assert_eq!(stream_sequential(16, 4).collect::<Vec<_>>(), [0, 4, 8, 12]);
        assert_eq!(stream_sequential(17, 4).collect::<Vec<_>>(), [0, 4, 8, 12, 16]);
        assert_eq!(stream_sequential(16, 0).count(), 0);
    }

    #[test]
    fn reuse_repeats_the_walk() {
        assert_eq!(reuse_working_set(8, 4, 3).collect::<Vec<_>>(), [0, 4, 0, 4, 0, 4]);
        assert_eq!(reuse_working_set(8, 4, 0).count(), 0);
    }

    #[test]
    fn conflict_cycles_hot_lines() {
        assert_eq!(same_set_conflict(1024, 3, 7).collect::<Vec<_>>(), [0, 1024, 2048, 0, 1024, 2048, 0]);
        assert_eq!(same_set_conflict(1024, 0, 7).count(), 0);
    }

    #[test]
    fn stride_wraps_within_working_set() {
        assert_eq!(stride_walk(256, 96, 5).collect::<Vec<_>>(), [0, 96, 192, 32, 128]);
        assert_eq!(stride_walk(0, 96, 5).count(), 0);
        // Access counts beyond 32 bits are not truncated
        assert_eq!(stride_walk(256, 64, 1 << 40).take(5).collect::<Vec<_>>(), [0, 64, 128, 192, 0]);
        assert_eq!(stride_walk(256, 64, (1 << 32) + 2).nth(3), Some(192));
        assert_eq!(stride_walk(u64::MAX, u64::MAX - 1, 3).collect::<Vec<_>>(), [0, u64::MAX - 1, u64::MAX - 2]);
    }

    #[test]
    fn trace_metadata() {
        let stride = TraceSpec::StrideWalk {
            working_set_bytes: 32 * 1024,
            stride_bytes: 128,
            accesses: 10,
        };
        assert_eq!((stride.label(), stride.working_set_kb(), stride.stride_bytes()), ("stride_walk", 32, 128));
        let conflict = TraceSpec::SameSetConflict {
            cache_size_bytes: 32 * 1024,
            hot_lines: 5,
            accesses: 10,
        };
        assert_eq!((conflict.label(), conflict.working_set_kb(), conflict.stride_bytes()), ("same_set_conflict", 0, 0));
    }

    #[test]
    fn replay_feeds_any_backing_store() {
        let mut memory = Memory::new(MemoryTiming { fixed_latency_cycles: 1, bytes_per_cycle: 1 }, 64);
        let trace = TraceSpec::ReuseWorkingSet {
            working_set_bytes: 1024,
            step_bytes: 4,
            passes: 2,
        };
        assert_eq!(trace.replay(&mut memory), 512);
        assert_eq!(memory.get_accesses(), 512);
    }

    #[test]
    fn trace_from_json() -> Result<(), serde_json::Error> {
        let trace: TraceSpec = serde_json::from_str(r#"{"kind": "stream_sequential", "bytes": 1024, "step_bytes": 4}"#)?;
        assert_eq!(trace, TraceSpec::StreamSequential { bytes: 1024, step_bytes: 4 });
        Ok(())
    }
}
