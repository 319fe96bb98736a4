//! # CacheModel
//!
//! CacheModel is a library for modelling the timing and hit/miss behaviour of a set-associative
//! cache under synthetic address traces
//!
//! It provides a cache with a selectable replacement policy and timing model, a terminal memory
//! level, and a small simulator walking both for an address stream. Everything is deterministic,
//! including the random replacement policy, so experiments can be repeated exactly

/// Decomposition of byte addresses into a tag and a set index
pub mod address;

/// Contains the implementation of the cache and its lines and sets
pub mod cache;

/// Contains the cache configuration, which can be deserialised from JSON, and its validation
pub mod config;

/// The error raised by invalid configurations
pub mod error;

/// The terminal memory level
pub mod memory;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator used to run an address stream through a cache and memory
pub mod simulator;

/// Counter snapshots and derived statistics
pub mod stats;

/// The capability shared by every level of the hierarchy
pub mod storage;

/// Miss penalty and AMAT calculations
pub mod timing;

#[cfg(test)]
mod test;

pub use cache::Cache;
pub use config::{CacheConfig, ReplacementPolicyConfig};
pub use error::ConfigError;
pub use memory::Memory;
pub use storage::BackingStore;
pub use timing::{MemoryTiming, TimingMode};
