use std::io::Write;

use cachemodel::{Cache, CacheConfig};
use serde::{Serialize, Serializer};

use crate::traces::TraceSpec;

/// Column names, in output order
pub const HEADER: [&str; 14] = [
    "experiment",
    "cache_kb",
    "line_size",
    "assoc",
    "hit_latency",
    "miss_penalty",
    "policy",
    "trace",
    "working_set_kb",
    "stride_bytes",
    "miss_rate",
    "amat",
    "hits",
    "misses",
];

/// One experiment's configuration, workload and outcome. Field order matches [`HEADER`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub experiment: String,
    pub cache_kb: u64,
    pub line_size: u64,
    pub assoc: u64,
    pub hit_latency: u64,
    /// The effective miss penalty, which for bandwidth timing depends on the line size
    pub miss_penalty: u64,
    pub policy: &'static str,
    pub trace: &'static str,
    pub working_set_kb: u64,
    pub stride_bytes: u64,
    #[serde(serialize_with = "six_places")]
    pub miss_rate: f64,
    #[serde(serialize_with = "three_places")]
    pub amat: f64,
    pub hits: u64,
    pub misses: u64,
}

impl ResultRow {
    /// Reads the outcome back from a cache which has just run `trace`
    pub fn new(experiment: &str, config: &CacheConfig, trace: &TraceSpec, cache: &Cache) -> Self {
        Self {
            experiment: experiment.to_string(),
            cache_kb: config.cache_size_bytes / 1024,
            line_size: config.line_size_bytes,
            assoc: config.associativity,
            hit_latency: config.hit_latency_cycles,
            miss_penalty: cache.effective_miss_penalty(),
            policy: config.policy.name(),
            trace: trace.label(),
            working_set_kb: trace.working_set_kb(),
            stride_bytes: trace.stride_bytes(),
            miss_rate: cache.get_miss_rate(),
            amat: cache.get_amat(),
            hits: cache.get_hits(),
            misses: cache.get_misses(),
        }
    }
}

fn six_places<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.6}"))
}

fn three_places<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{value:.3}"))
}

/// Writes result rows as CSV. The header is written up front, so even an empty sweep produces a
/// well formed table
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W) -> Result<Self, csv::Error> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    pub fn write_row(&mut self, row: &ResultRow) -> Result<(), csv::Error> {
        self.writer.serialize(row)
    }

    /// Flushes and returns the underlying writer
    pub fn finish(self) -> Result<W, String> {
        self.writer.into_inner().map_err(|e| format!("Couldn't flush the results: {}", e.error()))
    }
}
