use thiserror::Error;

/// The only way building a cache can fail
///
/// Raised synchronously by [`crate::cache::Cache::new`] before any set is allocated. A
/// configuration which produces this error is unusable as given, callers should skip it rather
/// than adjust the parameters and retry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}
