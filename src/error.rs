//! Error type shared by every pipeline operation.

use thiserror::Error;

/// Failures a pipeline can report.
///
/// The first three variants are contract violations by the caller (re-using a
/// consumed pipeline, colliding keys in a key-unique map, reading an absent value).
/// The rest come from configuring the worker pool.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream has already been operated upon or closed")]
    AlreadyConsumed,

    #[error("Duplicate key {key} (attempted merging values {first} and {second})")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("No value present")]
    NoSuchElement,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker pool configuration has already been resolved")]
    PoolAlreadyInitialized,

    #[error("Failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub(crate) fn duplicate_key(
        key: &impl std::fmt::Debug,
        first: &impl std::fmt::Debug,
        second: &impl std::fmt::Debug,
    ) -> Self {
        StreamError::DuplicateKey {
            key: format!("{key:?}"),
            first: format!("{first:?}"),
            second: format!("{second:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
