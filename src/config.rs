//! Worker pool and partitioning settings.
//!
//! Settings come from defaults, an optional TOML file, and the
//! `LAZY_STREAM_PARALLELISM` environment variable. They are resolved once, when
//! the shared worker pool is first needed (see [`crate::pool`]).

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

/// Overrides [`StreamConfig::parallelism`].
pub const PARALLELISM_ENV: &str = "LAZY_STREAM_PARALLELISM";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Worker threads in the shared pool; `None` means one per logical CPU.
    pub parallelism: Option<usize>,
    /// Leaf partitions per worker when splitting a parallel source.
    pub partitions_per_worker: usize,
    /// Parallel pipelines sort in parallel from this many elements on.
    pub parallel_sort_threshold: usize,
    pub thread_name_prefix: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            parallelism: None,
            partitions_per_worker: 4,
            parallel_sort_threshold: 1 << 13,
            thread_name_prefix: "stream-worker".to_string(),
        }
    }
}

impl StreamConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StreamConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies `LAZY_STREAM_PARALLELISM` when it is set.
    pub fn with_env_overrides(self) -> Result<Self> {
        let raw = env::var(PARALLELISM_ENV).ok();
        self.with_parallelism_override(raw.as_deref())
    }

    fn with_parallelism_override(mut self, raw: Option<&str>) -> Result<Self> {
        if let Some(raw) = raw {
            let workers = raw.trim().parse::<usize>().map_err(|err| {
                StreamError::InvalidConfig(format!("{}={:?}: {}", PARALLELISM_ENV, raw, err))
            })?;
            self.parallelism = Some(workers);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn worker_count(&self) -> usize {
        self.parallelism.unwrap_or_else(num_cpus::get)
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallelism == Some(0) {
            return Err(StreamError::InvalidConfig(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if self.partitions_per_worker == 0 {
            return Err(StreamError::InvalidConfig(
                "partitions_per_worker must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
