//! The shared worker pool behind parallel pipelines.
//!
//! By default every parallel pipeline in the process runs on rayon's global pool.
//! Its size is fixed the first time it is needed, from [`configure`] if that was
//! called first, otherwise from defaults plus the `LAZY_STREAM_PARALLELISM`
//! override. All parallel pipelines contend for the same workers, so one slow
//! pipeline delays the others. A pipeline that needs isolation can run on a
//! private [`WorkerPool`] from [`build_pool`] via `ParStream::with_pool`; it is
//! partitioned and sorted by that pool's own settings and never resolves the
//! process-wide ones.

use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::OnceCell;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{StreamConfig, PARALLELISM_ENV};
use crate::error::{Result, StreamError};

static CONFIG: OnceCell<StreamConfig> = OnceCell::new();

/// A private thread pool together with the settings it was built from.
pub struct WorkerPool {
    threads: ThreadPool,
    config: StreamConfig,
}

impl WorkerPool {
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn current_num_threads(&self) -> usize {
        self.threads.current_num_threads()
    }

    /// Runs `op` inside this pool.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.threads.install(op)
    }
}

/// Fixes the process-wide settings and builds the global pool.
///
/// Fails with [`StreamError::PoolAlreadyInitialized`] once the settings were
/// resolved, whether by an earlier call or by a parallel pipeline running first.
pub fn configure(config: StreamConfig) -> Result<()> {
    config.validate()?;
    let mut installed = None;
    CONFIG.get_or_init(|| {
        installed = Some(install_global(&config));
        config
    });
    installed.unwrap_or(Err(StreamError::PoolAlreadyInitialized))
}

/// Resolved process-wide settings.
pub fn config() -> &'static StreamConfig {
    CONFIG.get_or_init(|| {
        let config = StreamConfig::default()
            .with_env_overrides()
            .unwrap_or_else(|err| {
                warn!("ignoring {}: {}", PARALLELISM_ENV, err);
                StreamConfig::default()
            });
        if let Err(err) = install_global(&config) {
            warn!("global worker pool was built elsewhere: {}", err);
        }
        config
    })
}

/// Number of workers available to the calling context.
pub fn parallelism() -> usize {
    config();
    rayon::current_num_threads()
}

/// A private pool, independent of the global one.
pub fn build_pool(config: &StreamConfig) -> Result<Arc<WorkerPool>> {
    config.validate()?;
    let threads = builder(config).build()?;
    debug!("built private worker pool with {} workers", threads.current_num_threads());
    Ok(Arc::new(WorkerPool {
        threads,
        config: config.clone(),
    }))
}

fn builder(config: &StreamConfig) -> ThreadPoolBuilder {
    let prefix = config.thread_name_prefix.clone();
    ThreadPoolBuilder::new()
        .num_threads(config.worker_count())
        .thread_name(move |index| format!("{}-{}", prefix, index))
}

fn install_global(config: &StreamConfig) -> Result<()> {
    builder(config).build_global()?;
    debug!("global worker pool ready with {} workers", config.worker_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_resolves_once() {
        let first = config() as *const StreamConfig;
        let second = config() as *const StreamConfig;
        assert_eq!(first, second);
        assert!(parallelism() >= 1);
    }

    #[test]
    fn test_configure_after_resolution_fails() {
        config();
        assert!(matches!(
            configure(StreamConfig::default()),
            Err(StreamError::PoolAlreadyInitialized)
        ));
    }

    #[test]
    fn test_configure_rejects_invalid_settings() {
        let config = StreamConfig {
            parallelism: Some(0),
            ..StreamConfig::default()
        };
        assert!(matches!(configure(config), Err(StreamError::InvalidConfig(_))));
    }

    #[test]
    fn test_private_pool() {
        let config = StreamConfig {
            parallelism: Some(2),
            thread_name_prefix: "private".to_string(),
            ..StreamConfig::default()
        };
        let pool = build_pool(&config).unwrap();
        assert_eq!(pool.current_num_threads(), 2);
        assert_eq!(pool.config(), &config);

        let name = pool.install(|| std::thread::current().name().map(str::to_string));
        assert!(name.unwrap().starts_with("private-"));
    }
}
