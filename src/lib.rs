//! # Lazy Stream Pipelines
//!
//! Single-use, lazily evaluated pipelines over a sequence of elements, with an
//! optional parallel mode backed by a shared worker pool.
//!
//! ## Part 1: Building a pipeline
//! - [`Stream::of`], [`Stream::range`], [`IntoStream::into_stream`]
//! - Intermediate stages: `filter`, `map`, `flat_map`, `peek`, `sorted`, `limit`, `skip`
//! - Nothing runs until a terminal operation is called
//!
//! ## Part 2: Terminal operations
//! - `for_each`, `find_first`, `any_match` / `all_match` / `none_match`
//! - Three forms of `reduce` (pairwise, from an identity, into another type)
//! - `collect` with a [`Collector`]; ready-made ones live in [`collectors`]
//! - A pipeline runs once; a second terminal gets [`StreamError::AlreadyConsumed`]
//!
//! ## Part 3: Parallel pipelines
//! - [`Stream::parallel`] / [`IntoStream::into_par_stream`] produce a [`ParStream`]
//! - The source is split into contiguous partitions evaluated on the worker pool
//! - Partition results are merged in order, so associative reductions are deterministic
//! - Pool sizing comes from [`StreamConfig`], resolved once per process ([`pool`])
//!
//! ```
//! use lazy_stream::{IntoStream, Stream};
//!
//! let shouted = Stream::of(vec!["a1", "a2", "b1", "c2", "c1"])
//!     .filter(|s| s.starts_with('c'))
//!     .map(|s| s.to_uppercase())
//!     .sorted()
//!     .to_list()
//!     .unwrap();
//! assert_eq!(shouted, vec!["C1", "C2"]);
//!
//! let total = (1..=100i64).into_par_stream().reduce_from(0, |a, b| a + b).unwrap();
//! assert_eq!(total, 5050);
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod optional;
pub mod parallel;
mod partition;
pub mod pool;
pub mod stage;
pub mod stats;
pub mod stream;

pub use collectors::Collector;
pub use config::StreamConfig;
pub use error::{Result, StreamError};
pub use optional::Optional;
pub use parallel::ParStream;
pub use stats::IntSummaryStatistics;
pub use stream::{IntoStream, Stream, StreamSupplier};
