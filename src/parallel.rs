//! The parallel pipeline.
//!
//! A [`ParStream`] records its stages as a push-based chain: each stage takes one
//! element, transforms it, and hands zero or more results to the next stage. The
//! source is only drained when a terminal operation runs. At that point it is cut
//! into contiguous partitions (see [`crate::partition`]) that the worker pool
//! evaluates independently, and the per-partition results are merged in
//! partition order.
//!
//! `sorted` is a barrier: everything above it is evaluated and sorted before any
//! element reaches the stages below it.

use std::cmp::Ordering;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;

use crate::collectors::Collector;
use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::optional::Optional;
use crate::partition::{self, Partition};
use crate::pool::{self, WorkerPool};
use crate::stage::Deferred;
use crate::stream::Stream;

type Source<S> = Box<dyn Iterator<Item = S> + Send>;

/// Runs one source element through every stage, pushing results into the sink.
/// A `Break` from the sink stops the element early.
type Chain<S, T> =
    Arc<dyn Fn(S, &mut dyn FnMut(T) -> ControlFlow<()>) -> ControlFlow<()> + Send + Sync>;

struct Pipeline<S, T> {
    source: Source<S>,
    chain: Chain<S, T>,
}

#[must_use = "streams are lazy and do nothing until a terminal operation runs"]
pub struct ParStream<S, T> {
    pipeline: Option<Pipeline<S, T>>,
    pool: Option<Arc<WorkerPool>>,
}

//==============================================================================
// Evaluation helpers
//==============================================================================

fn identity<S: 'static>() -> Chain<S, S> {
    Arc::new(|item: S, sink: &mut dyn FnMut(S) -> ControlFlow<()>| sink(item))
}

fn drain<S, T>(
    chain: &Chain<S, T>,
    items: Vec<S>,
    sink: &mut dyn FnMut(T) -> ControlFlow<()>,
) -> ControlFlow<()> {
    for item in items {
        if chain(item, sink).is_break() {
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Runs `job` on the given pool with that pool's settings, or on the global
/// pool with the process-wide settings.
fn run_in<R: Send>(workers: Option<&WorkerPool>, job: impl FnOnce(&StreamConfig) -> R + Send) -> R {
    match workers {
        Some(workers) => workers.install(|| job(workers.config())),
        None => job(pool::config()),
    }
}

impl<S: Send + 'static, T: Send + 'static> Pipeline<S, T> {
    /// Drains the source and cuts it up for the workers of the current pool.
    fn partitions(self, config: &StreamConfig) -> (Vec<Partition<S>>, Chain<S, T>) {
        let items: Vec<S> = self.source.collect();
        let total = items.len();
        let workers = rayon::current_num_threads();
        let leaf = partition::leaf_len(total, workers, config.partitions_per_worker);
        let parts = partition::split(items, leaf);
        debug!(
            "split {} elements into {} partitions of at most {} for {} workers",
            total,
            parts.len(),
            leaf,
            workers
        );
        (parts, self.chain)
    }

    /// Every output element, in encounter order.
    fn evaluate_ordered(self, config: &StreamConfig) -> Vec<T> {
        let (parts, chain) = self.partitions(config);
        let chunks: Vec<Vec<T>> = parts
            .into_par_iter()
            .map(|part| {
                let mut out = Vec::new();
                let _ = drain(&chain, part.items, &mut |value: T| {
                    out.push(value);
                    ControlFlow::Continue(())
                });
                out
            })
            .collect();
        chunks.into_iter().flatten().collect()
    }

    /// `true` as soon as any partition sees a matching element; the others
    /// give up at their next element.
    fn any<P>(self, config: &StreamConfig, predicate: &P) -> bool
    where
        P: Fn(&T) -> bool + Sync,
    {
        let (parts, chain) = self.partitions(config);
        let matched = AtomicBool::new(false);
        parts.into_par_iter().for_each(|part| {
            if matched.load(AtomicOrdering::Relaxed) {
                return;
            }
            let _ = drain(&chain, part.items, &mut |value: T| {
                if matched.load(AtomicOrdering::Relaxed) {
                    return ControlFlow::Break(());
                }
                if predicate(&value) {
                    matched.store(true, AtomicOrdering::Relaxed);
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            });
        });
        matched.into_inner()
    }
}

fn sort_items<T, C>(items: &mut [T], comparator: &C, config: &StreamConfig)
where
    T: Send,
    C: Fn(&T, &T) -> Ordering + Sync,
{
    if items.len() >= config.parallel_sort_threshold {
        trace!("parallel sort of {} elements", items.len());
        items.par_sort_by(|a, b| comparator(a, b));
    } else {
        items.sort_by(|a, b| comparator(a, b));
    }
}

//==============================================================================
// Construction and intermediate operations
//==============================================================================

impl<S: Send + 'static> ParStream<S, S> {
    pub(crate) fn from_source(source: Option<Source<S>>) -> Self {
        Self {
            pipeline: source.map(|source| Pipeline {
                source,
                chain: identity(),
            }),
            pool: None,
        }
    }
}

impl<S: Send + 'static, T: Send + 'static> ParStream<S, T> {
    pub fn is_consumed(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Runs terminal operations on `pool`, partitioned and sorted by its own
    /// settings, instead of the shared global pool.
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    fn link<U>(self, stage: impl FnOnce(Chain<S, T>) -> Chain<S, U>) -> ParStream<S, U> {
        ParStream {
            pipeline: self.pipeline.map(|pipeline| Pipeline {
                source: pipeline.source,
                chain: stage(pipeline.chain),
            }),
            pool: self.pool,
        }
    }

    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.link(move |upstream| -> Chain<S, T> {
            Arc::new(move |item: S, sink: &mut dyn FnMut(T) -> ControlFlow<()>| {
                upstream(item, &mut |value: T| {
                    if predicate(&value) {
                        sink(value)
                    } else {
                        ControlFlow::Continue(())
                    }
                })
            })
        })
    }

    pub fn map<U, F>(self, mapper: F) -> ParStream<S, U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.link(move |upstream| -> Chain<S, U> {
            Arc::new(move |item: S, sink: &mut dyn FnMut(U) -> ControlFlow<()>| {
                upstream(item, &mut |value: T| sink(mapper(value)))
            })
        })
    }

    pub fn flat_map<U, R, F>(self, mapper: F) -> ParStream<S, U>
    where
        U: Send + 'static,
        R: IntoIterator<Item = U>,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        self.link(move |upstream| -> Chain<S, U> {
            Arc::new(move |item: S, sink: &mut dyn FnMut(U) -> ControlFlow<()>| {
                upstream(item, &mut |value: T| {
                    for out in mapper(value) {
                        if sink(out).is_break() {
                            return ControlFlow::Break(());
                        }
                    }
                    ControlFlow::Continue(())
                })
            })
        })
    }

    /// `action` runs on whichever worker evaluates the element.
    pub fn peek<F>(self, action: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.link(move |upstream| -> Chain<S, T> {
            Arc::new(move |item: S, sink: &mut dyn FnMut(T) -> ControlFlow<()>| {
                upstream(item, &mut |value: T| {
                    action(&value);
                    sink(value)
                })
            })
        })
    }

    pub fn sorted(self) -> ParStream<T, T>
    where
        T: Ord,
    {
        self.sorted_by(|a: &T, b: &T| a.cmp(b))
    }

    /// Stable. Large inputs are sorted on the pool.
    pub fn sorted_by<C>(self, comparator: C) -> ParStream<T, T>
    where
        C: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        let pool = self.pool.clone();
        let source = self.pipeline.map(|pipeline| {
            Box::new(Deferred::new(move || {
                run_in(pool.as_deref(), move |config| {
                    let mut items = pipeline.evaluate_ordered(config);
                    sort_items(&mut items, &comparator, config);
                    items
                })
            })) as Source<T>
        });
        ParStream {
            pipeline: source.map(|source| Pipeline {
                source,
                chain: identity(),
            }),
            pool: self.pool,
        }
    }

    /// Back to a sequential stream. Stages recorded so far run on the thread
    /// that pulls from it.
    pub fn sequential(self) -> Stream<Box<dyn Iterator<Item = T> + Send>> {
        Stream::from_source(self.pipeline.map(|Pipeline { source, chain }| {
            Box::new(source.flat_map(move |item| {
                let mut out = Vec::new();
                let _ = chain(item, &mut |value: T| {
                    out.push(value);
                    ControlFlow::Continue(())
                });
                out
            })) as Box<dyn Iterator<Item = T> + Send>
        }))
    }

    //==========================================================================
    // Terminal operations
    //==========================================================================

    fn consume(&mut self, operation: &'static str) -> Result<Pipeline<S, T>> {
        match self.pipeline.take() {
            Some(pipeline) => {
                trace!("{}: evaluating parallel pipeline", operation);
                Ok(pipeline)
            }
            None => {
                debug!("{}: stream already consumed", operation);
                Err(StreamError::AlreadyConsumed)
            }
        }
    }

    fn run<R: Send>(&self, job: impl FnOnce(&StreamConfig) -> R + Send) -> R {
        run_in(self.pool.as_deref(), job)
    }

    /// Folds every partition from a fresh `identity()`, then merges the partial
    /// results left to right. `None` when there were no partitions.
    fn fold_partitions<U, ID, A, C>(
        &mut self,
        operation: &'static str,
        identity: ID,
        accumulator: A,
        combiner: C,
    ) -> Result<Option<U>>
    where
        U: Send,
        ID: Fn() -> U + Send + Sync,
        A: Fn(U, T) -> U + Send + Sync,
        C: Fn(U, U) -> U + Send + Sync,
    {
        let pipeline = self.consume(operation)?;
        Ok(self.run(move |config| {
            let (parts, chain) = pipeline.partitions(config);
            parts
                .into_par_iter()
                .filter_map(|part| {
                    let mut acc = Some(identity());
                    let _ = drain(&chain, part.items, &mut |value: T| {
                        acc = acc.take().map(|current| accumulator(current, value));
                        ControlFlow::Continue(())
                    });
                    acc
                })
                .reduce_with(|left, right| combiner(left, right))
        }))
    }

    /// Calls `action` concurrently, in no particular order.
    pub fn for_each<F>(&mut self, action: F) -> Result<()>
    where
        F: Fn(T) + Send + Sync,
    {
        let pipeline = self.consume("for_each")?;
        self.run(move |config| {
            let (parts, chain) = pipeline.partitions(config);
            parts.into_par_iter().for_each(|part| {
                let _ = drain(&chain, part.items, &mut |value: T| {
                    action(value);
                    ControlFlow::Continue(())
                });
            });
        });
        Ok(())
    }

    /// Evaluates in parallel, then calls `action` on the calling thread in
    /// encounter order.
    pub fn for_each_ordered<F>(&mut self, action: F) -> Result<()>
    where
        F: FnMut(T),
    {
        let pipeline = self.consume("for_each_ordered")?;
        let items = self.run(move |config| pipeline.evaluate_ordered(config));
        items.into_iter().for_each(action);
        Ok(())
    }

    /// The first element in encounter order, not merely the first one found.
    pub fn find_first(&mut self) -> Result<Optional<T>> {
        let pipeline = self.consume("find_first")?;
        let found = self.run(move |config| {
            let (parts, chain) = pipeline.partitions(config);
            let best = AtomicUsize::new(usize::MAX);
            let hits: Vec<Option<T>> = parts
                .into_par_iter()
                .map(|part| {
                    // an earlier partition already has a hit
                    if part.index > best.load(AtomicOrdering::Acquire) {
                        return None;
                    }
                    let mut hit = None;
                    let _ = drain(&chain, part.items, &mut |value: T| {
                        hit = Some(value);
                        ControlFlow::Break(())
                    });
                    if hit.is_some() {
                        best.fetch_min(part.index, AtomicOrdering::AcqRel);
                    }
                    hit
                })
                .collect();
            hits.into_iter().flatten().next()
        });
        Ok(found.into())
    }

    /// Any element, whichever partition produces one first.
    pub fn find_any(&mut self) -> Result<Optional<T>> {
        let pipeline = self.consume("find_any")?;
        let found = self.run(move |config| {
            let (parts, chain) = pipeline.partitions(config);
            parts.into_par_iter().find_map_any(|part| {
                let mut hit = None;
                let _ = drain(&chain, part.items, &mut |value: T| {
                    hit = Some(value);
                    ControlFlow::Break(())
                });
                hit
            })
        });
        Ok(found.into())
    }

    pub fn any_match<P>(&mut self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        let pipeline = self.consume("any_match")?;
        Ok(self.run(move |config| pipeline.any(config, &predicate)))
    }

    pub fn all_match<P>(&mut self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        let pipeline = self.consume("all_match")?;
        Ok(!self.run(move |config| pipeline.any(config, &|value: &T| !predicate(value))))
    }

    pub fn none_match<P>(&mut self, predicate: P) -> Result<bool>
    where
        P: Fn(&T) -> bool + Send + Sync,
    {
        let pipeline = self.consume("none_match")?;
        Ok(!self.run(move |config| pipeline.any(config, &predicate)))
    }

    pub fn count(&mut self) -> Result<usize> {
        let counted = self.fold_partitions("count", || 0usize, |n, _| n + 1, |a, b| a + b)?;
        Ok(counted.unwrap_or(0))
    }

    /// `op` must be associative; partition results are merged in order.
    pub fn reduce<F>(&mut self, op: F) -> Result<Optional<T>>
    where
        F: Fn(T, T) -> T + Send + Sync,
    {
        let folded = self.fold_partitions(
            "reduce",
            || None,
            |acc: Option<T>, value: T| {
                Some(match acc {
                    Some(prev) => op(prev, value),
                    None => value,
                })
            },
            |left: Option<T>, right: Option<T>| match (left, right) {
                (Some(a), Some(b)) => Some(op(a, b)),
                (a, None) => a,
                (None, b) => b,
            },
        )?;
        Ok(folded.flatten().into())
    }

    /// `identity` seeds every partition, so it must be neutral for `op`.
    pub fn reduce_from<F>(&mut self, identity: T, op: F) -> Result<T>
    where
        T: Clone + Sync,
        F: Fn(T, T) -> T + Send + Sync,
    {
        let seed = identity.clone();
        let folded = self.fold_partitions("reduce_from", move || seed.clone(), &op, &op)?;
        Ok(folded.unwrap_or(identity))
    }

    /// Folds every partition with `accumulator` and merges the partial results
    /// with `combiner`, which runs once per partition after the first.
    pub fn reduce_with<U, A, C>(&mut self, identity: U, accumulator: A, combiner: C) -> Result<U>
    where
        U: Clone + Send + Sync,
        A: Fn(U, T) -> U + Send + Sync,
        C: Fn(U, U) -> U + Send + Sync,
    {
        let seed = identity.clone();
        let folded =
            self.fold_partitions("reduce_with", move || seed.clone(), accumulator, combiner)?;
        Ok(folded.unwrap_or(identity))
    }

    /// Like [`reduce_with`](Self::reduce_with), but every partition starts from
    /// a fresh `identity()`, so `U` need not be `Clone`.
    pub fn reduce_with_supplier<U, ID, A, C>(
        &mut self,
        identity: ID,
        accumulator: A,
        combiner: C,
    ) -> Result<U>
    where
        U: Send,
        ID: Fn() -> U + Send + Sync,
        A: Fn(U, T) -> U + Send + Sync,
        C: Fn(U, U) -> U + Send + Sync,
    {
        let folded =
            self.fold_partitions("reduce_with_supplier", &identity, accumulator, combiner)?;
        Ok(folded.unwrap_or_else(|| identity()))
    }

    /// One container per partition, merged with the collector's combiner and
    /// finished once.
    pub fn collect<C>(&mut self, collector: C) -> Result<C::Output>
    where
        C: Collector<T> + Sync,
        C::Container: Send,
    {
        let folded = self.fold_partitions(
            "collect",
            || collector.supply(),
            |mut container, value| {
                collector.accumulate(&mut container, value);
                container
            },
            |left, right| collector.combine(left, right),
        )?;
        let container = folded.unwrap_or_else(|| collector.supply());
        collector.finish(container)
    }

    /// Encounter order is kept.
    pub fn to_list(&mut self) -> Result<Vec<T>> {
        let pipeline = self.consume("to_list")?;
        Ok(self.run(move |config| pipeline.evaluate_ordered(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors;
    use crate::stream::IntoStream;

    fn private_pool(workers: usize) -> Arc<WorkerPool> {
        let config = StreamConfig {
            parallelism: Some(workers),
            ..StreamConfig::default()
        };
        pool::build_pool(&config).unwrap()
    }

    fn combiner_calls(pool: Arc<WorkerPool>, items: Vec<i64>) -> (i64, usize) {
        let combined = AtomicUsize::new(0);
        let sum = items
            .into_par_stream()
            .with_pool(pool)
            .reduce_with(
                0,
                |sum, n| sum + n,
                |a, b| {
                    combined.fetch_add(1, AtomicOrdering::SeqCst);
                    a + b
                },
            )
            .unwrap();
        (sum, combined.into_inner())
    }

    fn persons() -> Vec<(&'static str, i64)> {
        vec![("Arvin", 23), ("Xiaoping", 22), ("Zengfu", 23), ("Dahao", 16)]
    }

    // ----- Laziness and single use -----

    #[test]
    fn test_no_work_without_terminal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let _stream = (0..100).into_par_stream().filter(move |_| {
            seen.fetch_add(1, AtomicOrdering::SeqCst);
            true
        });
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 0);
    }

    #[test]
    fn test_second_terminal_fails() {
        let mut stream = vec![1, 2, 3].into_par_stream().map(|n| n + 1);
        assert_eq!(stream.count().unwrap(), 3);
        assert!(stream.is_consumed());
        assert!(matches!(stream.to_list(), Err(StreamError::AlreadyConsumed)));
        assert!(matches!(stream.any_match(|_| true), Err(StreamError::AlreadyConsumed)));
    }

    // ----- Order -----

    #[test]
    fn test_to_list_keeps_encounter_order() {
        let expected: Vec<i64> = (0..5_000).map(|n| n * 2).filter(|n| n % 3 == 0).collect();
        let out = (0..5_000i64)
            .into_par_stream()
            .map(|n| n * 2)
            .filter(|n| n % 3 == 0)
            .to_list()
            .unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_sorted_matches_sequential() {
        let input: Vec<i64> = (0..10_000).map(|n| (n * 7919) % 10_007).collect();
        let mut expected = input.clone();
        expected.sort();

        let large = input.clone().into_par_stream().sorted().to_list().unwrap();
        assert_eq!(large, expected);

        let small = vec![5, 3, 9, 1].into_par_stream().sorted().to_list().unwrap();
        assert_eq!(small, vec![1, 3, 5, 9]);
    }

    #[test]
    fn test_sorted_by_is_stable_and_feeds_later_stages() {
        let out = persons()
            .into_par_stream()
            .sorted_by(|a, b| a.1.cmp(&b.1))
            .map(|p| p.0)
            .to_list()
            .unwrap();
        assert_eq!(out, vec!["Dahao", "Xiaoping", "Arvin", "Zengfu"]);
    }

    #[test]
    fn test_find_first_is_encounter_order() {
        let first = (0..10_000)
            .into_par_stream()
            .filter(|n| n % 7 == 3)
            .find_first()
            .unwrap();
        assert_eq!(first.get().unwrap(), 3);

        let none = (0..100).into_par_stream().filter(|n| *n > 1_000).find_first().unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_find_any() {
        let any = (0..1_000)
            .into_par_stream()
            .filter(|n| n % 100 == 42)
            .find_any()
            .unwrap();
        assert_eq!(any.get().unwrap() % 100, 42);
    }

    #[test]
    fn test_for_each_ordered() {
        let mut seen = Vec::new();
        vec!["a1", "a2", "b1", "c2"]
            .into_par_stream()
            .filter(|s| s.starts_with('a') || s.starts_with('c'))
            .for_each_ordered(|s| seen.push(s))
            .unwrap();
        assert_eq!(seen, vec!["a1", "a2", "c2"]);
    }

    #[test]
    fn test_for_each_visits_everything() {
        let total = AtomicUsize::new(0);
        (1..=100usize)
            .into_par_stream()
            .for_each(|n| {
                total.fetch_add(n, AtomicOrdering::SeqCst);
            })
            .unwrap();
        assert_eq!(total.into_inner(), 5050);
    }

    // ----- Matching -----

    #[test]
    fn test_matching() {
        assert!((0..1_000).into_par_stream().any_match(|n| *n == 999).unwrap());
        assert!((0..1_000).into_par_stream().all_match(|n| *n < 1_000).unwrap());
        assert!(!(0..1_000).into_par_stream().all_match(|n| *n < 500).unwrap());
        assert!((0..1_000).into_par_stream().none_match(|n| *n < 0).unwrap());
        assert!(!Vec::<i32>::new().into_par_stream().any_match(|_| true).unwrap());
    }

    // ----- Reduce -----

    #[test]
    fn test_combiner_runs_across_partitions() {
        let combined = AtomicUsize::new(0);
        let sum = persons()
            .into_par_stream()
            .with_pool(private_pool(2))
            .reduce_with(
                0,
                |sum, (_, age)| sum + age,
                |a, b| {
                    combined.fetch_add(1, AtomicOrdering::SeqCst);
                    a + b
                },
            )
            .unwrap();
        assert_eq!(sum, 84);
        // four single-element partitions
        assert_eq!(combined.into_inner(), 3);
    }

    #[test]
    fn test_private_pool_uses_its_own_partition_plan() {
        let single = pool::build_pool(&StreamConfig {
            parallelism: Some(1),
            partitions_per_worker: 1,
            ..StreamConfig::default()
        })
        .unwrap();
        assert_eq!(combiner_calls(single, vec![1, 2, 3, 4]), (10, 0));

        let halves = pool::build_pool(&StreamConfig {
            parallelism: Some(1),
            partitions_per_worker: 2,
            ..StreamConfig::default()
        })
        .unwrap();
        assert_eq!(combiner_calls(halves, vec![1, 2, 3, 4]), (10, 1));
    }

    #[test]
    fn test_private_pool_sort_threshold() {
        let eager = pool::build_pool(&StreamConfig {
            parallelism: Some(2),
            parallel_sort_threshold: 1,
            ..StreamConfig::default()
        })
        .unwrap();
        let out = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')]
            .into_par_stream()
            .with_pool(eager)
            .sorted_by(|a, b| a.0.cmp(&b.0))
            .to_list()
            .unwrap();
        assert_eq!(out, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_reduce_with_supplier_needs_no_clone() {
        struct Bag(Vec<i64>);

        let bag = (1..=6i64)
            .into_par_stream()
            .with_pool(private_pool(2))
            .reduce_with_supplier(
                || Bag(Vec::new()),
                |mut bag, n| {
                    bag.0.push(n);
                    bag
                },
                |mut left, mut right| {
                    left.0.append(&mut right.0);
                    left
                },
            )
            .unwrap();
        assert_eq!(bag.0, vec![1, 2, 3, 4, 5, 6]);

        let empty = Vec::<i64>::new()
            .into_par_stream()
            .reduce_with_supplier(|| Bag(vec![0]), |bag, _| bag, |left, _| left)
            .unwrap();
        assert_eq!(empty.0, vec![0]);
    }

    #[test]
    fn test_reduce_forms() {
        let max = (0..1_000i64)
            .into_par_stream()
            .reduce(|a, b| if a > b { a } else { b })
            .unwrap();
        assert_eq!(max.get().unwrap(), 999);

        let concatenated = vec!["a", "b", "c", "d", "e"]
            .into_par_stream()
            .map(String::from)
            .reduce_from(String::new(), |a, b| a + &b)
            .unwrap();
        assert_eq!(concatenated, "abcde");

        assert!(Vec::<i32>::new().into_par_stream().reduce(|a, b| a + b).unwrap().is_empty());
        assert_eq!(Vec::<i32>::new().into_par_stream().reduce_from(0, |a, b| a + b).unwrap(), 0);
    }

    #[test]
    fn test_flat_map_and_peek() {
        let peeked = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&peeked);
        let bars = vec!["Foo1", "Foo2"]
            .into_par_stream()
            .flat_map(|foo| (1..=3).map(move |i| format!("Bar{} <- {}", i, foo)))
            .peek(move |_| {
                counter.fetch_add(1, AtomicOrdering::SeqCst);
            })
            .to_list()
            .unwrap();
        assert_eq!(bars.len(), 6);
        assert_eq!(bars[0], "Bar1 <- Foo1");
        assert_eq!(bars[5], "Bar3 <- Foo2");
        assert_eq!(peeked.load(AtomicOrdering::SeqCst), 6);
    }

    // ----- Collect -----

    #[test]
    fn test_collect_grouping_and_joining() {
        let by_age = persons()
            .into_par_stream()
            .collect(collectors::grouping_by(|p: &(&str, i64)| p.1))
            .unwrap();
        let names: Vec<_> = by_age[&23].iter().map(|p| p.0).collect();
        assert_eq!(names, vec!["Arvin", "Zengfu"]);

        let phrase = persons()
            .into_par_stream()
            .filter(|p| p.1 >= 18)
            .map(|p| p.0)
            .collect(collectors::joining_with(" and ", "In Germany ", " are of legal age."))
            .unwrap();
        assert_eq!(phrase, "In Germany Arvin and Xiaoping and Zengfu are of legal age.");
    }

    #[test]
    fn test_collect_to_map_duplicate() {
        let result = persons().into_par_stream().collect(collectors::to_map(
            |p: &(&str, i64)| p.1,
            |p: (&'static str, i64)| p.0,
        ));
        assert!(matches!(result, Err(StreamError::DuplicateKey { .. })));
    }

    #[test]
    fn test_collect_empty() {
        let out = Vec::<i32>::new()
            .into_par_stream()
            .collect(collectors::counting())
            .unwrap();
        assert_eq!(out, 0);
    }

    // ----- Switching modes -----

    #[test]
    fn test_sequential_switch() {
        let out = (1..=10)
            .into_par_stream()
            .map(|n| n * n)
            .sequential()
            .limit(3)
            .to_list()
            .unwrap();
        assert_eq!(out, vec![1, 4, 9]);
    }

    #[test]
    fn test_stream_parallel_keeps_earlier_stages() {
        let out = crate::Stream::of(vec![3, 1, 2])
            .map(|n| n * 10)
            .parallel()
            .sorted()
            .to_list()
            .unwrap();
        assert_eq!(out, vec![10, 20, 30]);
    }

    #[test]
    fn test_private_pool_runs_pipeline() {
        let names: Vec<Option<String>> = (0..8)
            .into_par_stream()
            .with_pool(private_pool(3))
            .map(|_| std::thread::current().name().map(str::to_string))
            .to_list()
            .unwrap();
        assert!(names
            .iter()
            .all(|name| name.as_deref().is_some_and(|n| n.starts_with("stream-worker-"))));
    }
}
