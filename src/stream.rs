//! The sequential pipeline.
//!
//! A [`Stream`] wraps a source iterator. Intermediate operations (`filter`, `map`,
//! `flat_map`, `peek`, `sorted`, ...) consume the stream and hand back a new one
//! whose source is the previous chain wrapped in one more stage; nothing is
//! evaluated yet. A terminal operation (`for_each`, `find_first`, `reduce`,
//! `collect`, ...) pulls elements through the chain one at a time and leaves the
//! stream consumed. Calling a second terminal on it returns
//! [`StreamError::AlreadyConsumed`].

use std::cmp::Ordering;
use std::ops::{Range, RangeInclusive};

use log::{debug, trace};

use crate::collectors::Collector;
use crate::error::{Result, StreamError};
use crate::optional::Optional;
use crate::parallel::ParStream;
use crate::stage::{Filter, FlatMap, Limit, Map, Peek, Skip, Sorted};
use crate::stats::IntSummaryStatistics;

#[must_use = "streams are lazy and do nothing until a terminal operation runs"]
pub struct Stream<I> {
    source: Option<I>,
}

impl<I: Iterator> Stream<I> {
    pub fn new(source: I) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Stream over anything iterable.
    pub fn of<C>(items: C) -> Self
    where
        C: IntoIterator<IntoIter = I>,
    {
        Self::new(items.into_iter())
    }

    pub(crate) fn from_source(source: Option<I>) -> Self {
        Self { source }
    }

    /// `true` once a terminal operation has run.
    pub fn is_consumed(&self) -> bool {
        self.source.is_none()
    }

    fn then<J>(self, stage: impl FnOnce(I) -> J) -> Stream<J> {
        Stream {
            source: self.source.map(stage),
        }
    }

    fn consume(&mut self, operation: &'static str) -> Result<I> {
        match self.source.take() {
            Some(source) => {
                trace!("{}: evaluating sequential pipeline", operation);
                Ok(source)
            }
            None => {
                debug!("{}: stream already consumed", operation);
                Err(StreamError::AlreadyConsumed)
            }
        }
    }

    // =========================================================================
    // Intermediate operations
    // =========================================================================

    pub fn filter<P>(self, predicate: P) -> Stream<Filter<I, P>>
    where
        P: FnMut(&I::Item) -> bool,
    {
        self.then(|source| Filter::new(source, predicate))
    }

    pub fn map<U, F>(self, mapper: F) -> Stream<Map<I, F>>
    where
        F: FnMut(I::Item) -> U,
    {
        self.then(|source| Map::new(source, mapper))
    }

    /// Replaces every element with the elements of the sub-sequence it maps to.
    pub fn flat_map<U, F>(self, mapper: F) -> Stream<FlatMap<I, F, U>>
    where
        F: FnMut(I::Item) -> U,
        U: IntoIterator,
    {
        self.then(|source| FlatMap::new(source, mapper))
    }

    pub fn peek<F>(self, action: F) -> Stream<Peek<I, F>>
    where
        F: FnMut(&I::Item),
    {
        self.then(|source| Peek::new(source, action))
    }

    /// Natural order. Buffers the upstream when the first element is requested.
    pub fn sorted(self) -> Stream<Sorted<I, impl FnMut(&I::Item, &I::Item) -> Ordering>>
    where
        I::Item: Ord,
    {
        self.sorted_by(|a: &I::Item, b: &I::Item| a.cmp(b))
    }

    pub fn sorted_by<C>(self, comparator: C) -> Stream<Sorted<I, C>>
    where
        C: FnMut(&I::Item, &I::Item) -> Ordering,
    {
        self.then(|source| Sorted::new(source, comparator))
    }

    pub fn limit(self, max_size: usize) -> Stream<Limit<I>> {
        self.then(|source| Limit::new(source, max_size))
    }

    pub fn skip(self, n: usize) -> Stream<Skip<I>> {
        self.then(|source| Skip::new(source, n))
    }

    /// Switches to parallel execution. Stages already attached run on the
    /// thread that feeds the partitions; stages added afterwards run on the
    /// worker pool.
    pub fn parallel(self) -> ParStream<I::Item, I::Item>
    where
        I: Send + 'static,
        I::Item: Send + 'static,
    {
        ParStream::from_source(
            self.source
                .map(|source| Box::new(source) as Box<dyn Iterator<Item = I::Item> + Send>),
        )
    }

    // =========================================================================
    // Terminal operations
    // =========================================================================

    pub fn for_each<F>(&mut self, action: F) -> Result<()>
    where
        F: FnMut(I::Item),
    {
        self.consume("for_each")?.for_each(action);
        Ok(())
    }

    pub fn find_first(&mut self) -> Result<Optional<I::Item>> {
        Ok(self.consume("find_first")?.next().into())
    }

    /// Stops at the first element that satisfies the predicate.
    pub fn any_match<P>(&mut self, mut predicate: P) -> Result<bool>
    where
        P: FnMut(&I::Item) -> bool,
    {
        Ok(self.consume("any_match")?.any(|item| predicate(&item)))
    }

    /// Stops at the first element that fails the predicate.
    pub fn all_match<P>(&mut self, mut predicate: P) -> Result<bool>
    where
        P: FnMut(&I::Item) -> bool,
    {
        Ok(self.consume("all_match")?.all(|item| predicate(&item)))
    }

    /// Stops at the first element that satisfies the predicate.
    pub fn none_match<P>(&mut self, mut predicate: P) -> Result<bool>
    where
        P: FnMut(&I::Item) -> bool,
    {
        Ok(!self.consume("none_match")?.any(|item| predicate(&item)))
    }

    pub fn count(&mut self) -> Result<usize> {
        Ok(self.consume("count")?.count())
    }

    /// Folds the elements pairwise; absent for an empty stream.
    pub fn reduce<F>(&mut self, op: F) -> Result<Optional<I::Item>>
    where
        F: FnMut(I::Item, I::Item) -> I::Item,
    {
        Ok(self.consume("reduce")?.reduce(op).into())
    }

    /// Folds the elements starting from `identity`; an empty stream yields `identity`.
    pub fn reduce_from<F>(&mut self, identity: I::Item, op: F) -> Result<I::Item>
    where
        F: FnMut(I::Item, I::Item) -> I::Item,
    {
        Ok(self.consume("reduce_from")?.fold(identity, op))
    }

    /// Folds into a different result type. The combiner merges partition results
    /// in parallel mode and is never called here.
    pub fn reduce_with<U, A, C>(&mut self, identity: U, accumulator: A, _combiner: C) -> Result<U>
    where
        A: FnMut(U, I::Item) -> U,
        C: FnMut(U, U) -> U,
    {
        Ok(self.consume("reduce_with")?.fold(identity, accumulator))
    }

    /// Supplies one container, accumulates every element into it, and finishes it.
    pub fn collect<C>(&mut self, collector: C) -> Result<C::Output>
    where
        C: Collector<I::Item>,
    {
        let source = self.consume("collect")?;
        let mut container = collector.supply();
        for item in source {
            collector.accumulate(&mut container, item);
        }
        collector.finish(container)
    }

    pub fn to_list(&mut self) -> Result<Vec<I::Item>> {
        Ok(self.consume("to_list")?.collect())
    }

    /// The first of several equally small elements wins.
    pub fn min_by<C>(&mut self, comparator: C) -> Result<Optional<I::Item>>
    where
        C: FnMut(&I::Item, &I::Item) -> Ordering,
    {
        Ok(self.consume("min_by")?.min_by(comparator).into())
    }

    /// The first of several equally large elements wins.
    pub fn max_by<C>(&mut self, mut comparator: C) -> Result<Optional<I::Item>>
    where
        C: FnMut(&I::Item, &I::Item) -> Ordering,
    {
        let best = self.consume("max_by")?.reduce(|best, item| {
            if comparator(&item, &best) == Ordering::Greater {
                item
            } else {
                best
            }
        });
        Ok(best.into())
    }
}

impl<T> Stream<std::iter::Empty<T>> {
    pub fn empty() -> Self {
        Stream::new(std::iter::empty())
    }
}

impl Stream<Range<i64>> {
    /// `start` inclusive, `end` exclusive.
    pub fn range(start: i64, end: i64) -> Self {
        Stream::new(start..end)
    }
}

impl Stream<RangeInclusive<i64>> {
    pub fn range_closed(start: i64, end: i64) -> Self {
        Stream::new(start..=end)
    }
}

//==============================================================================
// Integer streams
//==============================================================================

impl<I> Stream<I>
where
    I: Iterator<Item = i64>,
{
    /// Wraps on overflow.
    pub fn sum(&mut self) -> Result<i64> {
        Ok(self.consume("sum")?.fold(0i64, i64::wrapping_add))
    }

    pub fn average(&mut self) -> Result<Optional<f64>> {
        let stats = self.summary_statistics()?;
        Ok(if stats.count() == 0 {
            Optional::empty()
        } else {
            Optional::of(stats.average())
        })
    }

    pub fn max(&mut self) -> Result<Optional<i64>> {
        Ok(self.consume("max")?.max().into())
    }

    pub fn min(&mut self) -> Result<Optional<i64>> {
        Ok(self.consume("min")?.min().into())
    }

    pub fn summary_statistics(&mut self) -> Result<IntSummaryStatistics> {
        let mut stats = IntSummaryStatistics::new();
        stats.extend(self.consume("summary_statistics")?);
        Ok(stats)
    }
}

//==============================================================================
// Reuse via a factory
//==============================================================================

/// Builds a fresh pipeline on every [`get`](StreamSupplier::get), so the same
/// chain can back several terminal operations.
pub struct StreamSupplier<F> {
    factory: F,
}

impl<F, I> StreamSupplier<F>
where
    F: Fn() -> Stream<I>,
    I: Iterator,
{
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    pub fn get(&self) -> Stream<I> {
        (self.factory)()
    }
}

/// `.into_stream()` / `.into_par_stream()` for every iterable.
pub trait IntoStream: IntoIterator + Sized {
    fn into_stream(self) -> Stream<Self::IntoIter> {
        Stream::of(self)
    }

    fn into_par_stream(self) -> ParStream<Self::Item, Self::Item>
    where
        Self::IntoIter: Send + 'static,
        Self::Item: Send + 'static,
    {
        self.into_stream().parallel()
    }
}

impl<C: IntoIterator> IntoStream for C {}
