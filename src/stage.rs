//! Intermediate stages of a sequential pipeline.
//!
//! Every stage owns its upstream and one function value. Constructing a stage does
//! no work; elements are pulled through the whole chain one at a time when a
//! terminal operation asks for the next element.

use std::cmp::Ordering;

//==============================================================================
// Filter
//==============================================================================

/// Keeps the elements for which the predicate holds.
pub struct Filter<I, P> {
    upstream: I,
    predicate: P,
}

impl<I, P> Filter<I, P> {
    pub(crate) fn new(upstream: I, predicate: P) -> Self {
        Self { upstream, predicate }
    }
}

impl<I, P> Iterator for Filter<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(item) = self.upstream.next() {
            if (self.predicate)(&item) {
                return Some(item);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.upstream.size_hint().1)
    }
}

//==============================================================================
// Map
//==============================================================================

/// Transforms each element, possibly into another type.
pub struct Map<I, F> {
    upstream: I,
    mapper: F,
}

impl<I, F> Map<I, F> {
    pub(crate) fn new(upstream: I, mapper: F) -> Self {
        Self { upstream, mapper }
    }
}

impl<I, F, U> Iterator for Map<I, F>
where
    I: Iterator,
    F: FnMut(I::Item) -> U,
{
    type Item = U;

    fn next(&mut self) -> Option<U> {
        self.upstream.next().map(&mut self.mapper)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}

//==============================================================================
// FlatMap
//==============================================================================

/// Expands each element into zero or more elements and concatenates the results
/// in source order.
pub struct FlatMap<I, F, U: IntoIterator> {
    upstream: I,
    mapper: F,
    current: Option<U::IntoIter>,
}

impl<I, F, U> FlatMap<I, F, U>
where
    I: Iterator,
    F: FnMut(I::Item) -> U,
    U: IntoIterator,
{
    pub(crate) fn new(upstream: I, mapper: F) -> Self {
        Self {
            upstream,
            mapper,
            current: None,
        }
    }
}

impl<I, F, U> Iterator for FlatMap<I, F, U>
where
    I: Iterator,
    F: FnMut(I::Item) -> U,
    U: IntoIterator,
{
    type Item = U::Item;

    fn next(&mut self) -> Option<U::Item> {
        loop {
            if let Some(inner) = self.current.as_mut() {
                if let Some(item) = inner.next() {
                    return Some(item);
                }
                self.current = None;
            }
            // Only pull the next upstream element once the current sub-sequence ran dry.
            let outer = self.upstream.next()?;
            self.current = Some((self.mapper)(outer).into_iter());
        }
    }
}

//==============================================================================
// Peek
//==============================================================================

/// Runs a side effect on each element as it passes, leaving it unchanged.
pub struct Peek<I, F> {
    upstream: I,
    action: F,
}

impl<I, F> Peek<I, F> {
    pub(crate) fn new(upstream: I, action: F) -> Self {
        Self { upstream, action }
    }
}

impl<I, F> Iterator for Peek<I, F>
where
    I: Iterator,
    F: FnMut(&I::Item),
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.upstream.next()?;
        (self.action)(&item);
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.upstream.size_hint()
    }
}

//==============================================================================
// Sorted
//==============================================================================

/// Barrier stage: the first pull drains the upstream, sorts it (stable), and
/// then hands elements out one by one.
pub struct Sorted<I: Iterator, C> {
    upstream: Option<I>,
    comparator: C,
    buffer: std::vec::IntoIter<I::Item>,
}

impl<I: Iterator, C> Sorted<I, C> {
    pub(crate) fn new(upstream: I, comparator: C) -> Self {
        Self {
            upstream: Some(upstream),
            comparator,
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<I, C> Iterator for Sorted<I, C>
where
    I: Iterator,
    C: FnMut(&I::Item, &I::Item) -> Ordering,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(upstream) = self.upstream.take() {
            let mut items: Vec<I::Item> = upstream.collect();
            items.sort_by(&mut self.comparator);
            self.buffer = items.into_iter();
        }
        self.buffer.next()
    }
}

//==============================================================================
// Limit / Skip
//==============================================================================

/// Passes at most `remaining` elements, then stops pulling from upstream.
pub struct Limit<I> {
    upstream: I,
    remaining: usize,
}

impl<I> Limit<I> {
    pub(crate) fn new(upstream: I, max_size: usize) -> Self {
        Self {
            upstream,
            remaining: max_size,
        }
    }
}

impl<I: Iterator> Iterator for Limit<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.upstream.next()
    }
}

/// Discards the first `n` elements.
pub struct Skip<I> {
    upstream: I,
    pending: usize,
}

impl<I> Skip<I> {
    pub(crate) fn new(upstream: I, n: usize) -> Self {
        Self {
            upstream,
            pending: n,
        }
    }
}

impl<I: Iterator> Iterator for Skip<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending > 0 {
            self.pending -= 1;
            self.upstream.next()?;
        }
        self.upstream.next()
    }
}

//==============================================================================
// Deferred
//==============================================================================

/// A source that is only produced when first pulled.
///
/// Role: lets barrier stages of the parallel pipeline hand a lazily built buffer
/// to whatever comes after them.
pub struct Deferred<F, T> {
    init: Option<F>,
    buffer: std::vec::IntoIter<T>,
}

impl<F, T> Deferred<F, T>
where
    F: FnOnce() -> Vec<T>,
{
    pub(crate) fn new(init: F) -> Self {
        Self {
            init: Some(init),
            buffer: Vec::new().into_iter(),
        }
    }
}

impl<F, T> Iterator for Deferred<F, T>
where
    F: FnOnce() -> Vec<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(init) = self.init.take() {
            self.buffer = init().into_iter();
        }
        self.buffer.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_filter_keeps_order() {
        let out: Vec<i32> = Filter::new(vec![5, 2, 8, 1, 9].into_iter(), |x: &i32| *x > 3).collect();
        assert_eq!(out, vec![5, 8, 9]);
    }

    #[test]
    fn test_map_is_lazy() {
        let calls = Cell::new(0);
        let mut mapped = Map::new(vec![1, 2, 3].into_iter(), |x: i32| {
            calls.set(calls.get() + 1);
            x * 2
        });
        assert_eq!(calls.get(), 0);
        assert_eq!(mapped.next(), Some(2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_flat_map_handles_empty_expansions() {
        let out: Vec<i32> = FlatMap::new(vec![0, 2, 0, 3].into_iter(), |n: i32| 0..n).collect();
        assert_eq!(out, vec![0, 1, 0, 1, 2]);
    }

    #[test]
    fn test_peek_sees_every_element() {
        let mut seen = Vec::new();
        let out: Vec<&str> = Peek::new(vec!["a", "b"].into_iter(), |s: &&'static str| seen.push(*s)).collect();
        assert_eq!(out, vec!["a", "b"]);
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_sorted_is_stable() {
        let pairs = vec![(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd')];
        let out: Vec<(i32, char)> =
            Sorted::new(pairs.into_iter(), |a: &(i32, char), b: &(i32, char)| a.0.cmp(&b.0)).collect();
        assert_eq!(out, vec![(1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]);
    }

    #[test]
    fn test_limit_stops_pulling() {
        let pulled = Cell::new(0);
        let source = Peek::new(1..100, |_: &i32| pulled.set(pulled.get() + 1));
        let out: Vec<i32> = Limit::new(source, 3).collect();
        assert_eq!(out, vec![1, 2, 3]);
        assert_eq!(pulled.get(), 3);
    }

    #[test]
    fn test_skip() {
        let out: Vec<i32> = Skip::new(1..6, 2).collect();
        assert_eq!(out, vec![3, 4, 5]);
        let out: Vec<i32> = Skip::new(1..3, 5).collect();
        assert!(out.is_empty());
    }

    #[test]
    fn test_deferred_runs_once_on_first_pull() {
        let runs = Cell::new(0);
        let mut deferred = Deferred::new(|| {
            runs.set(runs.get() + 1);
            vec![1, 2]
        });
        assert_eq!(runs.get(), 0);
        assert_eq!(deferred.next(), Some(1));
        assert_eq!(deferred.next(), Some(2));
        assert_eq!(deferred.next(), None);
        assert_eq!(runs.get(), 1);
    }
}
