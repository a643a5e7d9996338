//! Collector strategies for the `collect` terminal operation.
//!
//! A collector is four functions:
//!
//! 1. **supplier** builds an empty container (once per partition),
//! 2. **accumulator** folds one element into a container,
//! 3. **combiner** merges two partition containers (parallel pipelines only),
//! 4. **finisher** turns the final container into the result.
//!
//! [`of`] builds a collector from four closures; the other functions in this module
//! are ready-made collectors for common shapes (lists, groups, maps, statistics,
//! joined strings). The combiner must be associative for parallel results to be
//! deterministic.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::error::{Result, StreamError};
use crate::stats::IntSummaryStatistics;

pub trait Collector<T> {
    /// Mutable accumulation state.
    type Container;
    /// Value produced once accumulation is over.
    type Output;

    fn supply(&self) -> Self::Container;

    fn accumulate(&self, container: &mut Self::Container, item: T);

    fn combine(&self, left: Self::Container, right: Self::Container) -> Self::Container;

    fn finish(&self, container: Self::Container) -> Result<Self::Output>;
}

//==============================================================================
// Custom collectors from four closures
//==============================================================================

/// Plain record of the four collector functions.
pub struct CollectorOf<S, A, C, F> {
    supplier: S,
    accumulator: A,
    combiner: C,
    finisher: F,
}

/// Builds a collector from a supplier, accumulator, combiner and finisher.
///
/// ```
/// use lazy_stream::collectors::{self, StringJoiner};
/// use lazy_stream::Stream;
///
/// let names = Stream::of(vec!["ann", "bob"])
///     .collect(collectors::of(
///         || StringJoiner::new("|"),
///         |j: &mut StringJoiner, name: &str| {
///             j.add(&name.to_uppercase());
///         },
///         StringJoiner::merge,
///         |j: StringJoiner| j.to_string(),
///     ))
///     .unwrap();
/// assert_eq!(names, "ANN|BOB");
/// ```
pub fn of<T, Acc, R, S, A, C, F>(
    supplier: S,
    accumulator: A,
    combiner: C,
    finisher: F,
) -> CollectorOf<S, A, C, F>
where
    S: Fn() -> Acc,
    A: Fn(&mut Acc, T),
    C: Fn(Acc, Acc) -> Acc,
    F: Fn(Acc) -> R,
{
    CollectorOf {
        supplier,
        accumulator,
        combiner,
        finisher,
    }
}

impl<T, Acc, R, S, A, C, F> Collector<T> for CollectorOf<S, A, C, F>
where
    S: Fn() -> Acc,
    A: Fn(&mut Acc, T),
    C: Fn(Acc, Acc) -> Acc,
    F: Fn(Acc) -> R,
{
    type Container = Acc;
    type Output = R;

    fn supply(&self) -> Acc {
        (self.supplier)()
    }

    fn accumulate(&self, container: &mut Acc, item: T) {
        (self.accumulator)(container, item)
    }

    fn combine(&self, left: Acc, right: Acc) -> Acc {
        (self.combiner)(left, right)
    }

    fn finish(&self, container: Acc) -> Result<R> {
        Ok((self.finisher)(container))
    }
}

//==============================================================================
// Lists and counts
//==============================================================================

/// Collects elements into a `Vec` in encounter order.
pub fn to_list<T>() -> impl Collector<T, Container = Vec<T>, Output = Vec<T>> {
    of(
        Vec::new,
        |list: &mut Vec<T>, item: T| list.push(item),
        |mut left: Vec<T>, mut right: Vec<T>| {
            left.append(&mut right);
            left
        },
        |list: Vec<T>| list,
    )
}

pub fn counting<T>() -> impl Collector<T, Container = usize, Output = usize> {
    of(
        || 0usize,
        |count: &mut usize, _item: T| *count += 1,
        |left: usize, right: usize| left + right,
        |count: usize| count,
    )
}

//==============================================================================
// Grouping
//==============================================================================

/// Groups elements by a derived key. Elements sharing a key keep their
/// encounter order inside the group.
pub fn grouping_by<T, K, KF>(
    classifier: KF,
) -> impl Collector<T, Container = HashMap<K, Vec<T>>, Output = HashMap<K, Vec<T>>>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
{
    of(
        HashMap::new,
        move |groups: &mut HashMap<K, Vec<T>>, item: T| {
            groups.entry(classifier(&item)).or_default().push(item);
        },
        |mut left: HashMap<K, Vec<T>>, right: HashMap<K, Vec<T>>| {
            for (key, mut members) in right {
                left.entry(key).or_default().append(&mut members);
            }
            left
        },
        |groups: HashMap<K, Vec<T>>| groups,
    )
}

/// Groups elements by key and reduces every group with a downstream collector.
pub fn grouping_by_with<T, K, KF, D>(classifier: KF, downstream: D) -> GroupingBy<KF, D>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    D: Collector<T>,
{
    GroupingBy {
        classifier,
        downstream,
    }
}

pub struct GroupingBy<KF, D> {
    classifier: KF,
    downstream: D,
}

impl<T, K, KF, D> Collector<T> for GroupingBy<KF, D>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    D: Collector<T>,
{
    type Container = HashMap<K, D::Container>;
    type Output = HashMap<K, D::Output>;

    fn supply(&self) -> Self::Container {
        HashMap::new()
    }

    fn accumulate(&self, groups: &mut Self::Container, item: T) {
        let group = groups
            .entry((self.classifier)(&item))
            .or_insert_with(|| self.downstream.supply());
        self.downstream.accumulate(group, item);
    }

    fn combine(&self, mut left: Self::Container, right: Self::Container) -> Self::Container {
        for (key, partial) in right {
            let merged = match left.remove(&key) {
                Some(existing) => self.downstream.combine(existing, partial),
                None => partial,
            };
            left.insert(key, merged);
        }
        left
    }

    fn finish(&self, groups: Self::Container) -> Result<Self::Output> {
        groups
            .into_iter()
            .map(|(key, group)| Ok((key, self.downstream.finish(group)?)))
            .collect()
    }
}

//==============================================================================
// Numeric aggregation
//==============================================================================

/// Mean of an integer property, `0.0` for an empty input.
pub fn averaging_int<T, F>(
    mapper: F,
) -> impl Collector<T, Container = IntSummaryStatistics, Output = f64>
where
    F: Fn(&T) -> i64,
{
    of(
        IntSummaryStatistics::new,
        move |stats: &mut IntSummaryStatistics, item: T| stats.accept(mapper(&item)),
        merge_stats,
        |stats: IntSummaryStatistics| stats.average(),
    )
}

/// Count, sum, min, max and average of an integer property in one pass.
pub fn summarizing_int<T, F>(
    mapper: F,
) -> impl Collector<T, Container = IntSummaryStatistics, Output = IntSummaryStatistics>
where
    F: Fn(&T) -> i64,
{
    of(
        IntSummaryStatistics::new,
        move |stats: &mut IntSummaryStatistics, item: T| stats.accept(mapper(&item)),
        merge_stats,
        |stats: IntSummaryStatistics| stats,
    )
}

fn merge_stats(mut left: IntSummaryStatistics, right: IntSummaryStatistics) -> IntSummaryStatistics {
    left.combine(&right);
    left
}

//==============================================================================
// String joining
//==============================================================================

/// Builds `prefix + a + sep + b + ... + suffix` incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringJoiner {
    separator: String,
    prefix: String,
    suffix: String,
    body: Option<String>,
}

impl StringJoiner {
    pub fn new(separator: &str) -> Self {
        Self::with_affixes(separator, "", "")
    }

    pub fn with_affixes(separator: &str, prefix: &str, suffix: &str) -> Self {
        Self {
            separator: separator.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            body: None,
        }
    }

    pub fn add(&mut self, part: &str) -> &mut Self {
        match self.body.as_mut() {
            Some(body) => {
                body.push_str(&self.separator);
                body.push_str(part);
            }
            None => self.body = Some(part.to_string()),
        }
        self
    }

    /// Appends the other joiner's parts (without its prefix and suffix) as a
    /// single part of this one.
    pub fn merge(mut self, other: StringJoiner) -> StringJoiner {
        if let Some(other_body) = other.body {
            self.add(&other_body);
        }
        self
    }

    /// Length of the string `to_string` would produce.
    pub fn len(&self) -> usize {
        self.prefix.len() + self.body.as_ref().map_or(0, String::len) + self.suffix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for StringJoiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.prefix,
            self.body.as_deref().unwrap_or(""),
            self.suffix
        )
    }
}

/// Concatenates string elements with a separator.
pub fn joining<T>(separator: &str) -> impl Collector<T, Container = StringJoiner, Output = String>
where
    T: AsRef<str>,
{
    joining_with(separator, "", "")
}

/// Concatenates string elements with a separator, wrapped in a prefix and suffix.
pub fn joining_with<T>(
    separator: &str,
    prefix: &str,
    suffix: &str,
) -> impl Collector<T, Container = StringJoiner, Output = String>
where
    T: AsRef<str>,
{
    let template = StringJoiner::with_affixes(separator, prefix, suffix);
    of(
        move || template.clone(),
        |joiner: &mut StringJoiner, item: T| {
            joiner.add(item.as_ref());
        },
        StringJoiner::merge,
        |joiner: StringJoiner| joiner.to_string(),
    )
}

//==============================================================================
// Key-unique maps
//==============================================================================

/// Map under construction plus the first merge failure, if any.
#[derive(Debug)]
pub struct KeyedMap<K, V> {
    entries: HashMap<K, V>,
    failure: Option<StreamError>,
}

impl<K: Eq + Hash, V> KeyedMap<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            failure: None,
        }
    }

    fn insert<M>(&mut self, key: K, value: V, merge: &M)
    where
        M: Fn(&K, V, V) -> Result<V>,
    {
        if self.failure.is_some() {
            return;
        }
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(slot) => {
                let (key, existing) = slot.remove_entry();
                match merge(&key, existing, value) {
                    Ok(merged) => {
                        self.entries.insert(key, merged);
                    }
                    Err(err) => self.failure = Some(err),
                }
            }
        }
    }
}

pub struct ToMap<KF, VF, M> {
    key_mapper: KF,
    value_mapper: VF,
    merge: M,
}

impl<T, K, V, KF, VF, M> Collector<T> for ToMap<KF, VF, M>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    VF: Fn(T) -> V,
    M: Fn(&K, V, V) -> Result<V>,
{
    type Container = KeyedMap<K, V>;
    type Output = HashMap<K, V>;

    fn supply(&self) -> Self::Container {
        KeyedMap::new()
    }

    fn accumulate(&self, map: &mut Self::Container, item: T) {
        let key = (self.key_mapper)(&item);
        let value = (self.value_mapper)(item);
        map.insert(key, value, &self.merge);
    }

    fn combine(&self, mut left: Self::Container, right: Self::Container) -> Self::Container {
        if left.failure.is_none() {
            left.failure = right.failure;
        }
        for (key, value) in right.entries {
            left.insert(key, value, &self.merge);
        }
        left
    }

    fn finish(&self, map: Self::Container) -> Result<Self::Output> {
        match map.failure {
            Some(err) => Err(err),
            None => Ok(map.entries),
        }
    }
}

/// Builds a map with unique keys. Two elements with the same key make the
/// collect fail with [`StreamError::DuplicateKey`].
pub fn to_map<T, K, V, KF, VF>(
    key_mapper: KF,
    value_mapper: VF,
) -> impl Collector<T, Container = KeyedMap<K, V>, Output = HashMap<K, V>>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    KF: Fn(&T) -> K,
    VF: Fn(T) -> V,
{
    ToMap {
        key_mapper,
        value_mapper,
        merge: |key: &K, existing: V, incoming: V| -> Result<V> {
            Err(StreamError::duplicate_key(key, &existing, &incoming))
        },
    }
}

/// Builds a map, resolving key collisions with `merge(existing, incoming)`.
pub fn to_map_merging<T, K, V, KF, VF, MF>(
    key_mapper: KF,
    value_mapper: VF,
    merge: MF,
) -> impl Collector<T, Container = KeyedMap<K, V>, Output = HashMap<K, V>>
where
    K: Eq + Hash,
    KF: Fn(&T) -> K,
    VF: Fn(T) -> V,
    MF: Fn(V, V) -> V,
{
    ToMap {
        key_mapper,
        value_mapper,
        merge: move |_key: &K, existing: V, incoming: V| -> Result<V> { Ok(merge(existing, incoming)) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: &'static str,
        age: i64,
    }

    fn persons() -> Vec<Person> {
        vec![
            Person { name: "Arvin", age: 23 },
            Person { name: "Xiaoping", age: 22 },
            Person { name: "Zengfu", age: 23 },
            Person { name: "Dahao", age: 16 },
        ]
    }

    /// Drives a collector the way a sequential pipeline does.
    fn run<T, C: Collector<T>>(collector: &C, items: Vec<T>) -> Result<C::Output> {
        let mut container = collector.supply();
        for item in items {
            collector.accumulate(&mut container, item);
        }
        collector.finish(container)
    }

    /// Drives a collector over two partitions and combines them.
    fn run_split<T, C: Collector<T>>(collector: &C, mut items: Vec<T>, at: usize) -> Result<C::Output> {
        let right_items = items.split_off(at);
        let mut left = collector.supply();
        for item in items {
            collector.accumulate(&mut left, item);
        }
        let mut right = collector.supply();
        for item in right_items {
            collector.accumulate(&mut right, item);
        }
        collector.finish(collector.combine(left, right))
    }

    #[test]
    fn test_to_list_keeps_order() {
        assert_eq!(run(&to_list(), vec!['a', 'b', 'c']).unwrap(), vec!['a', 'b', 'c']);
        assert_eq!(run_split(&to_list(), vec![1, 2, 3, 4], 1).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_grouping_by_age() {
        let groups = run(&grouping_by(|p: &Person| p.age), persons()).unwrap();
        let names = |age: i64| groups[&age].iter().map(|p| p.name).collect::<Vec<_>>();

        assert_eq!(groups.len(), 3);
        assert_eq!(names(23), vec!["Arvin", "Zengfu"]);
        assert_eq!(names(22), vec!["Xiaoping"]);
        assert_eq!(names(16), vec!["Dahao"]);
    }

    #[test]
    fn test_grouping_by_combines_partitions_in_order() {
        let groups = run_split(&grouping_by(|p: &Person| p.age), persons(), 1).unwrap();
        let names: Vec<_> = groups[&23].iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Arvin", "Zengfu"]);
    }

    #[test]
    fn test_grouping_by_with_downstream() {
        let counts = run(&grouping_by_with(|p: &Person| p.age, counting()), persons()).unwrap();
        assert_eq!(counts[&23], 2);
        assert_eq!(counts[&16], 1);

        let summaries = run_split(
            &grouping_by_with(|p: &Person| p.age, summarizing_int(|p: &Person| p.age)),
            persons(),
            2,
        )
        .unwrap();
        assert_eq!(summaries[&23].count(), 2);
        assert_eq!(summaries[&23].sum(), 46);
    }

    #[test]
    fn test_averaging_and_summarizing() {
        let average = run(&averaging_int(|p: &Person| p.age), persons()).unwrap();
        assert_eq!(average, 21.0);

        let empty: Vec<Person> = Vec::new();
        assert_eq!(run(&averaging_int(|p: &Person| p.age), empty).unwrap(), 0.0);

        let summary = run_split(&summarizing_int(|p: &Person| p.age), persons(), 2).unwrap();
        assert_eq!(summary.count(), 4);
        assert_eq!(summary.sum(), 84);
        assert_eq!(summary.min(), 16);
        assert_eq!(summary.max(), 23);
    }

    #[test]
    fn test_joining() {
        let names: Vec<&str> = persons().iter().map(|p| p.name).collect();
        let phrase = run(&joining(" and "), names.clone()).unwrap();
        assert_eq!(phrase, "Arvin and Xiaoping and Zengfu and Dahao");

        let wrapped = run_split(&joining_with(", ", "[", "]"), names, 2).unwrap();
        assert_eq!(wrapped, "[Arvin, Xiaoping, Zengfu, Dahao]");

        let empty: Vec<String> = Vec::new();
        assert_eq!(run(&joining_with(",", "<", ">"), empty).unwrap(), "<>");
    }

    #[test]
    fn test_string_joiner_merge() {
        let mut left = StringJoiner::new("|");
        left.add("A").add("B");
        let mut right = StringJoiner::with_affixes("-", "{", "}");
        right.add("C").add("D");

        let merged = left.merge(right);
        assert_eq!(merged.to_string(), "A|B|C-D");
        assert_eq!(merged.len(), 7);
        assert!(StringJoiner::new(",").is_empty());
    }

    #[test]
    fn test_to_map_duplicate_key_fails() {
        let result = run(&to_map(|p: &Person| p.age, |p: Person| p.name), persons());
        match result {
            Err(StreamError::DuplicateKey { key, first, second }) => {
                assert_eq!(key, "23");
                assert_eq!(first, "\"Arvin\"");
                assert_eq!(second, "\"Zengfu\"");
            }
            other => panic!("expected duplicate key error, got {:?}", other),
        }
    }

    #[test]
    fn test_to_map_duplicate_across_partitions_fails() {
        let result = run_split(&to_map(|p: &Person| p.age, |p: Person| p.name), persons(), 2);
        assert!(matches!(result, Err(StreamError::DuplicateKey { .. })));
    }

    #[test]
    fn test_to_map_unique_keys() {
        let map = run(&to_map(|p: &Person| p.name, |p: Person| p.age), persons()).unwrap();
        assert_eq!(map.len(), 4);
        assert_eq!(map["Dahao"], 16);
    }

    #[test]
    fn test_to_map_merging() {
        let map = run(
            &to_map_merging(
                |p: &Person| p.age,
                |p: Person| p.name.to_string(),
                |a: String, b: String| format!("{};{}", a, b),
            ),
            persons(),
        )
        .unwrap();

        assert_eq!(map[&23], "Arvin;Zengfu");
        assert_eq!(map[&22], "Xiaoping");
        assert_eq!(map[&16], "Dahao");
    }

    #[test]
    fn test_custom_collector() {
        let collector = of(
            || StringJoiner::new("|"),
            |j: &mut StringJoiner, p: Person| {
                j.add(&p.name.to_uppercase());
            },
            StringJoiner::merge,
            |j: StringJoiner| j.to_string(),
        );
        assert_eq!(run(&collector, persons()).unwrap(), "ARVIN|XIAOPING|ZENGFU|DAHAO");
        assert_eq!(run_split(&collector, persons(), 3).unwrap(), "ARVIN|XIAOPING|ZENGFU|DAHAO");
    }
}
