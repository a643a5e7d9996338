//! Running count/sum/min/max summary for integer elements.

use std::fmt;

/// Summary of a sequence of `i64` values, built one value at a time.
/// Partial summaries from different partitions merge with [`combine`](Self::combine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntSummaryStatistics {
    count: u64,
    sum: i64,
    min: i64,
    max: i64,
}

impl IntSummaryStatistics {
    /// An empty summary: `min` starts at `i64::MAX`, `max` at `i64::MIN`.
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: i64::MAX,
            max: i64::MIN,
        }
    }

    /// `sum` wraps on overflow.
    pub fn accept(&mut self, value: i64) {
        self.count = self.count.wrapping_add(1);
        self.sum = self.sum.wrapping_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn combine(&mut self, other: &IntSummaryStatistics) {
        self.count = self.count.wrapping_add(other.count);
        self.sum = self.sum.wrapping_add(other.sum);
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Arithmetic mean, `0.0` when nothing was accepted.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

impl Default for IntSummaryStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntSummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntSummaryStatistics{{count={}, sum={}, min={}, average={:.6}, max={}}}",
            self.count,
            self.sum,
            self.min,
            self.average(),
            self.max
        )
    }
}

impl Extend<i64> for IntSummaryStatistics {
    fn extend<T: IntoIterator<Item = i64>>(&mut self, iter: T) {
        for value in iter {
            self.accept(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_and_display() {
        let mut stats = IntSummaryStatistics::new();
        stats.extend([23, 22, 23, 16]);

        assert_eq!(stats.count(), 4);
        assert_eq!(stats.sum(), 84);
        assert_eq!(stats.min(), 16);
        assert_eq!(stats.max(), 23);
        assert_eq!(stats.average(), 21.0);
        assert_eq!(
            stats.to_string(),
            "IntSummaryStatistics{count=4, sum=84, min=16, average=21.000000, max=23}"
        );
    }

    #[test]
    fn test_combine_partials() {
        let mut left = IntSummaryStatistics::new();
        left.extend([1, 2, 3]);
        let mut right = IntSummaryStatistics::new();
        right.extend([10, -4]);

        left.combine(&right);
        assert_eq!(left.count(), 5);
        assert_eq!(left.sum(), 12);
        assert_eq!(left.min(), -4);
        assert_eq!(left.max(), 10);
    }

    #[test]
    fn test_sum_wraps_instead_of_panicking() {
        let mut stats = IntSummaryStatistics::new();
        stats.extend([i64::MAX, 1]);
        assert_eq!(stats.count(), 2);
        assert_eq!(stats.sum(), i64::MIN);
        assert_eq!(stats.max(), i64::MAX);

        let mut other = IntSummaryStatistics::new();
        other.accept(i64::MAX);
        other.combine(&stats);
        assert_eq!(other.sum(), -1);
        assert_eq!(other.count(), 3);
    }

    #[test]
    fn test_empty_summary() {
        let stats = IntSummaryStatistics::default();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.average(), 0.0);
        assert_eq!(stats.min(), i64::MAX);
        assert_eq!(stats.max(), i64::MIN);
    }
}
