//! Splitting a source into contiguous partitions for the worker pool.

use itertools::Itertools;

/// A contiguous run of source elements; `index` is its position among its siblings.
pub(crate) struct Partition<S> {
    pub(crate) index: usize,
    pub(crate) items: Vec<S>,
}

/// Elements per partition so that every worker gets roughly `per_worker` leaves.
pub(crate) fn leaf_len(total: usize, workers: usize, per_worker: usize) -> usize {
    let target = workers.max(1) * per_worker.max(1);
    total.div_ceil(target).max(1)
}

/// Cuts `items` into partitions of at most `leaf_len` elements, in source order.
pub(crate) fn split<S>(items: Vec<S>, leaf_len: usize) -> Vec<Partition<S>> {
    let chunks = items.into_iter().chunks(leaf_len.max(1));
    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| Partition {
            index,
            items: chunk.collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_len() {
        assert_eq!(leaf_len(4, 1, 4), 1);
        assert_eq!(leaf_len(100, 2, 4), 13);
        assert_eq!(leaf_len(0, 8, 4), 1);
        assert_eq!(leaf_len(10, 0, 0), 10);
    }

    #[test]
    fn test_split_is_contiguous() {
        let parts = split((1..=7).collect(), 3);
        let shapes: Vec<(usize, Vec<i32>)> = parts.into_iter().map(|p| (p.index, p.items)).collect();
        assert_eq!(
            shapes,
            vec![(0, vec![1, 2, 3]), (1, vec![4, 5, 6]), (2, vec![7])]
        );
    }

    #[test]
    fn test_small_input_gets_several_partitions() {
        let total = 4;
        let parts = split(vec!['a', 'b', 'c', 'd'], leaf_len(total, 1, 4));
        assert_eq!(parts.len(), 4);
    }

    #[test]
    fn test_split_empty() {
        assert!(split(Vec::<u8>::new(), 4).is_empty());
    }
}
