//! Splitting object store writes into size-bounded batches

use assembly_core::{ImportConfig, StoreResult};
use serde::Serialize;
use std::ops::Range;

/// Estimated payload of one object as sent to the object store.
///
/// Serialised JSON length of `{"params": value}`. An approximation of the wire
/// size, which is why limits carry a safety factor.
pub fn estimate_serialized_size<T: Serialize>(value: &T) -> StoreResult<usize> {
    #[derive(Serialize)]
    struct Envelope<'a, T> {
        params: &'a T,
    }
    Ok(serde_json::to_vec(&Envelope { params: value })?.len())
}

/// Partitions ordered items so no batch exceeds a cumulative payload limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlanner {
    max_payload: usize,
}

impl BatchPlanner {
    pub fn new(max_payload: usize) -> Self {
        Self { max_payload }
    }

    pub fn from_config(config: &ImportConfig) -> Self {
        Self::new(config.max_batch_payload())
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Contiguous index ranges covering `sizes` in order.
    ///
    /// A batch is closed as soon as the next item would push it over the
    /// limit. An item larger than the limit on its own gets a batch to itself.
    /// No range is ever empty.
    pub fn plan(&self, sizes: &[usize]) -> Vec<Range<usize>> {
        let mut batches = Vec::new();
        let mut start = 0;
        let mut cumulative = 0usize;

        for (idx, &size) in sizes.iter().enumerate() {
            if idx == start || cumulative.saturating_add(size) <= self.max_payload {
                cumulative = cumulative.saturating_add(size);
            } else {
                batches.push(start..idx);
                start = idx;
                cumulative = size;
            }
        }
        if start < sizes.len() {
            batches.push(start..sizes.len());
        }
        batches
    }

    /// Split owned items into batches using precomputed sizes
    pub fn split<T>(&self, items: Vec<T>, sizes: &[usize]) -> Vec<Vec<T>> {
        debug_assert_eq!(items.len(), sizes.len());
        let mut items = items.into_iter();
        self.plan(sizes)
            .into_iter()
            .map(|range| items.by_ref().take(range.len()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_everything_fits_in_one_batch() {
        let planner = BatchPlanner::new(100);
        assert_eq!(planner.plan(&[10, 20, 30]), vec![0..3]);
    }

    #[test]
    fn test_limit_is_inclusive() {
        let planner = BatchPlanner::new(60);
        assert_eq!(planner.plan(&[30, 30, 1]), vec![0..2, 2..3]);
    }

    #[test]
    fn test_oversized_items_stand_alone() {
        let planner = BatchPlanner::new(50);
        assert_eq!(planner.plan(&[80]), vec![0..1]);
        assert_eq!(planner.plan(&[10, 80, 10, 10]), vec![0..1, 1..2, 2..4]);
        assert_eq!(planner.plan(&[80, 90]), vec![0..1, 1..2]);
    }

    #[test]
    fn test_empty_input() {
        let planner = BatchPlanner::new(50);
        assert!(planner.plan(&[]).is_empty());
        assert!(planner.split(Vec::<u8>::new(), &[]).is_empty());
    }

    #[test]
    fn test_split_items() {
        let planner = BatchPlanner::new(5);
        let batches = planner.split(vec!["a", "b", "c", "d"], &[3, 2, 4, 1]);
        assert_eq!(batches, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_from_config() {
        let config = ImportConfig {
            max_data_size: 200,
            safety_factor: 0.5,
            ..ImportConfig::default()
        };
        assert_eq!(BatchPlanner::from_config(&config).max_payload(), 100);
    }

    #[test]
    fn test_estimate_size_wraps_params() {
        let value = serde_json::json!({"md5": "x"});
        // {"params":{"md5":"x"}}
        assert_eq!(estimate_serialized_size(&value).unwrap(), 22);
    }

    proptest! {
        #[test]
        fn prop_batches_cover_input_and_respect_limit(
            sizes in prop::collection::vec(0usize..200, 0..60),
            limit in 1usize..300,
        ) {
            let planner = BatchPlanner::new(limit);
            let batches = planner.plan(&sizes);

            let mut expected_start = 0;
            for range in &batches {
                prop_assert!(!range.is_empty());
                prop_assert_eq!(range.start, expected_start);
                expected_start = range.end;

                let total: usize = sizes[range.clone()].iter().sum();
                prop_assert!(total <= limit || range.len() == 1);
            }
            prop_assert_eq!(expected_start, sizes.len());
        }
    }
}
