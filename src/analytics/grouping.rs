//! Grouped reductions over event collections
//!
//! Every ranked or bucketed output is one `group_by` call: a key extractor
//! (returning `None` drops the record) and a reducer folding records into a
//! per-key accumulator. Categorical buckets that must always be present go
//! through `reindex`, which fills missing keys with the accumulator default.

use crate::types::EstimatedEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Group records by key and fold each group with `reduce_fn`
///
/// Keys iterate in ascending order, so downstream output is deterministic.
pub fn group_by<T, K, V, F, R>(records: &[T], key_fn: F, reduce_fn: R) -> BTreeMap<K, V>
where
    K: Ord,
    V: Default,
    F: Fn(&T) -> Option<K>,
    R: Fn(&mut V, &T),
{
    let mut groups: BTreeMap<K, V> = BTreeMap::new();
    for record in records {
        if let Some(key) = key_fn(record) {
            reduce_fn(groups.entry(key).or_default(), record);
        }
    }
    groups
}

/// Lay groups out on a fixed key order, filling absent keys with `V::default()`
pub fn reindex<K, V, I>(groups: &BTreeMap<K, V>, keys: I) -> Vec<(K, V)>
where
    K: Ord,
    V: Default + Clone,
    I: IntoIterator<Item = K>,
{
    keys.into_iter()
        .map(|key| {
            let value = groups.get(&key).cloned().unwrap_or_default();
            (key, value)
        })
        .collect()
}

/// Summed watch hours and event count of one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub hours: f64,
    pub count: u32,
}

impl GroupStats {
    pub fn add(&mut self, event: &EstimatedEvent) {
        self.hours += event.watch_time_hours;
        self.count += 1;
    }
}

/// Which reduction a ranking sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Hours,
    Count,
}

impl Metric {
    pub fn value(&self, stats: &GroupStats) -> f64 {
        match self {
            Metric::Hours => stats.hours,
            Metric::Count => stats.count as f64,
        }
    }
}

/// Hours and count per key for estimated watch events
pub fn watch_stats_by<K, F>(events: &[EstimatedEvent], key_fn: F) -> BTreeMap<K, GroupStats>
where
    K: Ord,
    F: Fn(&EstimatedEvent) -> Option<K>,
{
    group_by(events, key_fn, |stats: &mut GroupStats, event| stats.add(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_by_counts() {
        let words = ["apple", "avocado", "banana", "blueberry", "cherry"];
        let groups = group_by(
            &words,
            |w| w.chars().next(),
            |count: &mut usize, _| *count += 1,
        );

        let pairs: Vec<(char, usize)> = groups.into_iter().collect();
        assert_eq!(pairs, vec![('a', 2), ('b', 2), ('c', 1)]);
    }

    #[test]
    fn test_group_by_skips_absent_keys() {
        let values = [Some(1), None, Some(1), None];
        let groups = group_by(&values, |v| *v, |count: &mut u32, _| *count += 1);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get(&1), Some(&2));
    }

    #[test]
    fn test_reindex_fills_defaults() {
        let mut groups = BTreeMap::new();
        groups.insert(2u32, 5u32);
        groups.insert(7u32, 1u32);

        let reindexed = reindex(&groups, 0..4u32);
        assert_eq!(reindexed, vec![(0, 0), (1, 0), (2, 5), (3, 0)]);
    }

    #[test]
    fn test_metric_value() {
        let stats = GroupStats {
            hours: 1.5,
            count: 3,
        };
        assert_eq!(Metric::Hours.value(&stats), 1.5);
        assert_eq!(Metric::Count.value(&stats), 3.0);
    }
}
