//! Hand-curated replica lists as explicit configuration data.
//!
//! Two curated lists drive the pipeline:
//!
//! - the **exclusion set**: outlier or invalid replicas removed from the
//!   "selected" dataset view before any model work;
//! - the **representative-reduction set**: a larger list applied only to
//!   leave-experiment-out test folds so that a single representative replica
//!   per held-out experiment remains.
//!
//! Both are data, not code: they deserialize from JSON and are passed to the
//! pipeline at the point of use, so the rosters can be revised without
//! touching pipeline logic.

use serde::{Deserialize, Serialize};

use crate::observation::ReplicaKey;

/// An ordered set of replica keys.
///
/// Insertion order is preserved and duplicates are dropped on construction.
///
/// # Examples
///
/// ```
/// use corrolab_data::{curation::ReplicaSet, observation::ReplicaKey};
///
/// let set = ReplicaSet::from_pairs([(5, "Test 5"), (5, "Test 6")]);
/// assert!(set.contains(&ReplicaKey::new(5, "Test 5")));
/// assert!(!set.contains(&ReplicaKey::new(6, "Test 5")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplicaSet {
    pairs: Vec<ReplicaKey>,
}

impl ReplicaSet {
    #[must_use]
    pub fn new(pairs: Vec<ReplicaKey>) -> Self {
        let mut deduped: Vec<ReplicaKey> = vec![];
        for pair in pairs {
            if !deduped.contains(&pair) {
                deduped.push(pair);
            }
        }
        Self { pairs: deduped }
    }

    /// Builds a set from `(experiment_id, replica_id)` pairs.
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(experiment_id, replica_id)| ReplicaKey::new(experiment_id, replica_id))
                .collect(),
        )
    }

    #[must_use]
    pub fn contains(&self, key: &ReplicaKey) -> bool {
        self.pairs.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReplicaKey> {
        self.pairs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The full curation roster consumed by a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurationConfig {
    /// Replicas excluded from the selected training view.
    pub excluded: ReplicaSet,
    /// Replicas removed from leave-experiment-out test folds, leaving one
    /// representative replica per experiment.
    pub representative_excluded: ReplicaSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_dropped() {
        let set = ReplicaSet::from_pairs([(1, "a"), (1, "a"), (2, "b")]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let set = ReplicaSet::from_pairs([(3, "c"), (1, "a"), (2, "b")]);
        let ids: Vec<u32> = set.iter().map(|k| k.experiment_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_key_matches_on_full_pair() {
        // "SD 43" exists in several experiments in principle; exclusion must
        // not leak across experiments.
        let set = ReplicaSet::from_pairs([(19, "SD 43")]);
        assert!(set.contains(&ReplicaKey::new(19, "SD 43")));
        assert!(!set.contains(&ReplicaKey::new(20, "SD 43")));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = CurationConfig {
            excluded: ReplicaSet::from_pairs([(5, "Test 5")]),
            representative_excluded: ReplicaSet::from_pairs([(6, "Test 10"), (6, "Test 11")]),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CurationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
