//! Train/test splitting strategies.
//!
//! Two strategies operate on an [`EncodedTable`]:
//!
//! - [`split_random`] shuffles rows and cuts by fraction, matching the
//!   shuffled-row holdout used for model comparison;
//! - [`split_leave_experiments_out`] holds out whole experiments, so test
//!   replicas are conditions the model has never seen. The held-out side is
//!   reduced to one representative replica per experiment by a curated
//!   exclusion list (the "representative reduction").
//!
//! Leave-experiment-out splits end with a leakage check: a replica appearing
//! on both sides would silently turn extrapolation into interpolation, so it
//! is a fatal [`SplitLeakageError`] rather than a warning.

use corrolab_data::{curation::ReplicaSet, observation::ReplicaKey};
use rand::Rng;

use crate::encoder::EncodedTable;

/// A replica landed in both the training and the test side of a split.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("replica {replica} appears in both train and test sets")]
pub struct SplitLeakageError {
    pub replica: ReplicaKey,
}

/// A train/test pair produced by one of the split strategies.
#[derive(Debug, Clone)]
pub struct SplitPair {
    pub train: EncodedTable,
    pub test: EncodedTable,
}

/// Shuffles rows and splits by fraction.
///
/// The training side gets `floor((1 - test_size) * len)` rows, the test side
/// the remainder. Row-level splitting deliberately mixes replicas across the
/// two sides; use [`split_leave_experiments_out`] when generalization to
/// unseen conditions is the question.
#[must_use]
pub fn split_random<R>(table: &EncodedTable, test_size: f64, rng: &mut R) -> SplitPair
where
    R: Rng + ?Sized,
{
    let shuffled = table.shuffled(rng);
    #[expect(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let train_len = ((1.0 - test_size) * shuffled.len() as f64) as usize;
    let mut rows = shuffled.rows;
    let test_rows = rows.split_off(train_len);
    SplitPair {
        train: table.with_rows(rows),
        test: table.with_rows(test_rows),
    }
}

/// Holds out whole experiments and verifies the sides are replica-disjoint.
///
/// Rows of the experiments in `held_out` form the test side, minus any
/// replica in `representative_excluded` (sibling replicas curated away so a
/// single representative curve remains per held-out experiment). All
/// remaining rows form the training side.
pub fn split_leave_experiments_out(
    table: &EncodedTable,
    held_out: &[u32],
    representative_excluded: &ReplicaSet,
) -> Result<SplitPair, SplitLeakageError> {
    let mut train_rows = vec![];
    let mut test_rows = vec![];
    for row in &table.rows {
        if held_out.contains(&row.replica.experiment_id) {
            if !representative_excluded.contains(&row.replica) {
                test_rows.push(row.clone());
            }
        } else {
            train_rows.push(row.clone());
        }
    }
    let pair = SplitPair {
        train: table.with_rows(train_rows),
        test: table.with_rows(test_rows),
    };
    check_disjoint(&pair)?;
    Ok(pair)
}

/// Verifies that no replica contributes rows to both sides of a split.
pub fn check_disjoint(pair: &SplitPair) -> Result<(), SplitLeakageError> {
    for row in &pair.test.rows {
        if pair
            .train
            .rows
            .iter()
            .any(|train_row| train_row.replica == row.replica)
        {
            return Err(SplitLeakageError {
                replica: row.replica.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::encoder::EncodedRow;

    use super::*;

    fn table(rows: &[(u32, &str)]) -> EncodedTable {
        EncodedTable {
            feature_names: vec!["x".into()],
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, &(experiment_id, replica_id))| EncodedRow {
                    replica: ReplicaKey::new(experiment_id, replica_id),
                    time_hrs_original: 0.0,
                    #[expect(clippy::cast_precision_loss)]
                    features: vec![i as f64],
                    label: 0.0,
                })
                .collect(),
            unknown_categories: 0,
        }
    }

    #[test]
    fn test_random_split_sizes_truncate() {
        let table = table(&[(1, "a"), (1, "b"), (1, "c"), (2, "d"), (2, "e")]);
        let mut rng = Pcg32::seed_from_u64(7);
        let pair = split_random(&table, 0.3, &mut rng);
        // floor(0.7 * 5) = 3 training rows.
        assert_eq!(pair.train.len(), 3);
        assert_eq!(pair.test.len(), 2);
    }

    #[test]
    fn test_random_split_partitions_rows() {
        let table = table(&[(1, "a"), (1, "b"), (1, "c"), (2, "d")]);
        let mut rng = Pcg32::seed_from_u64(7);
        let pair = split_random(&table, 0.25, &mut rng);
        let mut features: Vec<f64> = pair
            .train
            .rows
            .iter()
            .chain(&pair.test.rows)
            .map(|row| row.features[0])
            .collect();
        features.sort_by(f64::total_cmp);
        assert_eq!(features, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_leave_experiments_out_holds_out_whole_experiments() {
        let table = table(&[(1, "a"), (2, "b"), (2, "c"), (3, "d")]);
        let pair =
            split_leave_experiments_out(&table, &[2], &ReplicaSet::default()).unwrap();
        assert_eq!(pair.test.len(), 2);
        assert_eq!(pair.train.experiment_ids(), vec![1, 3]);
        assert_eq!(pair.test.experiment_ids(), vec![2]);
    }

    #[test]
    fn test_representative_reduction_thins_held_out_side_only() {
        let table = table(&[(1, "a"), (2, "b"), (2, "c")]);
        let excluded = ReplicaSet::from_pairs([(1, "a"), (2, "c")]);
        let pair = split_leave_experiments_out(&table, &[2], &excluded).unwrap();
        // exp2/c is reduced away from the held-out side; exp1/a stays in
        // training because the reduction never touches that side.
        assert_eq!(pair.test.len(), 1);
        assert_eq!(pair.test.rows[0].replica, ReplicaKey::new(2, "b"));
        assert_eq!(pair.train.len(), 1);
        assert_eq!(pair.train.rows[0].replica, ReplicaKey::new(1, "a"));
    }

    #[test]
    fn test_leakage_check_catches_shared_replica() {
        let table = table(&[(1, "a"), (2, "b")]);
        let pair = SplitPair {
            train: table.clone(),
            test: table.with_rows(vec![table.rows[0].clone()]),
        };
        let err = check_disjoint(&pair).unwrap_err();
        assert_eq!(err.replica, ReplicaKey::new(1, "a"));
    }
}
