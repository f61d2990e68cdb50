//! Model selection and evaluation: cross-validated comparison, repeated
//! holdout scoring, and whole-experiment holdout prediction.
//!
//! All scoring happens on the base-10 log scale of the corrosion rate; only
//! the predicted curves for held-out experiments are transformed back to
//! mm/year for reporting.
//!
//! A failing candidate (for example a family the factory cannot build) is
//! isolated, not fatal: its fold scores come back as NaN and it is simply
//! never selected as the best candidate. A comparison sweep over a mixed
//! candidate list therefore always completes.

use corrolab_data::{curation::ReplicaSet, observation::ReplicaKey};
use corrolab_stats::{descriptive::DescriptiveStats, metrics::RegressionMetrics};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    encoder::EncodedTable,
    regressor::{ModelFitError, ModelSpec, RegressorFactory},
    split::{SplitLeakageError, split_leave_experiments_out, split_random},
};

/// Scoring function used to rank candidates.
///
/// Both are "higher is better", so candidate ranking is always a max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum Scoring {
    /// Negated mean squared error.
    #[display("neg_mean_squared_error")]
    NegMeanSquaredError,
    /// Coefficient of determination.
    #[display("r2")]
    RSquared,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown scoring '{name}' (expected neg_mean_squared_error or r2)")]
pub struct ParseScoringError {
    pub name: String,
}

impl std::str::FromStr for Scoring {
    type Err = ParseScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neg_mean_squared_error" | "nmse" => Ok(Scoring::NegMeanSquaredError),
            "r2" => Ok(Scoring::RSquared),
            _ => Err(ParseScoringError {
                name: s.to_string(),
            }),
        }
    }
}

impl Scoring {
    /// Scores one prediction run; NaN when the metric is undefined.
    #[must_use]
    pub fn score(self, truth: &[f64], predicted: &[f64]) -> f64 {
        let value = match self {
            Scoring::NegMeanSquaredError => {
                corrolab_stats::metrics::mean_squared_error(truth, predicted).map(|mse| -mse)
            }
            Scoring::RSquared => corrolab_stats::metrics::r2_score(truth, predicted),
        };
        value.unwrap_or(f64::NAN)
    }
}

/// An evaluation-level failure.
#[derive(
    Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum EvaluateError {
    #[display("model failure: {source}")]
    Model { source: ModelFitError },
    #[display("split leakage: {source}")]
    Leakage { source: SplitLeakageError },
    #[display("cannot evaluate an empty table")]
    #[from(ignore)]
    EmptyTable,
}

/// Mean and spread of a score over repetitions or folds.
///
/// Both fields are NaN when any underlying score is NaN, so a failing
/// candidate stays visibly failing through aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl ScoreSummary {
    #[must_use]
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() || scores.iter().any(|s| s.is_nan()) {
            return Self {
                mean: f64::NAN,
                std_dev: f64::NAN,
            };
        }
        let stats = DescriptiveStats::new(scores.iter().copied()).unwrap();
        Self {
            mean: stats.mean,
            std_dev: stats.std_dev,
        }
    }
}

/// Scores a candidate with k-fold cross-validation over the table's current
/// row order.
///
/// Folds follow the usual convention: the first `len % folds` folds get one
/// extra row. Rows are not shuffled here; callers shuffle the table per
/// repetition so repeated calls see different fold assignments. Any fold
/// where the candidate fails to build, fit, or predict scores NaN.
#[must_use]
pub fn cross_val_score(
    factory: &dyn RegressorFactory,
    spec: &ModelSpec,
    table: &EncodedTable,
    folds: usize,
    scoring: Scoring,
) -> Vec<f64> {
    let n = table.len();
    if n == 0 || folds == 0 || folds > n {
        return vec![f64::NAN; folds];
    }
    let features = table.feature_matrix();
    let labels = table.labels();
    let base = n / folds;
    let extra = n % folds;
    let mut scores = vec![];
    let mut start = 0;
    for fold in 0..folds {
        let size = base + usize::from(fold < extra);
        let test_range = start..start + size;
        start += size;

        let train_features: Vec<Vec<f64>> = features
            .iter()
            .enumerate()
            .filter(|(i, _)| !test_range.contains(i))
            .map(|(_, row)| row.clone())
            .collect();
        let train_labels: Vec<f64> = labels
            .iter()
            .enumerate()
            .filter(|(i, _)| !test_range.contains(i))
            .map(|(_, label)| *label)
            .collect();
        let test_features = &features[test_range.clone()];
        let test_labels = &labels[test_range];

        scores.push(score_once(
            factory,
            spec,
            &train_features,
            &train_labels,
            test_features,
            test_labels,
            scoring,
        ));
    }
    scores
}

fn score_once(
    factory: &dyn RegressorFactory,
    spec: &ModelSpec,
    train_features: &[Vec<f64>],
    train_labels: &[f64],
    test_features: &[Vec<f64>],
    test_labels: &[f64],
    scoring: Scoring,
) -> f64 {
    let attempt = || -> Result<f64, ModelFitError> {
        let mut model = factory.build(spec)?;
        model.fit(train_features, train_labels)?;
        let predicted = model.predict(test_features)?;
        Ok(scoring.score(test_labels, &predicted))
    };
    attempt().unwrap_or(f64::NAN)
}

/// One candidate's row in a comparison report.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateReport {
    pub label: String,
    pub spec: ModelSpec,
    /// One cross-validated score per repetition: the mean of that
    /// repetition's fold scores. NaN when any fold of the repetition failed.
    pub scores: Vec<f64>,
    /// Mean and spread of the per-repetition scores.
    pub summary: ScoreSummary,
}

/// Result of a cross-validated comparison sweep.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub scoring: Scoring,
    pub folds: usize,
    pub repetitions: usize,
    pub candidates: Vec<CandidateReport>,
    /// Label of the best candidate: highest mean score among candidates with
    /// a defined mean, first listed wins ties. `None` when every candidate
    /// failed.
    pub best: Option<String>,
}

/// Compares candidates by repeated k-fold cross-validation.
///
/// Each repetition reshuffles the table once and scores every candidate on
/// the same fold assignment, so candidates within a repetition see identical
/// data. A repetition contributes one score per candidate (the mean over its
/// folds); mean and spread are taken across repetitions.
#[expect(clippy::cast_precision_loss)]
pub fn compare_candidates<R>(
    factory: &dyn RegressorFactory,
    candidates: &[ModelSpec],
    table: &EncodedTable,
    folds: usize,
    repetitions: usize,
    scoring: Scoring,
    rng: &mut R,
) -> ComparisonReport
where
    R: Rng + ?Sized,
{
    let mut all_scores: Vec<Vec<f64>> = vec![vec![]; candidates.len()];
    for _ in 0..repetitions {
        let shuffled = table.shuffled(rng);
        for (spec, scores) in candidates.iter().zip(&mut all_scores) {
            let fold_scores = cross_val_score(factory, spec, &shuffled, folds, scoring);
            // NaN folds poison the repetition mean, keeping failures visible.
            scores.push(fold_scores.iter().sum::<f64>() / fold_scores.len() as f64);
        }
    }
    let reports: Vec<CandidateReport> = candidates
        .iter()
        .zip(all_scores)
        .map(|(spec, scores)| CandidateReport {
            label: spec.label(),
            spec: spec.clone(),
            summary: ScoreSummary::from_scores(&scores),
            scores,
        })
        .collect();
    let best = reports
        .iter()
        .filter(|report| !report.summary.mean.is_nan())
        .fold(None::<&CandidateReport>, |best, report| match best {
            Some(current) if current.summary.mean >= report.summary.mean => Some(current),
            _ => Some(report),
        })
        .map(|report| report.label.clone());
    ComparisonReport {
        scoring,
        folds,
        repetitions,
        candidates: reports,
        best,
    }
}

/// Holdout metrics for one model, aggregated over repetitions.
#[derive(Debug, Clone, Serialize)]
pub struct HoldoutReport {
    pub label: String,
    pub repetitions: usize,
    pub test_size: f64,
    pub r2: ScoreSummary,
    pub mse: ScoreSummary,
    pub mae: ScoreSummary,
    pub rmse: ScoreSummary,
}

/// Scores one model by repeated random holdout.
///
/// Every repetition draws a fresh shuffled split, fits from scratch, and
/// computes the four regression metrics on the held-out rows. Unlike a
/// comparison sweep this evaluates a single chosen model, so a fit failure
/// propagates instead of being folded into NaN.
pub fn repeated_holdout<R>(
    factory: &dyn RegressorFactory,
    spec: &ModelSpec,
    table: &EncodedTable,
    test_size: f64,
    repetitions: usize,
    rng: &mut R,
) -> Result<HoldoutReport, EvaluateError>
where
    R: Rng + ?Sized,
{
    if table.is_empty() {
        return Err(EvaluateError::EmptyTable);
    }
    let mut r2 = vec![];
    let mut mse = vec![];
    let mut mae = vec![];
    let mut rmse = vec![];
    for _ in 0..repetitions {
        let pair = split_random(table, test_size, rng);
        let mut model = factory.build(spec)?;
        model.fit(&pair.train.feature_matrix(), &pair.train.labels())?;
        let predicted = model.predict(&pair.test.feature_matrix())?;
        match RegressionMetrics::compute(&pair.test.labels(), &predicted) {
            Some(metrics) => {
                r2.push(metrics.r2);
                mse.push(metrics.mse);
                mae.push(metrics.mae);
                rmse.push(metrics.rmse);
            }
            None => {
                r2.push(f64::NAN);
                mse.push(f64::NAN);
                mae.push(f64::NAN);
                rmse.push(f64::NAN);
            }
        }
    }
    Ok(HoldoutReport {
        label: spec.label(),
        repetitions,
        test_size,
        r2: ScoreSummary::from_scores(&r2),
        mse: ScoreSummary::from_scores(&mse),
        mae: ScoreSummary::from_scores(&mae),
        rmse: ScoreSummary::from_scores(&rmse),
    })
}

/// One predicted point of a held-out replica, back on the linear scale.
#[derive(Debug, Clone, Serialize)]
pub struct PredictedPoint {
    /// Absolute replica time, hours.
    pub time_hrs: f64,
    pub predicted_mm_yr: f64,
    pub observed_mm_yr: f64,
}

/// Predicted corrosion curve for one held-out replica.
#[derive(Debug, Clone, Serialize)]
pub struct PredictedCurve {
    pub replica: ReplicaKey,
    pub points: Vec<PredictedPoint>,
}

/// Result of predicting whole held-out experiments.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentHoldoutReport {
    pub label: String,
    pub held_out: Vec<u32>,
    /// Log-scale R² over all held-out rows; NaN when undefined.
    pub r2: f64,
    /// Log-scale RMSE over all held-out rows; NaN when undefined.
    pub rmse: f64,
    pub curves: Vec<PredictedCurve>,
}

/// Fits on everything except the held-out experiments and predicts their
/// corrosion curves.
///
/// Held-out rows of replicas in `representative_excluded` are dropped before
/// prediction, leaving one representative curve per experiment. The report
/// carries one curve per surviving replica, ordered by first appearance,
/// with predictions and observations transformed back to mm/year.
pub fn predict_held_out_experiments(
    factory: &dyn RegressorFactory,
    spec: &ModelSpec,
    table: &EncodedTable,
    held_out: &[u32],
    representative_excluded: &ReplicaSet,
) -> Result<ExperimentHoldoutReport, EvaluateError> {
    let pair = split_leave_experiments_out(table, held_out, representative_excluded)?;
    if pair.test.is_empty() {
        return Err(EvaluateError::EmptyTable);
    }
    let mut model = factory.build(spec)?;
    model.fit(&pair.train.feature_matrix(), &pair.train.labels())?;
    let predicted = model.predict(&pair.test.feature_matrix())?;

    let truth = pair.test.labels();
    let r2 = corrolab_stats::metrics::r2_score(&truth, &predicted).unwrap_or(f64::NAN);
    let rmse =
        corrolab_stats::metrics::root_mean_squared_error(&truth, &predicted).unwrap_or(f64::NAN);

    let mut curves: Vec<PredictedCurve> = vec![];
    for (row, prediction) in pair.test.rows.iter().zip(&predicted) {
        let point = PredictedPoint {
            time_hrs: row.time_hrs_original,
            predicted_mm_yr: 10f64.powf(*prediction),
            observed_mm_yr: 10f64.powf(row.label),
        };
        match curves.iter_mut().find(|c| c.replica == row.replica) {
            Some(curve) => curve.points.push(point),
            None => curves.push(PredictedCurve {
                replica: row.replica.clone(),
                points: vec![point],
            }),
        }
    }

    Ok(ExperimentHoldoutReport {
        label: spec.label(),
        held_out: held_out.to_vec(),
        r2,
        rmse,
        curves,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use crate::{
        encoder::EncodedRow,
        regressor::{BuiltinRegressorFactory, KnnParams, KnnWeighting, MlpParams},
    };

    use super::*;

    fn knn_spec(n_neighbors: usize) -> ModelSpec {
        ModelSpec::Knn(KnnParams {
            n_neighbors,
            weighting: KnnWeighting::Uniform,
        })
    }

    /// A table where the label equals the single feature, so 1-NN
    /// interpolates almost perfectly.
    fn linear_table(n: usize) -> EncodedTable {
        EncodedTable {
            feature_names: vec!["x".into()],
            rows: (0..n)
                .map(|i| {
                    #[expect(clippy::cast_precision_loss)]
                    let x = i as f64;
                    EncodedRow {
                        replica: ReplicaKey::new(u32::try_from(i / 4).unwrap() + 1, "Test"),
                        time_hrs_original: x,
                        features: vec![x],
                        label: x,
                    }
                })
                .collect(),
            unknown_categories: 0,
        }
    }

    #[test]
    fn test_cross_val_score_returns_one_score_per_fold() {
        let table = linear_table(20);
        let scores = cross_val_score(
            &BuiltinRegressorFactory,
            &knn_spec(1),
            &table,
            5,
            Scoring::NegMeanSquaredError,
        );
        assert_eq!(scores.len(), 5);
        for score in scores {
            assert!(score.is_finite());
            assert!(score <= 0.0);
        }
    }

    #[test]
    fn test_unsupported_candidate_scores_nan() {
        let table = linear_table(10);
        let spec = ModelSpec::Mlp(MlpParams {
            hidden_layers: vec![8],
        });
        let scores = cross_val_score(
            &BuiltinRegressorFactory,
            &spec,
            &table,
            5,
            Scoring::RSquared,
        );
        assert!(scores.iter().all(|s| s.is_nan()));
    }

    #[test]
    fn test_comparison_isolates_failures_and_picks_best() {
        let table = linear_table(20);
        let candidates = vec![
            ModelSpec::Mlp(MlpParams {
                hidden_layers: vec![8],
            }),
            knn_spec(1),
            knn_spec(5),
        ];
        let mut rng = Pcg32::seed_from_u64(11);
        let report = compare_candidates(
            &BuiltinRegressorFactory,
            &candidates,
            &table,
            5,
            3,
            Scoring::NegMeanSquaredError,
            &mut rng,
        );
        assert_eq!(report.candidates.len(), 3);
        // One cross-validated score per repetition.
        assert_eq!(report.candidates[0].scores.len(), 3);
        assert!(report.candidates[0].summary.mean.is_nan());
        // 1-NN tracks the linear label better than 5-NN.
        let best = report.best.unwrap();
        assert_eq!(best, "KNN_1_uniform");
    }

    #[test]
    fn test_summary_spread_is_across_repetition_means() {
        let table = linear_table(23);
        let mut rng = Pcg32::seed_from_u64(5);
        let report = compare_candidates(
            &BuiltinRegressorFactory,
            &[knn_spec(3)],
            &table,
            5,
            4,
            Scoring::NegMeanSquaredError,
            &mut rng,
        );
        let candidate = &report.candidates[0];
        assert_eq!(candidate.scores.len(), 4);
        // The summary describes the four repetition means, not the twenty
        // raw fold scores; fold-to-fold variance within a repetition must
        // not inflate the reported spread.
        let stats = DescriptiveStats::new(candidate.scores.iter().copied()).unwrap();
        assert!((candidate.summary.mean - stats.mean).abs() < 1e-12);
        assert!((candidate.summary.std_dev - stats.std_dev).abs() < 1e-12);
        assert!(candidate.scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_all_failing_candidates_yield_no_best() {
        let table = linear_table(10);
        let candidates = vec![ModelSpec::Mlp(MlpParams {
            hidden_layers: vec![8],
        })];
        let mut rng = Pcg32::seed_from_u64(1);
        let report = compare_candidates(
            &BuiltinRegressorFactory,
            &candidates,
            &table,
            5,
            1,
            Scoring::RSquared,
            &mut rng,
        );
        assert!(report.best.is_none());
    }

    #[test]
    fn test_repeated_holdout_reports_all_metrics() {
        let table = linear_table(24);
        let mut rng = Pcg32::seed_from_u64(3);
        let report = repeated_holdout(
            &BuiltinRegressorFactory,
            &knn_spec(1),
            &table,
            0.25,
            5,
            &mut rng,
        )
        .unwrap();
        assert_eq!(report.repetitions, 5);
        assert!(report.r2.mean.is_finite());
        assert!(report.mse.mean >= 0.0);
        assert!((report.rmse.mean - report.rmse.mean.abs()).abs() < 1e-12);
    }

    #[test]
    fn test_repeated_holdout_rejects_empty_table() {
        let table = EncodedTable {
            feature_names: vec![],
            rows: vec![],
            unknown_categories: 0,
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let err = repeated_holdout(
            &BuiltinRegressorFactory,
            &knn_spec(1),
            &table,
            0.25,
            2,
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, EvaluateError::EmptyTable);
    }

    #[test]
    fn test_held_out_experiment_curves_are_linear_scale() {
        let table = linear_table(20);
        let report = predict_held_out_experiments(
            &BuiltinRegressorFactory,
            &knn_spec(1),
            &table,
            &[5],
            &ReplicaSet::default(),
        )
        .unwrap();
        assert_eq!(report.held_out, vec![5]);
        assert_eq!(report.curves.len(), 1);
        let curve = &report.curves[0];
        assert_eq!(curve.replica.experiment_id, 5);
        assert_eq!(curve.points.len(), 4);
        // Observations are 10^label, not the raw log-scale label.
        assert!((curve.points[0].observed_mm_yr - 10f64.powf(16.0)).abs() < 1e3);
    }

    #[test]
    fn test_scoring_parses_and_displays() {
        assert_eq!(
            "neg_mean_squared_error".parse::<Scoring>().unwrap(),
            Scoring::NegMeanSquaredError
        );
        assert_eq!("r2".parse::<Scoring>().unwrap(), Scoring::RSquared);
        assert_eq!(Scoring::RSquared.to_string(), "r2");
        assert!("accuracy".parse::<Scoring>().is_err());
    }
}
