//! Built-in k-nearest-neighbours regressor.
//!
//! The reference implementation of the [`Regressor`](crate::regressor::Regressor)
//! capability, used to exercise the evaluation harness end to end without an
//! external model collaborator. Semantics follow scikit-learn's
//! `KNeighborsRegressor`: Euclidean distance, uniform or inverse-distance
//! weighting, and exact matches dominating under distance weighting.

use crate::regressor::{KnnParams, KnnWeighting, ModelFitError, Regressor};

/// A lazy-learning regressor: fit stores the training rows, predict averages
/// the labels of the k nearest neighbours.
#[derive(Debug, Clone)]
pub struct KnnRegressor {
    params: KnnParams,
    train_features: Vec<Vec<f64>>,
    train_labels: Vec<f64>,
}

impl KnnRegressor {
    #[must_use]
    pub fn new(params: KnnParams) -> Self {
        Self {
            params,
            train_features: vec![],
            train_labels: vec![],
        }
    }

    fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
    }

    /// Indices and squared distances of the k nearest training rows.
    fn nearest(&self, row: &[f64]) -> Vec<(usize, f64)> {
        let mut distances: Vec<(usize, f64)> = self
            .train_features
            .iter()
            .enumerate()
            .map(|(i, train_row)| (i, Self::squared_distance(row, train_row)))
            .collect();
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(self.params.n_neighbors);
        distances
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let neighbors = self.nearest(row);
        match self.params.weighting {
            KnnWeighting::Uniform => {
                let sum: f64 = neighbors.iter().map(|&(i, _)| self.train_labels[i]).sum();
                #[expect(clippy::cast_precision_loss)]
                let n = neighbors.len() as f64;
                sum / n
            }
            KnnWeighting::Distance => {
                // Exact matches get infinite weight; average them and ignore
                // the rest, matching scikit-learn.
                let exact: Vec<usize> = neighbors
                    .iter()
                    .filter(|&&(_, d)| d == 0.0)
                    .map(|&(i, _)| i)
                    .collect();
                if !exact.is_empty() {
                    let sum: f64 = exact.iter().map(|&i| self.train_labels[i]).sum();
                    #[expect(clippy::cast_precision_loss)]
                    let n = exact.len() as f64;
                    return sum / n;
                }
                let mut weighted_sum = 0.0;
                let mut weight_total = 0.0;
                for &(i, squared) in &neighbors {
                    let weight = 1.0 / squared.sqrt();
                    weighted_sum += weight * self.train_labels[i];
                    weight_total += weight;
                }
                weighted_sum / weight_total
            }
        }
    }
}

impl Regressor for KnnRegressor {
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<(), ModelFitError> {
        if features.is_empty() {
            return Err(ModelFitError::EmptyTrainingSet);
        }
        if features.len() < self.params.n_neighbors {
            return Err(ModelFitError::InsufficientRows {
                requested: self.params.n_neighbors,
                available: features.len(),
            });
        }
        self.train_features = features.to_vec();
        self.train_labels = labels.to_vec();
        Ok(())
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelFitError> {
        if self.train_features.is_empty() {
            return Err(ModelFitError::NotFitted);
        }
        let expected = self.train_features[0].len();
        for row in features {
            if row.len() != expected {
                return Err(ModelFitError::FeatureCountMismatch {
                    expected,
                    actual: row.len(),
                });
            }
        }
        Ok(features.iter().map(|row| self.predict_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(params: KnnParams) -> KnnRegressor {
        let mut model = KnnRegressor::new(params);
        let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0]];
        let labels = vec![0.0, 1.0, 2.0, 10.0];
        model.fit(&features, &labels).unwrap();
        model
    }

    #[test]
    fn test_uniform_weighting_averages_neighbors() {
        let model = fitted(KnnParams {
            n_neighbors: 3,
            weighting: KnnWeighting::Uniform,
        });
        // Nearest three to 1.0 are {0, 1, 2}.
        let predicted = model.predict(&[vec![1.0]]).unwrap();
        assert!((predicted[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_distance_weighting_prefers_closer_rows() {
        let model = fitted(KnnParams {
            n_neighbors: 2,
            weighting: KnnWeighting::Distance,
        });
        // Query at 1.5: neighbours 1.0 and 2.0 equidistant -> mean 1.5.
        let predicted = model.predict(&[vec![1.5]]).unwrap();
        assert!((predicted[0] - 1.5).abs() < 1e-12);

        // Query at 1.9: neighbour 2.0 dominates.
        let predicted = model.predict(&[vec![1.9]]).unwrap();
        assert!(predicted[0] > 1.5);
    }

    #[test]
    fn test_exact_match_dominates_distance_weighting() {
        let model = fitted(KnnParams {
            n_neighbors: 3,
            weighting: KnnWeighting::Distance,
        });
        let predicted = model.predict(&[vec![2.0]]).unwrap();
        assert_eq!(predicted[0], 2.0);
    }

    #[test]
    fn test_fit_rejects_empty_training_set() {
        let mut model = KnnRegressor::new(KnnParams {
            n_neighbors: 1,
            weighting: KnnWeighting::Uniform,
        });
        assert_eq!(
            model.fit(&[], &[]).unwrap_err(),
            ModelFitError::EmptyTrainingSet
        );
    }

    #[test]
    fn test_fit_rejects_too_few_rows() {
        let mut model = KnnRegressor::new(KnnParams {
            n_neighbors: 5,
            weighting: KnnWeighting::Uniform,
        });
        let err = model.fit(&[vec![0.0]], &[1.0]).unwrap_err();
        assert_eq!(
            err,
            ModelFitError::InsufficientRows {
                requested: 5,
                available: 1
            }
        );
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = KnnRegressor::new(KnnParams {
            n_neighbors: 1,
            weighting: KnnWeighting::Uniform,
        });
        assert_eq!(
            model.predict(&[vec![0.0]]).unwrap_err(),
            ModelFitError::NotFitted
        );
    }

    #[test]
    fn test_predict_rejects_width_mismatch() {
        let model = fitted(KnnParams {
            n_neighbors: 1,
            weighting: KnnWeighting::Uniform,
        });
        let err = model.predict(&[vec![0.0, 1.0]]).unwrap_err();
        assert_eq!(
            err,
            ModelFitError::FeatureCountMismatch {
                expected: 1,
                actual: 2
            }
        );
    }
}
