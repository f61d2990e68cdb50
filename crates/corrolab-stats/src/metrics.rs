//! Error metrics for regression model evaluation.
//!
//! All metrics operate on paired slices of true and predicted values and are
//! computed on whatever scale the caller provides; the corrosion pipeline
//! scores models on the base-10 log scale of the corrosion rate.

/// Bundle of the four regression metrics reported by the evaluation harness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMetrics {
    /// Coefficient of determination (R²).
    pub r2: f64,
    /// Mean squared error.
    pub mse: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Root mean squared error.
    pub rmse: f64,
}

impl RegressionMetrics {
    /// Computes all four metrics for a prediction run.
    ///
    /// # Returns
    ///
    /// * `Some(RegressionMetrics)` - if the slices are non-empty and of equal length
    /// * `None` - otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// # use corrolab_stats::metrics::RegressionMetrics;
    /// let truth = [3.0, -0.5, 2.0, 7.0];
    /// let predicted = [2.5, 0.0, 2.0, 8.0];
    /// let metrics = RegressionMetrics::compute(&truth, &predicted).unwrap();
    /// assert!((metrics.mse - 0.375).abs() < 1e-12);
    /// assert!((metrics.mae - 0.5).abs() < 1e-12);
    /// ```
    #[must_use]
    pub fn compute(truth: &[f64], predicted: &[f64]) -> Option<Self> {
        if truth.is_empty() || truth.len() != predicted.len() {
            return None;
        }
        let mse = mean_squared_error(truth, predicted)?;
        Some(Self {
            r2: r2_score(truth, predicted)?,
            mse,
            mae: mean_absolute_error(truth, predicted)?,
            rmse: mse.sqrt(),
        })
    }
}

/// Coefficient of determination (R² score).
///
/// `1 - SS_res / SS_tot`. A constant truth vector has zero total variance;
/// in that case the score is 1.0 for a perfect fit and 0.0 otherwise,
/// matching scikit-learn's convention.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> Option<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return None;
    }
    let mean = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_tot = truth.iter().map(|t| (t - mean).powi(2)).sum::<f64>();
    let ss_res = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>();
    if ss_tot == 0.0 {
        return Some(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Some(1.0 - ss_res / ss_tot)
}

/// Mean squared error between true and predicted values.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> Option<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return None;
    }
    let sum = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>();
    Some(sum / truth.len() as f64)
}

/// Mean absolute error between true and predicted values.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> Option<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return None;
    }
    let sum = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>();
    Some(sum / truth.len() as f64)
}

/// Root mean squared error between true and predicted values.
#[must_use]
pub fn root_mean_squared_error(truth: &[f64], predicted: &[f64]) -> Option<f64> {
    mean_squared_error(truth, predicted).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_prediction() {
        let truth = [1.0, 2.0, 3.0, 4.0];
        let metrics = RegressionMetrics::compute(&truth, &truth).unwrap();
        assert_eq!(metrics.r2, 1.0);
        assert_eq!(metrics.mse, 0.0);
        assert_eq!(metrics.mae, 0.0);
        assert_eq!(metrics.rmse, 0.0);
    }

    #[test]
    fn test_r2_matches_sklearn_example() {
        // sklearn docs example: r2_score([3, -0.5, 2, 7], [2.5, 0.0, 2, 8])
        let truth = [3.0, -0.5, 2.0, 7.0];
        let predicted = [2.5, 0.0, 2.0, 8.0];
        let r2 = r2_score(&truth, &predicted).unwrap();
        assert!((r2 - 0.948_608_137_044_967_4).abs() < 1e-12);
    }

    #[test]
    fn test_mean_prediction_scores_zero_r2() {
        let truth = [1.0, 2.0, 3.0];
        let predicted = [2.0, 2.0, 2.0];
        assert_eq!(r2_score(&truth, &predicted).unwrap(), 0.0);
    }

    #[test]
    fn test_rmse_is_sqrt_of_mse() {
        let truth = [0.0, 0.0];
        let predicted = [3.0, 4.0];
        let mse = mean_squared_error(&truth, &predicted).unwrap();
        let rmse = root_mean_squared_error(&truth, &predicted).unwrap();
        assert!((rmse - mse.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch_is_none() {
        assert!(mean_squared_error(&[1.0], &[1.0, 2.0]).is_none());
        assert!(RegressionMetrics::compute(&[], &[]).is_none());
    }
}
