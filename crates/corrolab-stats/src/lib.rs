//! Statistical utilities for the Corrolab project.
//!
//! This crate provides the numerical building blocks shared by the dataset
//! pipeline and the model-evaluation harness:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation
//! - **Regression metrics**: R², MSE, MAE, RMSE
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`metrics`]: Error metrics for regression model evaluation
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use corrolab_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Scoring predictions
//!
//! ```
//! use corrolab_stats::metrics::RegressionMetrics;
//!
//! let truth = [1.0, 2.0, 3.0];
//! let predicted = [1.0, 2.0, 3.0];
//! let metrics = RegressionMetrics::compute(&truth, &predicted).unwrap();
//! assert_eq!(metrics.r2, 1.0);
//! assert_eq!(metrics.mse, 0.0);
//! ```

pub mod descriptive;
pub mod metrics;
