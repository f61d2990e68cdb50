//! Model selection and evaluation for corrosion-inhibitor datasets.
//!
//! # Overview
//!
//! This crate takes the cleaned observation table produced by
//! `corrolab-data` the rest of the way to model verdicts:
//!
//! - [`encoder`] turns observations into numeric feature rows with a fixed
//!   column layout (one-hot categoricals, standard-scaled covariates,
//!   passthrough dose and time columns);
//! - [`regressor`] defines the model capability, the four candidate
//!   families, and their typed hyperparameter grids;
//! - [`knn`] is the built-in k-nearest-neighbours implementation;
//! - [`split`] provides random and leave-experiment-out splitting with a
//!   fatal replica-leakage check;
//! - [`evaluate`] runs cross-validated comparisons, repeated holdout
//!   scoring, and whole-experiment holdout prediction;
//! - [`sensitivity`] answers single-feature what-if questions against a
//!   fitted model.
//!
//! # Examples
//!
//! Comparing candidates on an encoded table:
//!
//! ```
//! use corrolab_model::evaluate::{Scoring, compare_candidates};
//! use corrolab_model::regressor::{BuiltinRegressorFactory, default_candidates};
//! # use corrolab_data::dataset::{Dataset, DatasetBuilder, clean_rows};
//! # use corrolab_data::observation::{Conditions, PhValue, RawRow};
//! use corrolab_model::encoder::FeatureEncoder;
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg32;
//!
//! # let conditions = Conditions {
//! #     pressure_bar_co2: 12.0,
//! #     temperature_c: 90.0,
//! #     inhibitor: "EC1612A".into(),
//! #     shear_pa: 100.0,
//! #     brine_ionic_strength: 0.5,
//! #     ph: PhValue::Label("Uncontrolled".into()),
//! #     brine_type: "TH".into(),
//! #     test_type: "Sequential Dose".into(),
//! #     lab: "Lab A".into(),
//! # };
//! # let rows: Vec<RawRow> = (0..20)
//! #     .map(|i| RawRow {
//! #         description: "Test 1".into(),
//! #         time_hrs: f64::from(i),
//! #         concentration_ppm: if i < 4 { 0.0 } else { 150.0 },
//! #         corrosion_mm_yr: 2.0 / f64::from(i + 1),
//! #         conditions: conditions.clone(),
//! #     })
//! #     .collect();
//! # let mut builder = DatasetBuilder::new();
//! # builder.push_experiment(1, &rows);
//! # let dataset = builder.build();
//! let encoder = FeatureEncoder::fit(&dataset)?;
//! let table = encoder.encode(&dataset)?;
//! let mut rng = Pcg32::seed_from_u64(42);
//! let report = compare_candidates(
//!     &BuiltinRegressorFactory,
//!     &default_candidates(),
//!     &table,
//!     5,
//!     3,
//!     Scoring::NegMeanSquaredError,
//!     &mut rng,
//! );
//! // Only the KNN family is built in; the other candidates score NaN and
//! // are never selected.
//! assert_eq!(report.best.as_deref(), Some("KNN_3_distance"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod encoder;
pub mod evaluate;
pub mod knn;
pub mod regressor;
pub mod sensitivity;
pub mod split;
