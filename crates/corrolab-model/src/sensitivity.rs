//! What-if sweeps over single features of a fitted model.
//!
//! A sweep takes the encoded rows of one baseline replica, overwrites a
//! single feature with each candidate value in turn, and records the model's
//! predicted corrosion curve for each value. Predictions come back on the
//! linear mm/year scale; everything else in the pipeline stays on the log
//! scale.
//!
//! Three sweep shapes cover the feature layout of
//! [`FeatureEncoder`](crate::encoder::FeatureEncoder):
//!
//! - [`FeatureSweep::Binary`] flips a pair of one-hot indicator columns,
//!   asking "what if this run had been the other category";
//! - [`FeatureSweep::Scaled`] sets a standard-scaled covariate to raw values,
//!   scaling them with the encoder's full-fit parameters so the sweep stays
//!   in the model's input units;
//! - [`FeatureSweep::DoseConcentration`] overwrites the dose column, but only
//!   on rows that were dosed at all; the zero-dose pre-corrosion phase keeps
//!   its zeros so the swept curve remains a physically sensible protocol.

use serde::{Deserialize, Serialize};

use crate::{
    encoder::{DOSE_COLUMN, EncodedRow, EncodedTable, FeatureEncoder},
    regressor::{ModelFitError, Regressor},
};

/// One what-if question over a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeatureSweep {
    /// Flip between the two categories of a one-hot pair.
    Binary {
        column: String,
        categories: [String; 2],
    },
    /// Set a standard-scaled covariate to each raw value in turn.
    Scaled { column: String, values: Vec<f64> },
    /// Set the dose concentration on dosed rows to each value in turn.
    DoseConcentration { values: Vec<f64> },
}

impl FeatureSweep {
    /// The feature column this sweep varies.
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            FeatureSweep::Binary { column, .. } | FeatureSweep::Scaled { column, .. } => column,
            FeatureSweep::DoseConcentration { .. } => DOSE_COLUMN,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum SensitivityError {
    /// The swept column does not exist in the encoded feature layout.
    #[display("feature column '{name}' not found in the encoded layout")]
    #[from(ignore)]
    UnknownColumn { name: String },
    /// A scaled sweep named a column the encoder does not scale.
    #[display("column '{name}' is not a standard-scaled feature")]
    #[from(ignore)]
    NotScaled { name: String },
    /// The table has no rows to use as a baseline.
    #[display("cannot sweep without baseline rows")]
    #[from(ignore)]
    EmptyBaseline,
    #[display("model failure: {source}")]
    Model { source: ModelFitError },
}

/// Predicted curve for one swept value.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseColumn {
    /// Human-readable value label, e.g. `Temperature_C=90` or `Brine_Type_TH`.
    pub label: String,
    pub predicted_mm_yr: Vec<f64>,
}

/// Predicted response curves over the baseline replica's timeline.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseTable {
    /// The swept feature column.
    pub feature: String,
    /// Absolute baseline times, hours; every column aligns with this axis.
    pub time_hrs: Vec<f64>,
    pub columns: Vec<ResponseColumn>,
}

/// Runs feature sweeps against a fitted model.
pub struct SensitivityEngine<'a> {
    model: &'a dyn Regressor,
    encoder: &'a FeatureEncoder,
}

impl<'a> SensitivityEngine<'a> {
    #[must_use]
    pub fn new(model: &'a dyn Regressor, encoder: &'a FeatureEncoder) -> Self {
        Self { model, encoder }
    }

    /// Runs one sweep over the baseline replica of `table`.
    ///
    /// The baseline is the first replica appearing in the table; its rows
    /// keep their order, so the response columns read as corrosion curves
    /// over that replica's timeline.
    pub fn sweep(
        &self,
        table: &EncodedTable,
        sweep: &FeatureSweep,
    ) -> Result<ResponseTable, SensitivityError> {
        let baseline = baseline_rows(table).ok_or(SensitivityError::EmptyBaseline)?;
        let time_hrs: Vec<f64> = baseline.iter().map(|row| row.time_hrs_original).collect();
        let columns = match sweep {
            FeatureSweep::Binary { column, categories } => {
                self.sweep_binary(table, &baseline, column, categories)?
            }
            FeatureSweep::Scaled { column, values } => {
                self.sweep_scaled(table, &baseline, column, values)?
            }
            FeatureSweep::DoseConcentration { values } => {
                self.sweep_dose(table, &baseline, values)?
            }
        };
        Ok(ResponseTable {
            feature: sweep.column().to_string(),
            time_hrs,
            columns,
        })
    }

    fn sweep_binary(
        &self,
        table: &EncodedTable,
        baseline: &[EncodedRow],
        column: &str,
        categories: &[String; 2],
    ) -> Result<Vec<ResponseColumn>, SensitivityError> {
        let indices = categories
            .iter()
            .map(|category| {
                let name = format!("{column}_{category}");
                table
                    .column_index(&name)
                    .ok_or(SensitivityError::UnknownColumn { name })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut columns = vec![];
        for (active, category) in indices.iter().zip(categories) {
            let features: Vec<Vec<f64>> = baseline
                .iter()
                .map(|row| {
                    let mut features = row.features.clone();
                    for index in &indices {
                        features[*index] = 0.0;
                    }
                    features[*active] = 1.0;
                    features
                })
                .collect();
            columns.push(ResponseColumn {
                label: format!("{column}_{category}"),
                predicted_mm_yr: self.predict_linear(&features)?,
            });
        }
        Ok(columns)
    }

    fn sweep_scaled(
        &self,
        table: &EncodedTable,
        baseline: &[EncodedRow],
        column: &str,
        values: &[f64],
    ) -> Result<Vec<ResponseColumn>, SensitivityError> {
        let index = table
            .column_index(column)
            .ok_or_else(|| SensitivityError::UnknownColumn {
                name: column.to_string(),
            })?;
        let scaler = self
            .encoder
            .scaler(column)
            .ok_or_else(|| SensitivityError::NotScaled {
                name: column.to_string(),
            })?;
        let mut columns = vec![];
        for &value in values {
            let scaled = scaler.scale(value);
            let features: Vec<Vec<f64>> = baseline
                .iter()
                .map(|row| {
                    let mut features = row.features.clone();
                    features[index] = scaled;
                    features
                })
                .collect();
            columns.push(ResponseColumn {
                label: format!("{column}={value}"),
                predicted_mm_yr: self.predict_linear(&features)?,
            });
        }
        Ok(columns)
    }

    fn sweep_dose(
        &self,
        table: &EncodedTable,
        baseline: &[EncodedRow],
        values: &[f64],
    ) -> Result<Vec<ResponseColumn>, SensitivityError> {
        let index =
            table
                .column_index(DOSE_COLUMN)
                .ok_or_else(|| SensitivityError::UnknownColumn {
                    name: DOSE_COLUMN.to_string(),
                })?;
        let mut columns = vec![];
        for &value in values {
            let features: Vec<Vec<f64>> = baseline
                .iter()
                .map(|row| {
                    let mut features = row.features.clone();
                    // Undosed rows are the pre-corrosion phase; the swept
                    // protocol keeps them at zero.
                    if features[index] != 0.0 {
                        features[index] = value;
                    }
                    features
                })
                .collect();
            columns.push(ResponseColumn {
                label: format!("{DOSE_COLUMN}={value}"),
                predicted_mm_yr: self.predict_linear(&features)?,
            });
        }
        Ok(columns)
    }

    fn predict_linear(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, SensitivityError> {
        let predicted = self.model.predict(features)?;
        Ok(predicted.iter().map(|y| 10f64.powf(*y)).collect())
    }
}

/// The rows of the first replica in the table, in order.
fn baseline_rows(table: &EncodedTable) -> Option<Vec<EncodedRow>> {
    let first = &table.rows.first()?.replica;
    Some(
        table
            .rows
            .iter()
            .filter(|row| row.replica == *first)
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use corrolab_data::observation::ReplicaKey;

    use crate::regressor::Regressor;

    use super::*;

    /// Predicts the sum of all features; sweeps then shift curves by exactly
    /// the feature delta on the log scale.
    struct SumModel;

    impl Regressor for SumModel {
        fn fit(&mut self, _: &[Vec<f64>], _: &[f64]) -> Result<(), ModelFitError> {
            Ok(())
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelFitError> {
            Ok(features.iter().map(|row| row.iter().sum()).collect())
        }
    }

    fn encoder_and_table() -> (FeatureEncoder, EncodedTable) {
        use corrolab_data::{
            dataset::Dataset,
            observation::{Conditions, Observation, PhValue},
        };

        let observation = |replica: ReplicaKey, time: f64, dose: f64, temperature: f64| {
            Observation {
                replica,
                concentration_ppm: dose,
                pre_concentration_ppm: 0.0,
                pre_concentration_zero: dose == 0.0,
                time_hrs: time,
                time_hrs_original: time,
                log_corrosion: 0.1,
                log_initial_corrosion: Some(0.2),
                conditions: Conditions {
                    pressure_bar_co2: 12.0,
                    temperature_c: temperature,
                    inhibitor: "EC1612A".into(),
                    shear_pa: 100.0,
                    brine_ionic_strength: 0.5,
                    ph: PhValue::Label("Uncontrolled".into()),
                    brine_type: "TH".into(),
                    test_type: "sequential_dose".into(),
                    lab: "Lab A".into(),
                },
            }
        };
        let first = ReplicaKey::new(1, "Test 1");
        let second = ReplicaKey::new(2, "Test 2");
        let dataset = Dataset {
            observations: vec![
                observation(first.clone(), 0.0, 0.0, 90.0),
                observation(first.clone(), 5.0, 150.0, 90.0),
                observation(first, 10.0, 150.0, 90.0),
                observation(second, 0.0, 0.0, 110.0),
            ],
        };
        let encoder = FeatureEncoder::fit(&dataset).unwrap();
        let table = encoder.encode(&dataset).unwrap();
        (encoder, table)
    }

    #[test]
    fn test_baseline_is_first_replica() {
        let (encoder, table) = encoder_and_table();
        let engine = SensitivityEngine::new(&SumModel, &encoder);
        let response = engine
            .sweep(
                &table,
                &FeatureSweep::DoseConcentration {
                    values: vec![50.0],
                },
            )
            .unwrap();
        // Three baseline timepoints from exp1, none from exp2.
        assert_eq!(response.time_hrs, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_dose_sweep_keeps_undosed_rows_at_zero() {
        let (encoder, table) = encoder_and_table();
        let engine = SensitivityEngine::new(&SumModel, &encoder);
        let response = engine
            .sweep(
                &table,
                &FeatureSweep::DoseConcentration {
                    values: vec![1.0, 3.0],
                },
            )
            .unwrap();
        assert_eq!(response.columns.len(), 2);
        assert_eq!(response.columns[0].label, "concentration_ppm=1");
        // First timepoint is undosed: identical under both swept values.
        assert_eq!(
            response.columns[0].predicted_mm_yr[0],
            response.columns[1].predicted_mm_yr[0]
        );
        // Dosed timepoints see the overwritten dose: the sum model separates
        // the curves by a factor of 10^2.
        let ratio =
            response.columns[1].predicted_mm_yr[1] / response.columns[0].predicted_mm_yr[1];
        assert!((ratio - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_sweep_uses_fit_scaler() {
        let (encoder, table) = encoder_and_table();
        let engine = SensitivityEngine::new(&SumModel, &encoder);
        let response = engine
            .sweep(
                &table,
                &FeatureSweep::Scaled {
                    column: "Temperature_C".into(),
                    values: vec![95.0, 105.0],
                },
            )
            .unwrap();
        assert_eq!(response.columns[0].label, "Temperature_C=95");
        // Temperatures [90, 90, 90, 110] scale with mean 95 and population
        // std sqrt(75), so the sum model separates the two swept curves by
        // exactly 10 / sqrt(75) on the log scale.
        let low = response.columns[0].predicted_mm_yr[0];
        let high = response.columns[1].predicted_mm_yr[0];
        let expected_ratio = 10f64.powf(10.0 / 75f64.sqrt());
        assert!((high / low - expected_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_binary_sweep_flips_one_hot_pair() {
        let (encoder, table) = encoder_and_table();
        let engine = SensitivityEngine::new(&SumModel, &encoder);
        let response = engine
            .sweep(
                &table,
                &FeatureSweep::Binary {
                    column: "pre_concentration_zero".into(),
                    categories: ["Yes".into(), "No".into()],
                },
            )
            .unwrap();
        assert_eq!(response.columns.len(), 2);
        assert_eq!(response.columns[0].label, "pre_concentration_zero_Yes");
        // Exactly one indicator of the pair is set either way, so the sum
        // model predicts identical curves for both categories.
        assert_eq!(
            response.columns[0].predicted_mm_yr,
            response.columns[1].predicted_mm_yr
        );
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let (encoder, table) = encoder_and_table();
        let engine = SensitivityEngine::new(&SumModel, &encoder);
        let err = engine
            .sweep(
                &table,
                &FeatureSweep::Scaled {
                    column: "Viscosity".into(),
                    values: vec![1.0],
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            SensitivityError::UnknownColumn {
                name: "Viscosity".into()
            }
        );
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let (encoder, table) = encoder_and_table();
        let engine = SensitivityEngine::new(&SumModel, &encoder);
        let empty = table.with_rows(vec![]);
        let err = engine
            .sweep(
                &empty,
                &FeatureSweep::DoseConcentration { values: vec![1.0] },
            )
            .unwrap_err();
        assert_eq!(err, SensitivityError::EmptyBaseline);
    }
}
