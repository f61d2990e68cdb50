//! Feature encoding: one-hot categoricals, standard-scaled covariates, and
//! passthrough dose/time columns.
//!
//! The encoder maps cleaned [`Observation`]s to numeric rows with a fixed,
//! deterministic column layout:
//!
//! 1. one-hot indicator blocks, one per categorical column in declared order
//!    (`pre_concentration_zero`, `CI`, `pH`, `Brine_Type`, `Type_of_test`),
//!    categories sorted lexicographically within each block and named
//!    `{column}_{category}`;
//! 2. standard-scaled numeric covariates (`Pressure_bar_CO2`,
//!    `Temperature_C`, `Shear_Pa`, `Brine_Ionic_Strength`), scaler fit on
//!    the full input with the population standard deviation;
//! 3. passthrough columns (`concentration_ppm`, `pre_concentration_ppm`,
//!    `time_hrs`, `initial_corrosion_mm_yr`).
//!
//! Identifier fields (the replica key, i.e. `Description` and `Experiment`)
//! and the label ride alongside the feature vector and never enter it.
//!
//! A category seen at prediction time but not at fit time encodes to an
//! all-zero indicator block; this degrades rather than fails, because
//! held-out experiments can legitimately carry unseen covariate labels.

use corrolab_data::{
    dataset::Dataset,
    observation::{Observation, ReplicaKey},
};
use corrolab_stats::descriptive::DescriptiveStats;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

/// Categorical columns in output order, with their value extractors.
const CATEGORICAL_COLUMNS: [(&str, fn(&Observation) -> String); 5] = [
    ("pre_concentration_zero", pre_concentration_zero_category),
    ("CI", inhibitor_category),
    ("pH", ph_category),
    ("Brine_Type", brine_type_category),
    ("Type_of_test", test_type_category),
];

/// Standard-scaled numeric columns in output order.
const SCALED_COLUMNS: [(&str, fn(&Observation) -> f64); 4] = [
    ("Pressure_bar_CO2", |obs| obs.conditions.pressure_bar_co2),
    ("Temperature_C", |obs| obs.conditions.temperature_c),
    ("Shear_Pa", |obs| obs.conditions.shear_pa),
    ("Brine_Ionic_Strength", |obs| {
        obs.conditions.brine_ionic_strength
    }),
];

/// Passthrough numeric columns in output order. The pre-dose corrosion
/// covariate is handled separately because it may be absent.
const PASSTHROUGH_COLUMNS: [(&str, fn(&Observation) -> f64); 3] = [
    ("concentration_ppm", |obs| obs.concentration_ppm),
    ("pre_concentration_ppm", |obs| obs.pre_concentration_ppm),
    ("time_hrs", |obs| obs.time_hrs),
];

/// Name of the dose-concentration feature, which the sensitivity engine
/// treats specially.
pub const DOSE_COLUMN: &str = "concentration_ppm";

/// Name of the pre-dose corrosion covariate column (log scale).
pub const INITIAL_CORROSION_COLUMN: &str = "initial_corrosion_mm_yr";

fn pre_concentration_zero_category(obs: &Observation) -> String {
    if obs.pre_concentration_zero { "Yes" } else { "No" }.to_string()
}

fn inhibitor_category(obs: &Observation) -> String {
    obs.conditions.inhibitor.clone()
}

fn ph_category(obs: &Observation) -> String {
    obs.conditions.ph_category()
}

fn brine_type_category(obs: &Observation) -> String {
    obs.conditions.brine_type.clone()
}

fn test_type_category(obs: &Observation) -> String {
    obs.conditions.test_type.clone()
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum EncodeError {
    /// Fit needs at least one observation to learn categories and scalers.
    #[display("cannot fit an encoder on an empty dataset")]
    EmptyDataset,
    /// Training tables must carry the pre-dose corrosion covariate.
    #[display("replica {replica} has no pre-dose corrosion value")]
    MissingInitialCorrosion { replica: ReplicaKey },
}

/// One-hot mapping for a single categorical column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMap {
    pub column: String,
    /// Observed categories, sorted lexicographically.
    pub categories: Vec<String>,
}

/// Standard-scaler parameters for a single numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaler {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation; 1.0 when the column has no variance,
    /// so scaling a constant column is the identity shift.
    pub std_dev: f64,
}

impl ColumnScaler {
    /// Applies the fitted transform to a raw value.
    #[must_use]
    pub fn scale(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }
}

/// Fitted feature encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    categorical: Vec<CategoryMap>,
    scalers: Vec<ColumnScaler>,
}

impl FeatureEncoder {
    /// Learns category vocabularies and scaler parameters from the full
    /// dataset.
    pub fn fit(dataset: &Dataset) -> Result<Self, EncodeError> {
        if dataset.is_empty() {
            return Err(EncodeError::EmptyDataset);
        }
        let categorical = CATEGORICAL_COLUMNS
            .iter()
            .map(|(column, extract)| {
                let mut categories: Vec<String> = vec![];
                for obs in &dataset.observations {
                    let value = extract(obs);
                    if !categories.contains(&value) {
                        categories.push(value);
                    }
                }
                categories.sort();
                CategoryMap {
                    column: (*column).to_string(),
                    categories,
                }
            })
            .collect();
        let scalers = SCALED_COLUMNS
            .iter()
            .map(|(column, extract)| {
                let stats =
                    DescriptiveStats::new(dataset.observations.iter().map(extract)).unwrap();
                ColumnScaler {
                    column: (*column).to_string(),
                    mean: stats.mean,
                    std_dev: if stats.std_dev == 0.0 {
                        1.0
                    } else {
                        stats.std_dev
                    },
                }
            })
            .collect();
        Ok(Self {
            categorical,
            scalers,
        })
    }

    /// Output column names, in feature-vector order.
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![];
        for map in &self.categorical {
            for category in &map.categories {
                names.push(format!("{}_{}", map.column, category));
            }
        }
        for scaler in &self.scalers {
            names.push(scaler.column.clone());
        }
        for (column, _) in PASSTHROUGH_COLUMNS {
            names.push(column.to_string());
        }
        names.push(INITIAL_CORROSION_COLUMN.to_string());
        names
    }

    /// The fitted scaler for a numeric column, if that column is scaled.
    #[must_use]
    pub fn scaler(&self, column: &str) -> Option<&ColumnScaler> {
        self.scalers.iter().find(|s| s.column == column)
    }

    /// Encodes a dataset into a numeric table.
    ///
    /// Unseen categories produce all-zero indicator blocks and are counted
    /// in [`EncodedTable::unknown_categories`].
    pub fn encode(&self, dataset: &Dataset) -> Result<EncodedTable, EncodeError> {
        let mut unknown_categories = 0;
        let rows = dataset
            .observations
            .iter()
            .map(|obs| {
                let log_initial = obs.log_initial_corrosion.ok_or_else(|| {
                    EncodeError::MissingInitialCorrosion {
                        replica: obs.replica.clone(),
                    }
                })?;
                let mut features = vec![];
                for (map, (_, extract)) in self.categorical.iter().zip(&CATEGORICAL_COLUMNS) {
                    let value = extract(obs);
                    let mut matched = false;
                    for category in &map.categories {
                        if *category == value {
                            features.push(1.0);
                            matched = true;
                        } else {
                            features.push(0.0);
                        }
                    }
                    if !matched {
                        unknown_categories += 1;
                    }
                }
                for (scaler, (_, extract)) in self.scalers.iter().zip(&SCALED_COLUMNS) {
                    features.push(scaler.scale(extract(obs)));
                }
                for (_, extract) in PASSTHROUGH_COLUMNS {
                    features.push(extract(obs));
                }
                features.push(log_initial);
                Ok(EncodedRow {
                    replica: obs.replica.clone(),
                    time_hrs_original: obs.time_hrs_original,
                    features,
                    label: obs.log_corrosion,
                })
            })
            .collect::<Result<Vec<_>, EncodeError>>()?;
        Ok(EncodedTable {
            feature_names: self.feature_names(),
            rows,
            unknown_categories,
        })
    }
}

/// One encoded row: the feature vector plus the identifiers and label that
/// ride alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedRow {
    pub replica: ReplicaKey,
    pub time_hrs_original: f64,
    pub features: Vec<f64>,
    /// log10 corrosion rate.
    pub label: f64,
}

/// A numeric training table with named feature columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedTable {
    pub feature_names: Vec<String>,
    pub rows: Vec<EncodedRow>,
    /// Number of indicator blocks that encoded to all zeros because their
    /// category was unseen at fit time.
    pub unknown_categories: usize,
}

impl EncodedTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a feature column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// The bare feature matrix (identifiers and label stripped).
    #[must_use]
    pub fn feature_matrix(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|row| row.features.clone()).collect()
    }

    /// The label vector.
    #[must_use]
    pub fn labels(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.label).collect()
    }

    /// A copy with rows in random order.
    #[must_use]
    pub fn shuffled<R>(&self, rng: &mut R) -> EncodedTable
    where
        R: Rng + ?Sized,
    {
        let mut rows = self.rows.clone();
        rows.shuffle(rng);
        EncodedTable {
            feature_names: self.feature_names.clone(),
            rows,
            unknown_categories: self.unknown_categories,
        }
    }

    /// A copy containing the given rows.
    #[must_use]
    pub fn with_rows(&self, rows: Vec<EncodedRow>) -> EncodedTable {
        EncodedTable {
            feature_names: self.feature_names.clone(),
            rows,
            unknown_categories: self.unknown_categories,
        }
    }

    /// Experiment ids present in this table, in order of first appearance.
    #[must_use]
    pub fn experiment_ids(&self) -> Vec<u32> {
        let mut ids = vec![];
        for row in &self.rows {
            if !ids.contains(&row.replica.experiment_id) {
                ids.push(row.replica.experiment_id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use corrolab_data::observation::{Conditions, PhValue};

    use super::*;

    fn observation(inhibitor: &str, temperature: f64, pre_zero: bool) -> Observation {
        Observation {
            replica: ReplicaKey::new(1, "Test 1"),
            concentration_ppm: 150.0,
            pre_concentration_ppm: 0.0,
            pre_concentration_zero: pre_zero,
            time_hrs: 2.0,
            time_hrs_original: 10.0,
            log_corrosion: -0.5,
            log_initial_corrosion: Some(0.3),
            conditions: Conditions {
                pressure_bar_co2: 12.0,
                temperature_c: temperature,
                inhibitor: inhibitor.into(),
                shear_pa: 100.0,
                brine_ionic_strength: 0.5,
                ph: PhValue::Label("Uncontrolled".into()),
                brine_type: "TH".into(),
                test_type: "sequential_dose".into(),
                lab: "Lab A".into(),
            },
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            observations: vec![
                observation("EC1612A", 90.0, true),
                observation("CORR12148SP", 110.0, false),
            ],
        }
    }

    #[test]
    fn test_column_naming_scheme() {
        let encoder = FeatureEncoder::fit(&dataset()).unwrap();
        let names = encoder.feature_names();
        // Categories sorted within each block, blocks in declared order.
        assert_eq!(names[0], "pre_concentration_zero_No");
        assert_eq!(names[1], "pre_concentration_zero_Yes");
        assert_eq!(names[2], "CI_CORR12148SP");
        assert_eq!(names[3], "CI_EC1612A");
        assert!(names.contains(&"pH_Uncontrolled".to_string()));
        assert_eq!(names.last().unwrap(), INITIAL_CORROSION_COLUMN);
        let temp_idx = names.iter().position(|n| n == "Temperature_C").unwrap();
        let dose_idx = names.iter().position(|n| n == DOSE_COLUMN).unwrap();
        assert!(temp_idx < dose_idx, "scaled columns precede passthrough");
    }

    #[test]
    fn test_one_hot_round_trip() {
        let data = dataset();
        let encoder = FeatureEncoder::fit(&data).unwrap();
        let table = encoder.encode(&data).unwrap();
        let yes = table.column_index("pre_concentration_zero_Yes").unwrap();
        let no = table.column_index("pre_concentration_zero_No").unwrap();
        assert_eq!(table.rows[0].features[yes], 1.0);
        assert_eq!(table.rows[0].features[no], 0.0);
        assert_eq!(table.rows[1].features[yes], 0.0);
        assert_eq!(table.rows[1].features[no], 1.0);
        assert_eq!(table.unknown_categories, 0);
    }

    #[test]
    fn test_unseen_category_encodes_to_zero_block() {
        let encoder = FeatureEncoder::fit(&dataset()).unwrap();
        let unseen = Dataset {
            observations: vec![observation("NEWPRODUCT", 90.0, true)],
        };
        let table = encoder.encode(&unseen).unwrap();
        let block: Vec<f64> = ["CI_CORR12148SP", "CI_EC1612A"]
            .iter()
            .map(|name| table.rows[0].features[table.column_index(name).unwrap()])
            .collect();
        assert_eq!(block, vec![0.0, 0.0]);
        assert_eq!(table.unknown_categories, 1);
    }

    #[test]
    fn test_standard_scaling_is_fit_on_full_input() {
        let data = dataset();
        let encoder = FeatureEncoder::fit(&data).unwrap();
        let scaler = encoder.scaler("Temperature_C").unwrap();
        assert_eq!(scaler.mean, 100.0);
        assert_eq!(scaler.std_dev, 10.0);

        let table = encoder.encode(&data).unwrap();
        let idx = table.column_index("Temperature_C").unwrap();
        assert_eq!(table.rows[0].features[idx], -1.0);
        assert_eq!(table.rows[1].features[idx], 1.0);
    }

    #[test]
    fn test_constant_column_scales_by_one() {
        let data = dataset();
        let encoder = FeatureEncoder::fit(&data).unwrap();
        let scaler = encoder.scaler("Pressure_bar_CO2").unwrap();
        assert_eq!(scaler.std_dev, 1.0);
        assert_eq!(scaler.scale(12.0), 0.0);
    }

    #[test]
    fn test_passthrough_columns_unchanged() {
        let data = dataset();
        let encoder = FeatureEncoder::fit(&data).unwrap();
        let table = encoder.encode(&data).unwrap();
        let dose = table.column_index(DOSE_COLUMN).unwrap();
        let time = table.column_index("time_hrs").unwrap();
        assert_eq!(table.rows[0].features[dose], 150.0);
        assert_eq!(table.rows[0].features[time], 2.0);
    }

    #[test]
    fn test_missing_initial_corrosion_is_an_error() {
        let data = dataset();
        let encoder = FeatureEncoder::fit(&data).unwrap();
        let mut prediction = data.clone();
        prediction.observations[0].log_initial_corrosion = None;
        let err = encoder.encode(&prediction).unwrap_err();
        assert!(matches!(err, EncodeError::MissingInitialCorrosion { .. }));
    }

    #[test]
    fn test_empty_dataset_cannot_fit() {
        assert_eq!(
            FeatureEncoder::fit(&Dataset::default()).unwrap_err(),
            EncodeError::EmptyDataset
        );
    }
}
