//! Core record types for raw and cleaned measurements.
//!
//! The original analysis kept everything in one wide table addressed by
//! column-name strings. Here each row is a typed record: [`RawRow`] for the
//! measurements as they arrive from the lab, [`Observation`] for one cleaned
//! training row with segment-relative time and log-scale corrosion values.

use serde::{Deserialize, Serialize};

/// The true identity of a replica.
///
/// Replica labels (`Description` in the source tables) are unique within an
/// experiment but not globally, so every row-level filter and split-leakage
/// check keys on the full pair.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_more::Display,
)]
#[display("exp{experiment_id}/{replica_id}")]
pub struct ReplicaKey {
    /// Numeric experiment identifier (1-based, assigned at ingest).
    pub experiment_id: u32,
    /// Replica label, unique within the experiment.
    pub replica_id: String,
}

impl ReplicaKey {
    #[must_use]
    pub fn new(experiment_id: u32, replica_id: impl Into<String>) -> Self {
        Self {
            experiment_id,
            replica_id: replica_id.into(),
        }
    }
}

/// A raw pH cell, which the source tables record either as a number or as a
/// free-text label such as `"Uncontrolled"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhValue {
    Numeric(f64),
    Label(String),
}

impl PhValue {
    /// Normalized category label used for one-hot encoding.
    ///
    /// Numeric 6 is the controlled-pH protocol and is recoded to the
    /// `"Controlled=6"` category; other numerics keep their display form and
    /// text labels are trimmed.
    #[must_use]
    pub fn category(&self) -> String {
        match self {
            PhValue::Numeric(n) if *n == 6.0 => "Controlled=6".to_string(),
            PhValue::Numeric(n) => format!("{n}"),
            PhValue::Label(label) => label.trim().to_string(),
        }
    }
}

/// Static covariates shared by every measurement of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    /// CO₂ partial pressure, bar.
    pub pressure_bar_co2: f64,
    /// Temperature, °C.
    pub temperature_c: f64,
    /// Corrosion-inhibitor product name (CI).
    pub inhibitor: String,
    /// Wall shear stress, Pa.
    pub shear_pa: f64,
    /// Brine ionic strength.
    pub brine_ionic_strength: f64,
    /// pH, numeric or free text.
    pub ph: PhValue,
    /// Brine type label.
    pub brine_type: String,
    /// Test protocol label (free text before cleaning).
    pub test_type: String,
    /// Originating laboratory.
    pub lab: String,
}

impl Conditions {
    /// Returns a copy with normalized category labels.
    ///
    /// Trims whitespace on all text fields, recodes the free-text test-type
    /// labels to canonical short names, and folds the pH cell into its
    /// category label. Normalizing twice yields the same result.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            pressure_bar_co2: self.pressure_bar_co2,
            temperature_c: self.temperature_c,
            inhibitor: self.inhibitor.trim().to_string(),
            shear_pa: self.shear_pa,
            brine_ionic_strength: self.brine_ionic_strength,
            ph: PhValue::Label(self.ph.category()),
            brine_type: self.brine_type.trim().to_string(),
            test_type: canonical_test_type(self.test_type.trim()),
            lab: self.lab.trim().to_string(),
        }
    }

    /// Normalized pH category label.
    #[must_use]
    pub fn ph_category(&self) -> String {
        self.ph.category()
    }
}

/// Canonical short name for a test protocol label.
fn canonical_test_type(label: &str) -> String {
    match label {
        "Sequential Dose" => "sequential_dose".to_string(),
        "Single Dose YP" => "single_dose_YP".to_string(),
        "Single Dose NP" => "single_dose_NP".to_string(),
        other => other.to_string(),
    }
}

/// One raw measurement row as ingested from a lab table, before
/// segmentation. Rows of one replica are expected sorted by `time_hrs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Replica label (`Description` column).
    pub description: String,
    /// Absolute elapsed time since the start of the replica, hours.
    pub time_hrs: f64,
    /// Dosing concentration active during this measurement, ppm.
    pub concentration_ppm: f64,
    /// Measured corrosion rate, mm/year (linear scale, may be negative noise).
    pub corrosion_mm_yr: f64,
    /// Static experiment covariates.
    pub conditions: Conditions,
}

/// One cleaned training row.
///
/// Corrosion values are stored as base-10 logarithms; `time_hrs` is relative
/// to the start of the row's concentration segment while `time_hrs_original`
/// keeps the replica's absolute clock for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Owning replica.
    pub replica: ReplicaKey,
    /// Dosing concentration active during this measurement, ppm.
    pub concentration_ppm: f64,
    /// Concentration of the previous segment (0 for the first segment).
    pub pre_concentration_ppm: f64,
    /// Whether this row still belongs to (or immediately follows) the
    /// zero-dose pre-corrosion phase.
    pub pre_concentration_zero: bool,
    /// Time since the start of the current concentration segment, hours.
    pub time_hrs: f64,
    /// Absolute elapsed time, hours.
    pub time_hrs_original: f64,
    /// log10 of the measured corrosion rate.
    pub log_corrosion: f64,
    /// log10 of the replica's first raw corrosion measurement; constant
    /// across the replica, used as a covariate. `None` in prediction-mode
    /// tables where the pre-dose state is unknown.
    pub log_initial_corrosion: Option<f64>,
    /// Static experiment covariates with normalized labels.
    pub conditions: Conditions,
}
