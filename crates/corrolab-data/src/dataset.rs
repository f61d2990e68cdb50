//! Dataset assembly: concatenation, cleaning, and selection views.
//!
//! [`DatasetBuilder`] concatenates segmented replicas from all experiments
//! into one table, then cleans it into an immutable [`Dataset`]:
//!
//! - rows whose corrosion rate is non-positive are dropped (their base-10
//!   log is undefined; negative rates are measurement noise);
//! - rows whose recorded pre-dose corrosion value is non-positive are
//!   dropped for the same reason;
//! - category labels are normalized (whitespace trimming, canonical test
//!   types, controlled-pH recoding);
//! - surviving corrosion values are log10-transformed.
//!
//! Cleaning is lossy by design and row-local: a bad row never fails the
//! build. The pre-log cleaning step is idempotent.
//!
//! The built dataset is read-only; the selection views ([`Dataset::filter_lab`],
//! [`Dataset::without_replicas`], [`Dataset::select`]) return independent
//! copies, so every split/fit downstream operates on its own data.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    curation::ReplicaSet,
    observation::{Conditions, Observation, RawRow, ReplicaKey},
    segment::{SegmentMode, SegmentedReplica, segment_replica},
};

/// One flattened per-timepoint row after segmentation, before cleaning.
///
/// Corrosion values are still on the linear scale here; [`clean_rows`] and
/// [`Dataset::from_cleaned_rows`] take it the rest of the way.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedRow {
    pub replica: ReplicaKey,
    pub concentration_ppm: f64,
    pub pre_concentration_ppm: f64,
    pub pre_concentration_zero: bool,
    pub time_hrs: f64,
    pub time_hrs_original: f64,
    pub corrosion_mm_yr: f64,
    pub initial_corrosion_mm_yr: Option<f64>,
    pub conditions: Conditions,
}

impl SegmentedRow {
    /// Flattens a segmented replica into per-timepoint rows.
    #[must_use]
    pub fn from_replica(experiment_id: u32, replica: &SegmentedReplica) -> Vec<Self> {
        replica
            .segments
            .iter()
            .flat_map(|segment| {
                segment.points.iter().map(|point| SegmentedRow {
                    replica: ReplicaKey::new(experiment_id, replica.description.clone()),
                    concentration_ppm: segment.concentration_ppm,
                    pre_concentration_ppm: segment.pre_concentration_ppm,
                    pre_concentration_zero: segment.pre_concentration_zero,
                    time_hrs: point.time_hrs,
                    time_hrs_original: point.time_hrs_original,
                    corrosion_mm_yr: point.corrosion_mm_yr,
                    initial_corrosion_mm_yr: replica.initial_corrosion_mm_yr,
                    conditions: replica.conditions.clone(),
                })
            })
            .collect()
    }
}

/// Drops rows with undefined log-transforms and normalizes category labels.
///
/// Idempotent: cleaning a cleaned table changes nothing.
#[must_use]
pub fn clean_rows(rows: Vec<SegmentedRow>) -> Vec<SegmentedRow> {
    rows.into_iter()
        .filter(|row| {
            row.corrosion_mm_yr > 0.0
                && row.initial_corrosion_mm_yr.is_none_or(|initial| initial > 0.0)
        })
        .map(|row| SegmentedRow {
            conditions: row.conditions.normalized(),
            ..row
        })
        .collect()
}

/// Lab selection applied before replica exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LabFilter {
    /// Keep every lab's rows.
    All,
    /// Keep only rows from the named lab.
    Lab(String),
}

impl LabFilter {
    #[must_use]
    pub fn matches(&self, lab: &str) -> bool {
        match self {
            LabFilter::All => true,
            LabFilter::Lab(name) => name == lab,
        }
    }
}

impl FromStr for LabFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(LabFilter::All)
        } else {
            Ok(LabFilter::Lab(s.to_string()))
        }
    }
}

/// The immutable cleaned training table.
///
/// Built once per run, then shared read-only between the splitter, the
/// evaluator, and the sensitivity engine. Serializable so the cleaned form
/// can be cached and reloaded without re-running segmentation and cleaning.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub observations: Vec<Observation>,
}

impl Dataset {
    /// Log-transforms cleaned rows into the final observation table.
    ///
    /// Callers are expected to pass rows through [`clean_rows`] first;
    /// any row that would produce a non-finite log value is dropped here as
    /// a second line of row-local recovery.
    #[must_use]
    pub fn from_cleaned_rows(rows: Vec<SegmentedRow>) -> Self {
        let observations = rows
            .into_iter()
            .filter_map(|row| {
                let log_corrosion = row.corrosion_mm_yr.log10();
                let log_initial_corrosion = match row.initial_corrosion_mm_yr {
                    Some(initial) => {
                        let log = initial.log10();
                        if !log.is_finite() {
                            return None;
                        }
                        Some(log)
                    }
                    None => None,
                };
                log_corrosion.is_finite().then_some(Observation {
                    replica: row.replica,
                    concentration_ppm: row.concentration_ppm,
                    pre_concentration_ppm: row.pre_concentration_ppm,
                    pre_concentration_zero: row.pre_concentration_zero,
                    time_hrs: row.time_hrs,
                    time_hrs_original: row.time_hrs_original,
                    log_corrosion,
                    log_initial_corrosion,
                    conditions: row.conditions,
                })
            })
            .collect();
        Self { observations }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Experiment ids in order of first appearance.
    #[must_use]
    pub fn experiment_ids(&self) -> Vec<u32> {
        let mut ids = vec![];
        for obs in &self.observations {
            if !ids.contains(&obs.replica.experiment_id) {
                ids.push(obs.replica.experiment_id);
            }
        }
        ids
    }

    /// Replica keys in order of first appearance.
    #[must_use]
    pub fn replica_keys(&self) -> Vec<ReplicaKey> {
        let mut keys: Vec<ReplicaKey> = vec![];
        for obs in &self.observations {
            if !keys.contains(&obs.replica) {
                keys.push(obs.replica.clone());
            }
        }
        keys
    }

    /// Rows from one lab (or all labs).
    #[must_use]
    pub fn filter_lab(&self, filter: &LabFilter) -> Dataset {
        Dataset {
            observations: self
                .observations
                .iter()
                .filter(|obs| filter.matches(&obs.conditions.lab))
                .cloned()
                .collect(),
        }
    }

    /// Drops every row whose replica is in the exclusion set.
    #[must_use]
    pub fn without_replicas(&self, excluded: &ReplicaSet) -> Dataset {
        Dataset {
            observations: self
                .observations
                .iter()
                .filter(|obs| !excluded.contains(&obs.replica))
                .cloned()
                .collect(),
        }
    }

    /// The "selected data" view: lab filter first, then replica exclusion.
    #[must_use]
    pub fn select(&self, lab: &LabFilter, excluded: &ReplicaSet) -> Dataset {
        self.filter_lab(lab).without_replicas(excluded)
    }

    /// Per-experiment summary tables for the reporting collaborator.
    #[must_use]
    pub fn summary(&self) -> DatasetSummary {
        let experiments = self
            .experiment_ids()
            .into_iter()
            .map(|experiment_id| {
                let rows: Vec<&Observation> = self
                    .observations
                    .iter()
                    .filter(|obs| obs.replica.experiment_id == experiment_id)
                    .collect();
                let replica_count = {
                    let mut seen: Vec<&str> = vec![];
                    for obs in &rows {
                        if !seen.contains(&obs.replica.replica_id.as_str()) {
                            seen.push(&obs.replica.replica_id);
                        }
                    }
                    seen.len()
                };
                // The schedule is read off the first replica; sibling
                // replicas share it by protocol. A window ends when the
                // concentration changes or the segment clock restarts, so an
                // alternating schedule keeps its repeated windows.
                let first_replica = &rows[0].replica;
                let mut dose_schedule: Vec<DoseWindow> = vec![];
                let mut prev_time = f64::NEG_INFINITY;
                for obs in rows.iter().filter(|obs| obs.replica == *first_replica) {
                    match dose_schedule.last_mut() {
                        Some(window)
                            if window.concentration_ppm == obs.concentration_ppm
                                && obs.time_hrs >= prev_time =>
                        {
                            window.duration_hrs = window.duration_hrs.max(obs.time_hrs);
                        }
                        _ => dose_schedule.push(DoseWindow {
                            concentration_ppm: obs.concentration_ppm,
                            duration_hrs: obs.time_hrs,
                        }),
                    }
                    prev_time = obs.time_hrs;
                }
                let total_length_hrs = dose_schedule.iter().map(|w| w.duration_hrs).sum();
                ExperimentSummary {
                    experiment_id,
                    replica_count,
                    dose_schedule,
                    total_length_hrs,
                    conditions: rows[0].conditions.clone(),
                }
            })
            .collect();
        DatasetSummary { experiments }
    }
}

/// A builder that ingests raw experiment tables one at a time.
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    rows: Vec<SegmentedRow>,
}

impl DatasetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments and appends every replica of one experiment's raw table.
    ///
    /// Replicas are processed in order of first appearance of their
    /// `description` label; rows within a replica keep their input order.
    pub fn push_experiment(&mut self, experiment_id: u32, rows: &[RawRow]) {
        let mut descriptions: Vec<&str> = vec![];
        for row in rows {
            if !descriptions.contains(&row.description.as_str()) {
                descriptions.push(&row.description);
            }
        }
        for description in descriptions {
            let replica_rows: Vec<RawRow> = rows
                .iter()
                .filter(|r| r.description == description)
                .cloned()
                .collect();
            if let Some(replica) = segment_replica(&replica_rows, SegmentMode::Training) {
                self.rows
                    .extend(SegmentedRow::from_replica(experiment_id, &replica));
            }
        }
    }

    /// Cleans the accumulated rows and freezes them into a [`Dataset`].
    #[must_use]
    pub fn build(self) -> Dataset {
        Dataset::from_cleaned_rows(clean_rows(self.rows))
    }
}

/// Summary of one experiment's replicas and dosing schedule.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub experiment_id: u32,
    pub replica_count: usize,
    /// Dosing windows of the first replica, one per concentration run and in
    /// schedule order; a concentration dosed twice appears twice.
    pub dose_schedule: Vec<DoseWindow>,
    /// Approximate total test length (sum of window durations).
    pub total_length_hrs: f64,
    pub conditions: Conditions,
}

/// One dosing window of an experiment.
#[derive(Debug, Clone, Serialize)]
pub struct DoseWindow {
    pub concentration_ppm: f64,
    pub duration_hrs: f64,
}

/// Per-experiment summaries for the whole table.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub experiments: Vec<ExperimentSummary>,
}
