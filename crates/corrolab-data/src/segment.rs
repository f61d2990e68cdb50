//! Dose-segmentation of a single replica's time series.
//!
//! A **segment** is a maximal run of consecutive observations sharing the
//! same dosing concentration. Segmentation is a run-length grouping that
//! preserves row order: a dosing schedule of `[0, 150, 0, 150]` produces four
//! segments, even though only two distinct concentrations occur.
//!
//! Within each segment the clock restarts: `time_hrs` is the time elapsed
//! since the segment's first observation. Each segment also records the
//! concentration of the segment before it (`pre_concentration_ppm`, 0 for
//! the first) and whether the row is still within or just after the
//! zero-dose pre-corrosion blank phase (`pre_concentration_zero`).
//!
//! The blank-phase flag is true for segment indices 0 and 1 unconditionally.
//! This encodes the experimental protocol of these datasets, where the first
//! segment is always the undosed baseline; it is not a general rule.

use serde::{Deserialize, Serialize};

use crate::observation::{Conditions, RawRow};

/// Whether segmentation runs on training data or on rows prepared for
/// prediction.
///
/// Training mode records the replica's first raw corrosion measurement as
/// the pre-dose context covariate. Prediction rows have no measured
/// pre-dose state, so the covariate stays unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMode {
    Training,
    Prediction,
}

/// One observation inside a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPoint {
    /// Absolute elapsed time, hours.
    pub time_hrs_original: f64,
    /// Time since the start of this segment, hours.
    pub time_hrs: f64,
    /// Measured corrosion rate, mm/year (linear scale).
    pub corrosion_mm_yr: f64,
}

/// A maximal run of observations at constant dosing concentration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of this segment within the replica (0-based).
    pub index: usize,
    /// Dosing concentration of this segment, ppm.
    pub concentration_ppm: f64,
    /// Concentration of the previous segment, 0 for the first.
    pub pre_concentration_ppm: f64,
    /// True for segment indices 0 and 1 (the blank phase and the segment
    /// immediately following it).
    pub pre_concentration_zero: bool,
    /// Observations of this segment, in time order.
    pub points: Vec<SegmentPoint>,
}

/// A replica's full time series after segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedReplica {
    /// Replica label.
    pub description: String,
    /// Static covariates (taken from the replica's first row).
    pub conditions: Conditions,
    /// First raw corrosion measurement of the replica, recorded before any
    /// filtering. `None` in prediction mode.
    pub initial_corrosion_mm_yr: Option<f64>,
    /// Segments in time order.
    pub segments: Vec<Segment>,
}

/// Segments one replica's raw observations.
///
/// `rows` must belong to a single replica and be sorted by `time_hrs`.
/// Returns `None` for an empty slice.
///
/// # Examples
///
/// ```
/// use corrolab_data::observation::{Conditions, PhValue, RawRow};
/// use corrolab_data::segment::{SegmentMode, segment_replica};
///
/// # fn conditions() -> Conditions {
/// #     Conditions {
/// #         pressure_bar_co2: 12.0,
/// #         temperature_c: 90.0,
/// #         inhibitor: "EC1612A".into(),
/// #         shear_pa: 100.0,
/// #         brine_ionic_strength: 0.5,
/// #         ph: PhValue::Label("Uncontrolled".into()),
/// #         brine_type: "TH".into(),
/// #         test_type: "Sequential Dose".into(),
/// #         lab: "Lab A".into(),
/// #     }
/// # }
/// let rows = [(0.0, 0.0), (5.0, 0.0), (10.0, 150.0), (15.0, 150.0)]
///     .iter()
///     .map(|&(t, c)| RawRow {
///         description: "Test 1".into(),
///         time_hrs: t,
///         concentration_ppm: c,
///         corrosion_mm_yr: 2.0,
///         conditions: conditions(),
///     })
///     .collect::<Vec<_>>();
///
/// let replica = segment_replica(&rows, SegmentMode::Training).unwrap();
/// assert_eq!(replica.segments.len(), 2);
/// assert_eq!(replica.segments[1].pre_concentration_ppm, 0.0);
/// assert_eq!(replica.segments[1].points[0].time_hrs, 0.0);
/// assert_eq!(replica.initial_corrosion_mm_yr, Some(2.0));
/// ```
#[must_use]
pub fn segment_replica(rows: &[RawRow], mode: SegmentMode) -> Option<SegmentedReplica> {
    let first = rows.first()?;
    let initial_corrosion_mm_yr = match mode {
        SegmentMode::Training => Some(first.corrosion_mm_yr),
        SegmentMode::Prediction => None,
    };

    // Run-length grouping on concentration, preserving row order.
    let mut runs: Vec<&[RawRow]> = vec![];
    let mut run_start = 0;
    for (i, row) in rows.iter().enumerate().skip(1) {
        if row.concentration_ppm != rows[run_start].concentration_ppm {
            runs.push(&rows[run_start..i]);
            run_start = i;
        }
    }
    runs.push(&rows[run_start..]);

    let segments = runs
        .iter()
        .enumerate()
        .map(|(index, run)| {
            let start_time = run
                .iter()
                .map(|r| r.time_hrs)
                .fold(f64::INFINITY, f64::min);
            let points = run
                .iter()
                .map(|r| SegmentPoint {
                    time_hrs_original: r.time_hrs,
                    time_hrs: r.time_hrs - start_time,
                    corrosion_mm_yr: r.corrosion_mm_yr,
                })
                .collect();
            let pre_concentration_ppm = if index == 0 {
                0.0
            } else {
                runs[index - 1][0].concentration_ppm
            };
            Segment {
                index,
                concentration_ppm: run[0].concentration_ppm,
                pre_concentration_ppm,
                // Segment 0 is the blank baseline and segment 1 directly
                // follows it; both are protocol-level "pre-dose" rows.
                pre_concentration_zero: index <= 1,
                points,
            }
        })
        .collect();

    Some(SegmentedReplica {
        description: first.description.clone(),
        conditions: first.conditions.clone(),
        initial_corrosion_mm_yr,
        segments,
    })
}
