//! Typed data model and dataset pipeline for corrosion-inhibitor experiments
//!
//! This crate turns raw per-experiment replicate tables into a normalized,
//! feature-ready training table with dose-relative time semantics. It owns
//! the domain rules that the downstream model harness depends on:
//!
//! 1. **Segmentation** ([`segment`]): each replica's time series is split
//!    into maximal runs of constant dosing concentration. Time is re-based to
//!    the start of each segment, and every segment learns the concentration
//!    of the segment before it.
//! 2. **Dataset building** ([`dataset`]): segmented replicas from all
//!    experiments are concatenated, cleaned (log-transform, domain filters,
//!    label normalization), and frozen into an immutable [`dataset::Dataset`].
//! 3. **Curation** ([`curation`]): hand-curated replica exclusion lists are
//!    explicit configuration data ([`curation::ReplicaSet`]), never inline
//!    literals, so they can be swapped and tested independently.
//!
//! # Workflow
//!
//! ```
//! use corrolab_data::{
//!     curation::ReplicaSet,
//!     dataset::{DatasetBuilder, LabFilter},
//!     observation::{Conditions, PhValue, RawRow},
//! };
//!
//! let conditions = Conditions {
//!     pressure_bar_co2: 12.0,
//!     temperature_c: 90.0,
//!     inhibitor: "EC1612A".into(),
//!     shear_pa: 100.0,
//!     brine_ionic_strength: 0.5,
//!     ph: PhValue::Numeric(6.0),
//!     brine_type: "TH".into(),
//!     test_type: "Sequential Dose".into(),
//!     lab: "Lab A".into(),
//! };
//! let rows = [0.0, 4.0, 8.0]
//!     .iter()
//!     .map(|&t| RawRow {
//!         description: "Test 1".into(),
//!         time_hrs: t,
//!         concentration_ppm: if t < 8.0 { 0.0 } else { 150.0 },
//!         corrosion_mm_yr: 2.0,
//!         conditions: conditions.clone(),
//!     })
//!     .collect::<Vec<_>>();
//!
//! let mut builder = DatasetBuilder::new();
//! builder.push_experiment(1, &rows);
//! let all_data = builder.build();
//!
//! let selected = all_data.select(&LabFilter::All, &ReplicaSet::default());
//! assert_eq!(selected.len(), all_data.len());
//! ```

pub mod curation;
pub mod dataset;
pub mod observation;
pub mod segment;
