use std::path::PathBuf;

use anyhow::bail;
use corrolab_data::curation::ReplicaSet;
use corrolab_model::{
    encoder::EncodedTable,
    regressor::{BuiltinRegressorFactory, KnnWeighting, RegressorFactory as _},
    sensitivity::{FeatureSweep, SensitivityEngine},
};

use crate::util::{self, Output};

use super::{encode_dataset, knn_spec};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SensitivityArg {
    /// Dataset JSON produced by `build-dataset`
    #[arg(long)]
    input: PathBuf,
    /// Number of neighbours for the KNN model
    #[arg(long, default_value_t = 3)]
    neighbors: usize,
    /// Neighbour weighting (uniform or distance)
    #[arg(long, default_value = "distance")]
    weighting: KnnWeighting,
    /// Experiment whose first replica provides the baseline curve
    /// (defaults to the first experiment in the dataset)
    #[arg(long)]
    experiment: Option<u32>,
    /// Sweep the dose concentration over these ppm values
    #[arg(long, value_delimiter = ',')]
    dose: Vec<f64>,
    /// Sweep a standard-scaled covariate column (e.g. Temperature_C)
    #[arg(long)]
    scaled_column: Option<String>,
    /// Raw values for the scaled-column sweep
    #[arg(long, value_delimiter = ',')]
    values: Vec<f64>,
    /// Sweep a one-hot pair of this categorical column (e.g. Brine_Type)
    #[arg(long)]
    binary_column: Option<String>,
    /// The two categories of the binary sweep
    #[arg(long, num_args = 2)]
    categories: Vec<String>,
    /// Curation roster JSON overriding the built-in lists
    #[arg(long)]
    curation: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl SensitivityArg {
    fn sweep(&self) -> anyhow::Result<FeatureSweep> {
        if let Some(column) = &self.binary_column {
            let [first, second] = self.categories.as_slice() else {
                bail!("--binary-column requires exactly two --categories values");
            };
            return Ok(FeatureSweep::Binary {
                column: column.clone(),
                categories: [first.clone(), second.clone()],
            });
        }
        if let Some(column) = &self.scaled_column {
            if self.values.is_empty() {
                bail!("--scaled-column requires at least one --values entry");
            }
            return Ok(FeatureSweep::Scaled {
                column: column.clone(),
                values: self.values.clone(),
            });
        }
        if !self.dose.is_empty() {
            return Ok(FeatureSweep::DoseConcentration {
                values: self.dose.clone(),
            });
        }
        bail!("no sweep requested; pass --dose, --scaled-column, or --binary-column")
    }
}

pub(crate) fn run(arg: &SensitivityArg) -> anyhow::Result<()> {
    let sweep = arg.sweep()?;
    let dataset = util::read_dataset_file(&arg.input)?;
    let (encoder, table) = encode_dataset(&dataset)?;
    let spec = knn_spec(arg.neighbors, arg.weighting);

    let mut model = BuiltinRegressorFactory.build(&spec)?;
    model.fit(&table.feature_matrix(), &table.labels())?;
    eprintln!(
        "Fitted {} on {} rows; sweeping {}",
        spec.label(),
        table.len(),
        sweep.column()
    );

    let curation = util::load_curation(arg.curation.as_deref())?;
    let baseline = baseline_table(&table, arg.experiment, &curation.representative_excluded)?;

    let engine = SensitivityEngine::new(model.as_ref(), &encoder);
    let response = engine.sweep(&baseline, &sweep)?;
    eprintln!(
        "{} response columns over {} timepoints",
        response.columns.len(),
        response.time_hrs.len()
    );
    Output::save_json(&response, arg.output.clone())
}

/// Narrows the fitted table down to the rows the baseline curve may come
/// from: the requested experiment (or all of them) minus the replicas the
/// roster removes in favour of a representative one.
fn baseline_table(
    table: &EncodedTable,
    experiment: Option<u32>,
    representative_excluded: &ReplicaSet,
) -> anyhow::Result<EncodedTable> {
    let rows: Vec<_> = table
        .rows
        .iter()
        .filter(|row| experiment.is_none_or(|id| row.replica.experiment_id == id))
        .filter(|row| !representative_excluded.contains(&row.replica))
        .cloned()
        .collect();
    if let Some(experiment_id) = experiment {
        anyhow::ensure!(
            !rows.is_empty(),
            "experiment {experiment_id} is not present in the dataset"
        );
    }
    Ok(table.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use corrolab_data::observation::ReplicaKey;
    use corrolab_model::encoder::EncodedRow;

    use super::*;

    fn table() -> EncodedTable {
        let rows = [(7, "Test 12"), (7, "Test 13"), (9, "Test 20")]
            .iter()
            .enumerate()
            .map(|(i, &(experiment_id, label))| {
                #[expect(clippy::cast_precision_loss)]
                let x = i as f64;
                EncodedRow {
                    replica: ReplicaKey::new(experiment_id, label),
                    time_hrs_original: 0.0,
                    features: vec![x],
                    label: 0.0,
                }
            })
            .collect();
        EncodedTable {
            feature_names: vec!["x".into()],
            rows,
            unknown_categories: 0,
        }
    }

    #[test]
    fn test_baseline_drops_non_representative_replicas() {
        let excluded = ReplicaSet::from_pairs([(7, "Test 12")]);
        let baseline = baseline_table(&table(), Some(7), &excluded).unwrap();
        // "Test 12" is rostered out, so "Test 13" becomes the first replica.
        assert_eq!(baseline.len(), 1);
        assert_eq!(baseline.rows[0].replica, ReplicaKey::new(7, "Test 13"));
    }

    #[test]
    fn test_baseline_without_experiment_keeps_all_representatives() {
        let excluded = ReplicaSet::from_pairs([(7, "Test 12")]);
        let baseline = baseline_table(&table(), None, &excluded).unwrap();
        assert_eq!(baseline.len(), 2);
    }

    #[test]
    fn test_baseline_rejects_missing_experiment() {
        let err = baseline_table(&table(), Some(42), &ReplicaSet::default()).unwrap_err();
        assert!(err.to_string().contains("experiment 42"));
    }
}
