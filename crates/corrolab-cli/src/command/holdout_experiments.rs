use std::path::PathBuf;

use corrolab_model::{
    evaluate::predict_held_out_experiments,
    regressor::{BuiltinRegressorFactory, KnnWeighting},
};

use crate::util::{self, Output};

use super::{encode_dataset, knn_spec};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct HoldoutExperimentsArg {
    /// Dataset JSON produced by `build-dataset`
    #[arg(long)]
    input: PathBuf,
    /// Experiments to hold out, e.g. --experiments 5,19
    #[arg(long, value_delimiter = ',', required = true)]
    experiments: Vec<u32>,
    /// Number of neighbours for the KNN model
    #[arg(long, default_value_t = 3)]
    neighbors: usize,
    /// Neighbour weighting (uniform or distance)
    #[arg(long, default_value = "distance")]
    weighting: KnnWeighting,
    /// Curation roster JSON overriding the built-in lists
    #[arg(long)]
    curation: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &HoldoutExperimentsArg) -> anyhow::Result<()> {
    let dataset = util::read_dataset_file(&arg.input)?;
    let (_encoder, table) = encode_dataset(&dataset)?;
    let curation = util::load_curation(arg.curation.as_deref())?;
    let spec = knn_spec(arg.neighbors, arg.weighting);
    eprintln!(
        "Holding out experiments {:?} and predicting with {}",
        arg.experiments,
        spec.label()
    );

    let report = predict_held_out_experiments(
        &BuiltinRegressorFactory,
        &spec,
        &table,
        &arg.experiments,
        &curation.representative_excluded,
    )?;
    eprintln!(
        "{} curves predicted; R2 {:.4}, RMSE {:.4} (log scale)",
        report.curves.len(),
        report.r2,
        report.rmse
    );
    Output::save_json(&report, arg.output.clone())
}
