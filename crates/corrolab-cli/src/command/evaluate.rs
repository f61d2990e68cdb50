use std::path::PathBuf;

use corrolab_model::{
    evaluate::repeated_holdout,
    regressor::{BuiltinRegressorFactory, KnnWeighting},
};

use crate::util::{self, Output};

use super::{encode_dataset, knn_spec, make_rng};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    /// Dataset JSON produced by `build-dataset`
    #[arg(long)]
    input: PathBuf,
    /// Number of neighbours for the KNN model
    #[arg(long, default_value_t = 3)]
    neighbors: usize,
    /// Neighbour weighting (uniform or distance)
    #[arg(long, default_value = "distance")]
    weighting: KnnWeighting,
    /// Fraction of rows held out per repetition
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,
    /// Number of holdout repetitions
    #[arg(long, default_value_t = 10)]
    repetitions: usize,
    /// RNG seed for reproducible splits
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let dataset = util::read_dataset_file(&arg.input)?;
    let (_encoder, table) = encode_dataset(&dataset)?;
    let spec = knn_spec(arg.neighbors, arg.weighting);
    eprintln!(
        "Evaluating {} with {} repetitions at test size {}",
        spec.label(),
        arg.repetitions,
        arg.test_size
    );

    let mut rng = make_rng(arg.seed);
    let report = repeated_holdout(
        &BuiltinRegressorFactory,
        &spec,
        &table,
        arg.test_size,
        arg.repetitions,
        &mut rng,
    )?;
    eprintln!(
        "R2 {:.4} +/- {:.4}, RMSE {:.4} +/- {:.4} (log scale)",
        report.r2.mean, report.r2.std_dev, report.rmse.mean, report.rmse.std_dev
    );
    Output::save_json(&report, arg.output.clone())
}
