use std::path::PathBuf;

use corrolab_model::{
    evaluate::{Scoring, compare_candidates},
    regressor::{BuiltinRegressorFactory, ModelFamily, hyperparameter_grid},
};

use crate::util::{self, Output};

use super::{encode_dataset, make_rng};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GridSearchArg {
    /// Dataset JSON produced by `build-dataset`
    #[arg(long)]
    input: PathBuf,
    /// Model family to sweep (mlp, svm, rf, or knn)
    #[arg(long, default_value = "knn")]
    family: ModelFamily,
    /// Number of cross-validation folds
    #[arg(long, default_value_t = 10)]
    folds: usize,
    /// Number of reshuffled repetitions
    #[arg(long, default_value_t = 1)]
    repetitions: usize,
    /// Scoring function (neg_mean_squared_error or r2)
    #[arg(long, default_value = "neg_mean_squared_error")]
    scoring: Scoring,
    /// RNG seed for reproducible fold assignments
    #[arg(long)]
    seed: Option<u64>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GridSearchArg) -> anyhow::Result<()> {
    let dataset = util::read_dataset_file(&arg.input)?;
    let (_encoder, table) = encode_dataset(&dataset)?;
    let grid = hyperparameter_grid(arg.family);
    eprintln!(
        "Sweeping {} {} candidates over {} rows",
        grid.len(),
        arg.family,
        table.len()
    );

    let mut rng = make_rng(arg.seed);
    let report = compare_candidates(
        &BuiltinRegressorFactory,
        &grid,
        &table,
        arg.folds,
        arg.repetitions,
        arg.scoring,
        &mut rng,
    );
    match &report.best {
        Some(best) => eprintln!("Best candidate: {best}"),
        None => eprintln!("No candidate produced a defined score"),
    }
    Output::save_json(&report, arg.output.clone())
}
