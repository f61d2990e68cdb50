use std::path::PathBuf;

use corrolab_model::{
    evaluate::{Scoring, compare_candidates},
    regressor::{BuiltinRegressorFactory, default_candidates},
};

use crate::util::{self, Output};

use super::{encode_dataset, make_rng};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CompareModelsArg {
    /// Dataset JSON produced by `build-dataset`
    #[arg(long)]
    input: PathBuf,
    /// Number of cross-validation folds
    #[arg(long, default_value_t = 10)]
    folds: usize,
    /// Number of reshuffled repetitions
    #[arg(long, default_value_t = 10)]
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

pub(crate) fn run(arg: &CompareModelsArg) -> anyhow::Result<()> {
    let dataset = util::read_dataset_file(&arg.input)?;
    let (_encoder, table) = encode_dataset(&dataset)?;
    let candidates = default_candidates();
    eprintln!(
        "Comparing {} candidates over {} rows ({} folds x {} repetitions)",
        candidates.len(),
        table.len(),
        arg.folds,
        arg.repetitions
    );

    let mut rng = make_rng(arg.seed);
    let report = compare_candidates(
        &BuiltinRegressorFactory,
        &candidates,
        &table,
        arg.folds,
        arg.repetitions,
        arg.scoring,
        &mut rng,
    );
    for candidate in &report.candidates {
        eprintln!(
            "{:>20}: mean {:.4}, std {:.4}",
            candidate.label, candidate.summary.mean, candidate.summary.std_dev
        );
    }
    match &report.best {
        Some(best) => eprintln!("Best candidate: {best}"),
        None => eprintln!("No candidate produced a defined score"),
    }
    Output::save_json(&report, arg.output.clone())
}
