use std::path::PathBuf;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SummarizeArg {
    /// Dataset JSON produced by `build-dataset`
    #[arg(long)]
    input: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &SummarizeArg) -> anyhow::Result<()> {
    let dataset = util::read_dataset_file(&arg.input)?;
    eprintln!(
        "{} observations across {} experiments",
        dataset.len(),
        dataset.experiment_ids().len()
    );
    Output::save_json(&dataset.summary(), arg.output.clone())
}
