use std::path::PathBuf;

use corrolab_data::{
    curation::ReplicaSet,
    dataset::{DatasetBuilder, LabFilter},
};

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BuildDatasetArg {
    /// Raw experiment tables JSON (one array of rows per experiment)
    #[arg(long)]
    input: PathBuf,
    /// Lab to keep ("all" keeps every lab)
    #[arg(long, default_value = "all")]
    lab: LabFilter,
    /// Keep curated-out replicas instead of dropping them
    #[arg(long)]
    keep_excluded: bool,
    /// Curation roster JSON overriding the built-in lists
    #[arg(long)]
    curation: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &BuildDatasetArg) -> anyhow::Result<()> {
    let experiments = util::read_experiments_file(&arg.input)?;
    let mut builder = DatasetBuilder::new();
    for (index, rows) in experiments.iter().enumerate() {
        let experiment_id = u32::try_from(index + 1)?;
        builder.push_experiment(experiment_id, rows);
    }
    let dataset = builder.build();
    eprintln!(
        "Cleaned {} observations from {} experiments",
        dataset.len(),
        experiments.len()
    );

    let excluded = if arg.keep_excluded {
        ReplicaSet::default()
    } else {
        util::load_curation(arg.curation.as_deref())?.excluded
    };
    let selected = dataset.select(&arg.lab, &excluded);
    eprintln!("Selected {} observations", selected.len());

    Output::save_json(&selected, arg.output.clone())
}
