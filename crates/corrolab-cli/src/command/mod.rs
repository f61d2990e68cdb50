use anyhow::Context;
use clap::{Parser, Subcommand};
use corrolab_data::dataset::Dataset;
use corrolab_model::{
    encoder::{EncodedTable, FeatureEncoder},
    regressor::{KnnParams, KnnWeighting, ModelSpec},
};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;

use self::{
    build_dataset::BuildDatasetArg, compare_models::CompareModelsArg, evaluate::EvaluateArg,
    grid_search::GridSearchArg, holdout_experiments::HoldoutExperimentsArg,
    sensitivity::SensitivityArg, summarize::SummarizeArg,
};

mod build_dataset;
mod compare_models;
mod evaluate;
mod grid_search;
mod holdout_experiments;
mod sensitivity;
mod summarize;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Segment and clean raw experiment tables into a dataset
    BuildDataset(#[clap(flatten)] BuildDatasetArg),
    /// Report per-experiment statistics of a dataset
    Summarize(#[clap(flatten)] SummarizeArg),
    /// Sweep one model family's hyperparameter grid
    GridSearch(#[clap(flatten)] GridSearchArg),
    /// Compare the best-known candidate of each model family
    CompareModels(#[clap(flatten)] CompareModelsArg),
    /// Score a model by repeated random holdout
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Predict corrosion curves of held-out experiments
    HoldoutExperiments(#[clap(flatten)] HoldoutExperimentsArg),
    /// Run what-if sweeps over single features
    Sensitivity(#[clap(flatten)] SensitivityArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::BuildDataset(arg) => build_dataset::run(&arg)?,
        Mode::Summarize(arg) => summarize::run(&arg)?,
        Mode::GridSearch(arg) => grid_search::run(&arg)?,
        Mode::CompareModels(arg) => compare_models::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::HoldoutExperiments(arg) => holdout_experiments::run(&arg)?,
        Mode::Sensitivity(arg) => sensitivity::run(&arg)?,
    }
    Ok(())
}

/// Deterministic RNG when a seed is given, freshly seeded otherwise.
fn make_rng(seed: Option<u64>) -> Pcg32 {
    Pcg32::seed_from_u64(seed.unwrap_or_else(|| rand::rng().random()))
}

/// Fits the feature encoder on the dataset and encodes it.
fn encode_dataset(dataset: &Dataset) -> anyhow::Result<(FeatureEncoder, EncodedTable)> {
    let encoder = FeatureEncoder::fit(dataset).context("Failed to fit the feature encoder")?;
    let table = encoder
        .encode(dataset)
        .context("Failed to encode the dataset")?;
    if table.unknown_categories > 0 {
        eprintln!(
            "Warning: {} indicator blocks encoded to all zeros (unseen categories)",
            table.unknown_categories
        );
    }
    Ok((encoder, table))
}

/// KNN model spec shared by the single-model commands.
fn knn_spec(neighbors: usize, weighting: KnnWeighting) -> ModelSpec {
    ModelSpec::Knn(KnnParams {
        n_neighbors: neighbors,
        weighting,
    })
}
