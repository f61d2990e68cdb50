//! The regressor capability and typed model specifications.
//!
//! The evaluation harness treats model internals as opaque: anything that can
//! `fit` on a feature matrix and `predict` labels plugs in through the
//! [`Regressor`] trait. Model selection works over [`ModelSpec`] values, one
//! tagged variant per model family carrying a strongly typed hyperparameter
//! record; there is no stringly-typed branching on family names.
//!
//! A [`RegressorFactory`] turns specs into live models. The built-in factory
//! implements the k-nearest-neighbours family natively (see [`crate::knn`]);
//! the other families are served by external collaborators, and requesting
//! them from the built-in factory is an isolated [`ModelFitError`] — in a
//! comparison sweep that candidate scores NaN instead of aborting the run.

use serde::{Deserialize, Serialize};

use crate::knn::KnnRegressor;

/// A model-level failure, isolated per candidate during comparison sweeps.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ModelFitError {
    /// The factory has no implementation for the requested family.
    #[display("model family '{family}' has no built-in implementation")]
    UnsupportedFamily { family: ModelFamily },
    /// Fit was called with no training rows.
    #[display("cannot fit on an empty training set")]
    EmptyTrainingSet,
    /// Prediction rows have a different width than the training matrix.
    #[display("feature-count mismatch: trained on {expected} features, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },
    /// Predict was called before fit.
    #[display("model was queried before fitting")]
    NotFitted,
    /// The training set is too small for the requested configuration
    /// (e.g. fewer rows than neighbours, or fewer rows than folds).
    #[display("training set of {available} rows cannot satisfy a request for {requested}")]
    InsufficientRows { requested: usize, available: usize },
}

/// Anything that can fit on a feature matrix and predict labels.
///
/// Features are rows of `f64` values in the layout produced by
/// [`crate::encoder::FeatureEncoder`]; labels are log10 corrosion rates.
pub trait Regressor {
    /// Fits the model on the given rows.
    fn fit(&mut self, features: &[Vec<f64>], labels: &[f64]) -> Result<(), ModelFitError>;

    /// Predicts a label for every row.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelFitError>;

    /// Per-feature importances, for model families that expose them
    /// (tree ensembles). `None` otherwise.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// The four candidate model families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum ModelFamily {
    #[display("MLP")]
    Mlp,
    #[display("SVM")]
    Svm,
    #[display("RF")]
    RandomForest,
    #[display("KNN")]
    Knn,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 4] = [
        ModelFamily::Mlp,
        ModelFamily::Svm,
        ModelFamily::RandomForest,
        ModelFamily::Knn,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown model family '{name}' (expected mlp, svm, rf, or knn)")]
pub struct ParseModelFamilyError {
    pub name: String,
}

impl std::str::FromStr for ModelFamily {
    type Err = ParseModelFamilyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mlp" => Ok(ModelFamily::Mlp),
            "svm" => Ok(ModelFamily::Svm),
            "rf" | "randomforest" => Ok(ModelFamily::RandomForest),
            "knn" => Ok(ModelFamily::Knn),
            _ => Err(ParseModelFamilyError {
                name: s.to_string(),
            }),
        }
    }
}

/// Multi-layer perceptron hyperparameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MlpParams {
    /// Hidden layer widths, e.g. `[8, 8, 8, 8]`.
    pub hidden_layers: Vec<usize>,
}

/// Support-vector regression hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// RBF kernel coefficient.
    pub gamma: f64,
    /// Regularization strength.
    pub c: f64,
}

/// Random-forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees.
    pub n_estimators: usize,
    /// Fraction of features considered per split.
    pub max_features: f64,
}

/// Neighbour weighting scheme for the KNN family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum KnnWeighting {
    /// All neighbours count equally.
    #[display("uniform")]
    Uniform,
    /// Neighbours weighted by inverse distance; an exact match dominates.
    #[display("distance")]
    Distance,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown weighting '{name}' (expected uniform or distance)")]
pub struct ParseWeightingError {
    pub name: String,
}

impl std::str::FromStr for KnnWeighting {
    type Err = ParseWeightingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uniform" => Ok(KnnWeighting::Uniform),
            "distance" => Ok(KnnWeighting::Distance),
            _ => Err(ParseWeightingError {
                name: s.to_string(),
            }),
        }
    }
}

/// K-nearest-neighbours hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnnParams {
    pub n_neighbors: usize,
    pub weighting: KnnWeighting,
}

/// A fully specified model candidate: one variant per family, each carrying
/// its typed hyperparameter record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelSpec {
    Mlp(MlpParams),
    Svm(SvmParams),
    RandomForest(ForestParams),
    Knn(KnnParams),
}

impl ModelSpec {
    #[must_use]
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelSpec::Mlp(_) => ModelFamily::Mlp,
            ModelSpec::Svm(_) => ModelFamily::Svm,
            ModelSpec::RandomForest(_) => ModelFamily::RandomForest,
            ModelSpec::Knn(_) => ModelFamily::Knn,
        }
    }

    /// Short human-readable label for report rows, e.g. `KNN_3_distance`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            ModelSpec::Mlp(p) => {
                let layers = p
                    .hidden_layers
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("-");
                format!("MLP_{layers}")
            }
            ModelSpec::Svm(p) => format!("SVM_{}_{}", p.gamma, p.c),
            ModelSpec::RandomForest(p) => format!("RF_{}_{}", p.n_estimators, p.max_features),
            ModelSpec::Knn(p) => format!("KNN_{}_{}", p.n_neighbors, p.weighting),
        }
    }
}

/// The full hyperparameter grid for one family.
///
/// Grid contents follow the published study: layer shapes of widths
/// {2,4,6,8,10} and depths 1-5 for the MLP; gamma × C for the SVM; tree
/// count × feature fraction for the forest; k × weighting for KNN.
#[must_use]
pub fn hyperparameter_grid(family: ModelFamily) -> Vec<ModelSpec> {
    match family {
        ModelFamily::Mlp => {
            let mut specs = vec![];
            for depth in 1..=5 {
                for width in [2, 4, 6, 8, 10] {
                    specs.push(ModelSpec::Mlp(MlpParams {
                        hidden_layers: vec![width; depth],
                    }));
                }
            }
            specs
        }
        ModelFamily::Svm => {
            let mut specs = vec![];
            for gamma in [1.0, 0.1, 0.01, 0.001, 0.0001] {
                for c in [1.0, 5.0, 10.0, 100.0, 1000.0] {
                    specs.push(ModelSpec::Svm(SvmParams { gamma, c }));
                }
            }
            specs
        }
        ModelFamily::RandomForest => {
            let mut specs = vec![];
            for n_estimators in [10, 50, 100, 200, 500] {
                for max_features in [0.6, 0.7, 0.8, 0.9, 1.0] {
                    specs.push(ModelSpec::RandomForest(ForestParams {
                        n_estimators,
                        max_features,
                    }));
                }
            }
            specs
        }
        ModelFamily::Knn => {
            let mut specs = vec![];
            for n_neighbors in 1..=7 {
                for weighting in [KnnWeighting::Uniform, KnnWeighting::Distance] {
                    specs.push(ModelSpec::Knn(KnnParams {
                        n_neighbors,
                        weighting,
                    }));
                }
            }
            specs
        }
    }
}

/// The best-known spec of each family from earlier grid searches.
#[must_use]
pub fn default_candidates() -> Vec<ModelSpec> {
    vec![
        ModelSpec::Mlp(MlpParams {
            hidden_layers: vec![8, 8, 8, 8],
        }),
        ModelSpec::Svm(SvmParams {
            gamma: 1.0,
            c: 1000.0,
        }),
        ModelSpec::RandomForest(ForestParams {
            n_estimators: 500,
            max_features: 0.7,
        }),
        ModelSpec::Knn(KnnParams {
            n_neighbors: 3,
            weighting: KnnWeighting::Distance,
        }),
    ]
}

/// Builds live models from specs.
pub trait RegressorFactory {
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn Regressor>, ModelFitError>;
}

/// Factory for the natively implemented families.
///
/// Only KNN is built in; MLP, SVM, and random-forest fits come from external
/// collaborators wired in through their own [`RegressorFactory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRegressorFactory;

impl RegressorFactory for BuiltinRegressorFactory {
    fn build(&self, spec: &ModelSpec) -> Result<Box<dyn Regressor>, ModelFitError> {
        match spec {
            ModelSpec::Knn(params) => Ok(Box::new(KnnRegressor::new(*params))),
            other => Err(ModelFitError::UnsupportedFamily {
                family: other.family(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_sizes_match_study() {
        assert_eq!(hyperparameter_grid(ModelFamily::Mlp).len(), 25);
        assert_eq!(hyperparameter_grid(ModelFamily::Svm).len(), 25);
        assert_eq!(hyperparameter_grid(ModelFamily::RandomForest).len(), 25);
        assert_eq!(hyperparameter_grid(ModelFamily::Knn).len(), 14);
    }

    #[test]
    fn test_spec_labels() {
        let spec = ModelSpec::Knn(KnnParams {
            n_neighbors: 3,
            weighting: KnnWeighting::Distance,
        });
        assert_eq!(spec.label(), "KNN_3_distance");

        let spec = ModelSpec::Mlp(MlpParams {
            hidden_layers: vec![8, 8, 8, 8],
        });
        assert_eq!(spec.label(), "MLP_8-8-8-8");
    }

    #[test]
    fn test_builtin_factory_rejects_external_families() {
        let factory = BuiltinRegressorFactory;
        let err = factory
            .build(&ModelSpec::Svm(SvmParams { gamma: 1.0, c: 1.0 }))
            .map(|_| ())
            .unwrap_err();
        assert_eq!(
            err,
            ModelFitError::UnsupportedFamily {
                family: ModelFamily::Svm
            }
        );
    }

    #[test]
    fn test_family_parses_case_insensitively() {
        assert_eq!("RF".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        assert_eq!("knn".parse::<ModelFamily>().unwrap(), ModelFamily::Knn);
        assert!("ridge".parse::<ModelFamily>().is_err());
    }
}
