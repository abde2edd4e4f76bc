//! Regression models for attendance prediction.
//!
//! Two model families are available:
//! - [`RandomForest`]: bagged ensemble of regression trees (default).
//! - [`LinearModel`]: L2-regularized linear regression.
//!
//! Both implement [`Regressor`], the inference-only interface the predictor
//! depends on. [`FittedModel`] is the closed set stored in a model artifact.

pub mod forest;
pub mod linear;
pub mod state;
pub mod tree;

pub use forest::{ForestConfig, ForestValidationError, RandomForest, RandomForestRegressor};
pub use linear::{LinearConfig, LinearModel, LinearParams, LinearRegression};
pub use state::{Fitted, Unfitted};
pub use tree::{RegressionTree, TreeValidationError};

use crate::error::ForecastError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inference interface shared by all fitted models.
pub trait Regressor {
    /// Number of input features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predict a single sample.
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64;

    /// Predict every row of `x`.
    fn predict_batch(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }
}

/// Model family selector used by training and reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    #[default]
    RandomForest,
    Linear,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::RandomForest => f.write_str("random-forest"),
            ModelKind::Linear => f.write_str("linear"),
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random-forest" | "forest" | "rf" => Ok(ModelKind::RandomForest),
            "linear" | "ridge" => Ok(ModelKind::Linear),
            other => Err(ForecastError::InvalidInput(format!(
                "unknown model kind '{}'",
                other
            ))),
        }
    }
}

/// A fitted model of any supported family.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FittedModel {
    RandomForest(RandomForest),
    Linear(LinearModel<Fitted>),
}

impl FittedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::RandomForest(_) => ModelKind::RandomForest,
            FittedModel::Linear(_) => ModelKind::Linear,
        }
    }

    /// Check structural invariants after deserialization.
    ///
    /// # Errors
    /// Returns [`ForecastError::Serialization`] if the parameters are not
    /// usable for `n_features` inputs.
    pub fn validate(&self, n_features: usize) -> Result<(), ForecastError> {
        if self.n_features() != n_features {
            return Err(ForecastError::Serialization(format!(
                "model expects {} features but its schema has {}",
                self.n_features(),
                n_features
            )));
        }
        match self {
            FittedModel::RandomForest(forest) => forest
                .validate()
                .map_err(|e| ForecastError::Serialization(e.to_string())),
            FittedModel::Linear(model) => model.validate(),
        }
    }
}

impl Regressor for FittedModel {
    fn n_features(&self) -> usize {
        match self {
            FittedModel::RandomForest(m) => m.n_features(),
            FittedModel::Linear(m) => m.n_features(),
        }
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        match self {
            FittedModel::RandomForest(m) => m.predict_row(row),
            FittedModel::Linear(m) => m.predict_row(row),
        }
    }
}

impl From<RandomForest> for FittedModel {
    fn from(model: RandomForest) -> Self {
        FittedModel::RandomForest(model)
    }
}

impl From<LinearModel<Fitted>> for FittedModel {
    fn from(model: LinearModel<Fitted>) -> Self {
        FittedModel::Linear(model)
    }
}
