//! Training pipeline: dataset → schema → encoded matrix → fitted model → artifact.

use crate::artifact::{ArtifactMetadata, TrainedModelArtifact};
use crate::dataset::AttendanceDataset;
use crate::encoding::FeatureEncoder;
use crate::error::ForecastError;
use crate::metrics::{Metrics, RegressionMetrics};
use crate::model::{
    FittedModel, ForestConfig, LinearConfig, LinearRegression, ModelKind, RandomForestRegressor,
    Regressor,
};
use crate::schema::FeatureSchema;
use log::{info, warn};
use ndarray::Array1;

/// Settings for a training run.
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingConfig {
    /// Share of rows held out for evaluation (default: 0.2)
    pub test_fraction: f64,
    /// Seed for the train/test shuffle (default: 42)
    pub split_seed: u64,
    pub model_kind: ModelKind,
    pub forest: ForestConfig,
    pub linear: LinearConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            split_seed: 42,
            model_kind: ModelKind::RandomForest,
            forest: ForestConfig::default(),
            linear: LinearConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn with_split_seed(mut self, seed: u64) -> Self {
        self.split_seed = seed;
        self
    }

    pub fn with_model_kind(mut self, kind: ModelKind) -> Self {
        self.model_kind = kind;
        self
    }

    pub fn with_forest(mut self, forest: ForestConfig) -> Self {
        self.forest = forest;
        self
    }

    pub fn with_linear(mut self, linear: LinearConfig) -> Self {
        self.linear = linear;
        self
    }
}

/// Outcome of [`train`].
#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub artifact: TrainedModelArtifact,
    /// Held-out metrics; `None` when `test_fraction` is 0.
    pub test_metrics: Option<RegressionMetrics>,
    pub train_metrics: RegressionMetrics,
}

/// Fit a model on `dataset` and bind it to a freshly derived schema.
///
/// The schema is derived from the training split only, so categories that
/// appear only in the test split are treated as unseen during evaluation.
pub fn train(
    dataset: &AttendanceDataset,
    config: &TrainingConfig,
) -> Result<TrainingReport, ForecastError> {
    let (train_set, test_set) = dataset.split(config.test_fraction, config.split_seed)?;
    info!(
        "split {} rows into {} train / {} test",
        dataset.len(),
        train_set.len(),
        test_set.len()
    );

    let schema = FeatureSchema::from_records(train_set.records())?;
    let encoder = FeatureEncoder::new(schema.clone());
    let x_train = encoder.encode_batch(train_set.records())?;
    let y_train = Array1::from(train_set.targets().to_vec());
    info!("encoded training matrix: {} x {}", x_train.nrows(), x_train.ncols());

    let model: FittedModel = match config.model_kind {
        ModelKind::RandomForest => RandomForestRegressor::new(config.forest.clone())
            .fit(x_train.view(), y_train.view())?
            .into(),
        ModelKind::Linear => LinearRegression::new(schema.len())
            .with_config(config.linear.clone())
            .fit(x_train.view(), y_train.view())?
            .into(),
    };

    let train_pred = model.predict_batch(x_train.view());
    let train_metrics = Metrics::calculate_all(train_set.targets(), &train_pred.to_vec())?;

    let test_metrics = if test_set.is_empty() {
        warn!("no rows held out; skipping evaluation");
        None
    } else {
        let x_test = encoder.encode_batch(test_set.records())?;
        let test_pred = model.predict_batch(x_test.view());
        Some(Metrics::calculate_all(test_set.targets(), &test_pred.to_vec())?)
    };

    if let Some(m) = &test_metrics {
        info!(
            "test metrics: MAE = {:.3}, RMSE = {:.3}, R² = {:.4}",
            m.mae, m.rmse, m.r_squared
        );
    }

    let mut metadata = ArtifactMetadata::new(model.kind(), train_set.len(), test_set.len());
    if let Some(m) = test_metrics {
        metadata = metadata.with_test_metrics(m);
    }
    let artifact = TrainedModelArtifact::new(schema, model, metadata)?;

    Ok(TrainingReport {
        artifact,
        test_metrics,
        train_metrics,
    })
}
