//! The trained model artifact: fitted parameters bound to their feature schema.
//!
//! An artifact is produced once by training and loaded read-only at start-up.
//! Loading validates that the model and schema agree before anything can
//! predict with them.

use crate::error::ForecastError;
use crate::metrics::RegressionMetrics;
use crate::model::{FittedModel, ModelKind, Regressor};
use crate::schema::FeatureSchema;
use crate::serialization::{self, SerializableParams};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Facts about how an artifact was trained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_kind: ModelKind,
    /// Name of the regression target column.
    pub target: String,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Metrics on the held-out split; `None` when nothing was held out.
    pub test_metrics: Option<RegressionMetrics>,
    /// Version of the crate that wrote the artifact.
    pub crate_version: String,
}

impl ArtifactMetadata {
    pub fn new(model_kind: ModelKind, train_rows: usize, test_rows: usize) -> Self {
        Self {
            model_kind,
            target: crate::dataset::TARGET_COLUMN.to_string(),
            train_rows,
            test_rows,
            test_metrics: None,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_test_metrics(mut self, metrics: RegressionMetrics) -> Self {
        self.test_metrics = Some(metrics);
        self
    }
}

/// Fitted model, its feature schema and training metadata.
///
/// Deserialization goes through [`TrainedModelArtifact::new`], so a decoded
/// artifact always has a model that fits its schema.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ArtifactParams")]
pub struct TrainedModelArtifact {
    schema: FeatureSchema,
    model: FittedModel,
    metadata: ArtifactMetadata,
}

/// Unvalidated wire form of [`TrainedModelArtifact`]; same field order.
#[derive(Serialize, Deserialize)]
struct ArtifactParams {
    schema: FeatureSchema,
    model: FittedModel,
    metadata: ArtifactMetadata,
}

impl TryFrom<ArtifactParams> for TrainedModelArtifact {
    type Error = ForecastError;

    fn try_from(params: ArtifactParams) -> Result<Self, Self::Error> {
        Self::new(params.schema, params.model, params.metadata)
    }
}

impl TrainedModelArtifact {
    /// Bind a fitted model to the schema it was trained on.
    ///
    /// # Errors
    /// Returns [`ForecastError::Serialization`] if the model does not fit the
    /// schema's feature count or is structurally invalid.
    pub fn new(
        schema: FeatureSchema,
        model: FittedModel,
        metadata: ArtifactMetadata,
    ) -> Result<Self, ForecastError> {
        let artifact = Self {
            schema,
            model,
            metadata,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn model_kind(&self) -> ModelKind {
        self.model.kind()
    }

    fn validate(&self) -> Result<(), ForecastError> {
        self.model.validate(self.schema.len())?;
        if self.metadata.model_kind != self.model.kind() {
            return Err(ForecastError::Serialization(format!(
                "metadata says {} but the stored model is {}",
                self.metadata.model_kind,
                self.model.kind()
            )));
        }
        Ok(())
    }

    /// Write the artifact as a framed bincode blob.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ForecastError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        info!(
            "saved {} model ({} features, {} bytes) to {}",
            self.model.kind(),
            self.schema.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }

    /// Read and validate an artifact.
    ///
    /// Prefer [`load_model`], which reports every failure as
    /// [`ForecastError::ModelLoad`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ForecastError> {
        let bytes = std::fs::read(path.as_ref())?;
        let version = serialization::format_version(&bytes)?;
        debug!(
            "read {} bytes, artifact format version {}",
            bytes.len(),
            version
        );
        Self::from_bytes(&bytes)
    }

    /// Raw regression output for an already-encoded row.
    pub(crate) fn regress(&self, row: ndarray::ArrayView1<'_, f64>) -> f64 {
        self.model.predict_row(row)
    }
}

/// Load the trained model artifact from `path`.
///
/// # Arguments
///
/// * `path` - Artifact written by [`TrainedModelArtifact::save_to_file`]
///
/// # Errors
/// Returns [`ForecastError::ModelLoad`] when the file is missing, unreadable,
/// not an artifact, written by a newer format, or internally inconsistent.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<TrainedModelArtifact, ForecastError> {
    let path = path.as_ref();
    let artifact =
        TrainedModelArtifact::load_from_file(path).map_err(|err| ForecastError::ModelLoad {
            path: path.to_path_buf(),
            reason: match err {
                ForecastError::Io(msg) | ForecastError::Serialization(msg) => msg,
                other => other.to_string(),
            },
        })?;
    info!(
        "loaded {} model with {} features from {}",
        artifact.model_kind(),
        artifact.schema().len(),
        path.display()
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fitted, LinearModel, LinearParams};
    use tempfile::tempdir;

    fn linear_artifact() -> TrainedModelArtifact {
        let schema = FeatureSchema::new(vec![
            "Popularity_Index".to_string(),
            "Day_of_Week_Monday".to_string(),
        ])
        .unwrap();
        let model = LinearModel::<Fitted>::from_params(LinearParams {
            weights: vec![100.0, 20.0],
            bias: 10.0,
        })
        .unwrap();
        TrainedModelArtifact::new(
            schema,
            model.into(),
            ArtifactMetadata::new(ModelKind::Linear, 8, 2),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_feature_count_mismatch() {
        let schema = FeatureSchema::new(vec!["Popularity_Index".to_string()]).unwrap();
        let model = LinearModel::<Fitted>::from_params(LinearParams {
            weights: vec![1.0, 2.0],
            bias: 0.0,
        })
        .unwrap();
        let result = TrainedModelArtifact::new(
            schema,
            model.into(),
            ArtifactMetadata::new(ModelKind::Linear, 1, 0),
        );
        assert!(matches!(result, Err(ForecastError::Serialization(_))));
    }

    #[test]
    fn test_new_rejects_kind_mismatch() {
        let artifact = linear_artifact();
        let result = TrainedModelArtifact::new(
            artifact.schema.clone(),
            artifact.model.clone(),
            ArtifactMetadata::new(ModelKind::RandomForest, 1, 0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("model.bin");
        let artifact = linear_artifact();
        artifact.save_to_file(&path)?;

        let loaded = load_model(&path)?;
        assert_eq!(loaded.schema(), artifact.schema());
        assert_eq!(loaded.metadata(), artifact.metadata());
        let row = ndarray::array![0.5, 1.0];
        assert_eq!(loaded.regress(row.view()), artifact.regress(row.view()));
        Ok(())
    }

    fn mismatched_params() -> ArtifactParams {
        let schema = FeatureSchema::new(
            ["Popularity_Index", "Day_of_Week_Monday", "Meal_Type_Lunch", "Food_Item_Rice"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        )
        .unwrap();
        let model = LinearModel::<Fitted>::from_params(LinearParams {
            weights: vec![1.0, 2.0],
            bias: 0.0,
        })
        .unwrap();
        ArtifactParams {
            schema,
            model: model.into(),
            metadata: ArtifactMetadata::new(ModelKind::Linear, 4, 0),
        }
    }

    #[test]
    fn test_from_bytes_rejects_model_schema_mismatch() {
        let bytes = mismatched_params().to_bytes().unwrap();
        assert!(matches!(
            TrainedModelArtifact::from_bytes(&bytes),
            Err(ForecastError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_mismatched_artifact_is_model_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mismatched.bin");
        std::fs::write(&path, mismatched_params().to_bytes().unwrap()).unwrap();
        assert!(matches!(
            load_model(&path),
            Err(ForecastError::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_model_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.bin");
        match load_model(&path) {
            Err(ForecastError::ModelLoad { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_load_corrupt_file_is_model_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"definitely not a model").unwrap();
        assert!(matches!(
            load_model(&path),
            Err(ForecastError::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_load_truncated_artifact_is_model_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("truncated.bin");
        let bytes = linear_artifact().to_bytes().unwrap();
        std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(
            load_model(&path),
            Err(ForecastError::ModelLoad { .. })
        ));
    }
}
