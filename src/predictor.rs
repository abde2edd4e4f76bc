//! Attendance prediction on top of a loaded model artifact.
//!
//! A [`Predictor`] holds a shared, read-only handle to the artifact and an
//! encoder bound to the artifact's schema. It is cheap to clone and safe to
//! share between threads.

use crate::artifact::{load_model, TrainedModelArtifact};
use crate::config::ForecastConfig;
use crate::encoding::{FeatureEncoder, FeatureVector, HandleUnknown, UnseenCategory};
use crate::error::ForecastError;
use crate::record::MealRecord;
use crate::strategy::{ServingPolicy, ServingStrategy};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// Predicted attendance for one record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    pub students: u32,
    /// Categorical values the model never saw. Non-empty means the estimate
    /// leans on the remaining features only and should be trusted less.
    pub unseen: Vec<UnseenCategory>,
}

impl Prediction {
    pub fn is_low_confidence(&self) -> bool {
        !self.unseen.is_empty()
    }
}

/// Turn a raw regression output into a headcount.
///
/// Rounds half to even and clamps at zero; NaN maps to zero.
pub fn to_headcount(raw: f64) -> u32 {
    let rounded = raw.round_ties_even();
    if rounded.is_nan() || rounded <= 0.0 {
        0
    } else {
        // Saturating cast for absurdly large outputs.
        rounded as u32
    }
}

/// Shared-artifact predictor.
#[derive(Clone, Debug)]
pub struct Predictor {
    artifact: Arc<TrainedModelArtifact>,
    encoder: FeatureEncoder,
}

impl Predictor {
    pub fn new(artifact: Arc<TrainedModelArtifact>) -> Self {
        let encoder = FeatureEncoder::new(artifact.schema().clone());
        Self { artifact, encoder }
    }

    /// Load the configured artifact and apply the configured unknown policy.
    pub fn from_config(config: &ForecastConfig) -> Result<Self, ForecastError> {
        let artifact = load_model(&config.model_path)?;
        Ok(Self::new(Arc::new(artifact)).with_handle_unknown(config.handle_unknown))
    }

    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.encoder = self.encoder.with_handle_unknown(strategy);
        self
    }

    pub fn artifact(&self) -> &Arc<TrainedModelArtifact> {
        &self.artifact
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Predict from an already-encoded vector.
    ///
    /// # Errors
    /// Returns [`ForecastError::SchemaMismatch`] if the vector's columns are
    /// not exactly the artifact's schema columns, in order.
    pub fn predict_vector(&self, vector: &FeatureVector) -> Result<u32, ForecastError> {
        let schema = self.artifact.schema();
        if !vector.shares_columns_with(schema) && !schema.same_columns(vector.columns()) {
            return Err(ForecastError::SchemaMismatch {
                expected_features: schema.len(),
                got_features: vector.len(),
                detail: schema.describe_mismatch(vector.columns()),
            });
        }
        let raw = self.artifact.regress(vector.view());
        debug!("raw regression output {:.3}", raw);
        Ok(to_headcount(raw))
    }

    /// Encode and predict one record.
    pub fn predict(&self, record: &MealRecord) -> Result<Prediction, ForecastError> {
        let encoded = self.encoder.encode(record)?;
        let students = self.predict_vector(&encoded.vector)?;
        Ok(Prediction {
            students,
            unseen: encoded.unseen,
        })
    }

    /// Predict and derive the serving strategy in one step.
    pub fn forecast(
        &self,
        record: &MealRecord,
        policy: &ServingPolicy,
    ) -> Result<Forecast, ForecastError> {
        let prediction = self.predict(record)?;
        let strategy = policy.apply(prediction.students);
        Ok(Forecast {
            prediction,
            strategy,
        })
    }
}

/// Prediction plus serving strategy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forecast {
    pub prediction: Prediction,
    pub strategy: ServingStrategy,
}

/// Predict attendance for `record` with `artifact`, using the default
/// unknown-category policy.
///
/// # Arguments
///
/// * `record` - The meal to forecast
/// * `artifact` - A loaded model artifact
///
/// # Returns
///
/// The expected number of students, rounded half to even and never negative
///
/// # Errors
///
/// Propagates encoder errors; under the default [`HandleUnknown::Ignore`]
/// policy there are none.
///
/// # Examples
///
/// ```no_run
/// use foodcast::{load_model, predict, MealRecord};
///
/// let artifact = load_model("attendance_model.bin")?;
/// let students = predict(&MealRecord::new("Friday", "Supper", "Yam", 0.6), &artifact)?;
/// println!("expecting {} students", students);
/// # Ok::<(), foodcast::ForecastError>(())
/// ```
pub fn predict(record: &MealRecord, artifact: &TrainedModelArtifact) -> Result<u32, ForecastError> {
    let encoder = FeatureEncoder::new(artifact.schema().clone());
    let encoded = encoder.encode(record)?;
    Ok(to_headcount(artifact.regress(encoded.vector.view())))
}
