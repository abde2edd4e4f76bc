//! # foodcast
//!
//! Meal attendance forecasting for canteens and dining halls: predict how many
//! people will turn up for a meal, then decide how many portions to cook and
//! how much food-waste risk that carries.
//!
//! ## Core Design Principles
//!
//! - **Schema-bound artifacts**: a trained model is saved together with the
//!   exact ordered feature columns it was fitted on, so inference never has to
//!   guess the layout.
//! - **Pure prediction pipeline**: encode → regress → round → serving strategy,
//!   each step a function of its inputs and a read-only artifact.
//! - **Stateful type safety**: unfitted and fitted linear models are distinct
//!   types; only fitted models can predict or be serialized.
//!
//! ## Quick Start
//!
//! ```no_run
//! use foodcast::{compute_serving_strategy, load_model, predict, MealRecord};
//!
//! let artifact = load_model("attendance_model.bin")?;
//! let record = MealRecord::new("Monday", "Lunch", "Rice", 0.8);
//! let students = predict(&record, &artifact)?;
//! let strategy = compute_serving_strategy(students, 0.07);
//! println!("{} students, cook {} portions ({} risk)", students, strategy.portions, strategy.risk);
//! # Ok::<(), foodcast::ForecastError>(())
//! ```
//!
//! ## Module Structure
//!
//! - `record`: raw meal records and popularity-index sanitizing
//! - `schema` / `encoding`: feature schema and one-hot encoding
//! - `model`: regression trees, random forest, linear regression
//! - `artifact` / `serialization`: persisted model artifacts
//! - `predictor` / `strategy`: attendance prediction and serving strategy
//! - `dataset` / `training` / `metrics`: training pipeline
//! - `inspect`: artifact summaries
//! - `config` / `cli`: runtime configuration and the `foodcast` binary

pub mod artifact;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod inspect;
pub mod metrics;
pub mod model;
pub mod predictor;
pub mod record;
pub mod schema;
pub mod serialization;
pub mod strategy;
pub mod training;

pub use artifact::{load_model, ArtifactMetadata, TrainedModelArtifact};
pub use config::ForecastConfig;
pub use dataset::AttendanceDataset;
pub use encoding::{EncodedRecord, FeatureEncoder, FeatureVector, HandleUnknown, UnseenCategory};
pub use error::{ForecastError, Result};
pub use model::{FittedModel, ModelKind, Regressor};
pub use predictor::{predict, Forecast, Prediction, Predictor};
pub use record::{sanitize_popularity, MealRecord, DEFAULT_POPULARITY};
pub use schema::FeatureSchema;
pub use strategy::{compute_serving_strategy, RiskLevel, ServingPolicy, ServingStrategy};
pub use training::{train, TrainingConfig, TrainingReport};
