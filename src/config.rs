//! Runtime configuration for prediction.
//!
//! Defaults can be overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `FOODCAST_MODEL_PATH` | [`ForecastConfig::model_path`] |
//! | `FOODCAST_BUFFER_RATIO` | [`ForecastConfig::buffer_ratio`] |
//! | `FOODCAST_STRICT_CATEGORIES` | [`ForecastConfig::handle_unknown`] (`true` selects [`HandleUnknown::Error`]) |

use crate::encoding::HandleUnknown;
use crate::error::ForecastError;
use crate::strategy::{ServingPolicy, DEFAULT_BUFFER_RATIO};
use std::env;
use std::path::PathBuf;

pub const ENV_MODEL_PATH: &str = "FOODCAST_MODEL_PATH";
pub const ENV_BUFFER_RATIO: &str = "FOODCAST_BUFFER_RATIO";
pub const ENV_STRICT_CATEGORIES: &str = "FOODCAST_STRICT_CATEGORIES";

/// Default artifact location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "attendance_model.bin";

/// Prediction-time configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Trained model artifact to load at start-up (default: `attendance_model.bin`)
    pub model_path: PathBuf,

    /// Extra share of portions prepared on top of the prediction (default: 0.07)
    pub buffer_ratio: f64,

    /// What to do with categories the model never saw (default: Ignore)
    pub handle_unknown: HandleUnknown,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            buffer_ratio: DEFAULT_BUFFER_RATIO,
            handle_unknown: HandleUnknown::Ignore,
        }
    }
}

impl ForecastConfig {
    /// Defaults overridden by `FOODCAST_*` environment variables.
    ///
    /// # Errors
    /// Returns [`ForecastError::InvalidInput`] if a variable is set to an
    /// unparseable value.
    pub fn from_env() -> Result<Self, ForecastError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Defaults with only `FOODCAST_MODEL_PATH` applied.
    ///
    /// For commands that never serve a prediction (training, inspection), so
    /// a malformed prediction setting cannot block them.
    pub fn model_only_from_env() -> Self {
        Self::model_only_from_lookup(|key| env::var(key).ok())
    }

    pub fn model_only_from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(path) = lookup(ENV_MODEL_PATH).filter(|p| !p.trim().is_empty()) {
            config.model_path = PathBuf::from(path.trim());
        }
        config
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForecastError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::model_only_from_lookup(&lookup);

        if let Some(raw) = lookup(ENV_BUFFER_RATIO) {
            let ratio = raw.trim().parse::<f64>().map_err(|_| {
                ForecastError::InvalidInput(format!(
                    "{} must be a number, got '{}'",
                    ENV_BUFFER_RATIO, raw
                ))
            })?;
            config.buffer_ratio = ServingPolicy::new(ratio)?.buffer_ratio();
        }
        if let Some(raw) = lookup(ENV_STRICT_CATEGORIES) {
            config.handle_unknown = if parse_flag(ENV_STRICT_CATEGORIES, &raw)? {
                HandleUnknown::Error
            } else {
                HandleUnknown::Ignore
            };
        }
        Ok(config)
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_buffer_ratio(mut self, ratio: f64) -> Self {
        self.buffer_ratio = ratio;
        self
    }

    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }

    /// Validated serving policy for the configured buffer ratio.
    pub fn serving_policy(&self) -> Result<ServingPolicy, ForecastError> {
        ServingPolicy::new(self.buffer_ratio)
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, ForecastError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ForecastError::InvalidInput(format!(
            "{} must be a boolean, got '{}'",
            name, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ForecastConfig::default();
        assert_eq!(config.model_path, PathBuf::from("attendance_model.bin"));
        assert_eq!(config.buffer_ratio, 0.07);
        assert_eq!(config.handle_unknown, HandleUnknown::Ignore);
    }

    #[test]
    fn test_from_lookup_empty_is_default() {
        let config = ForecastConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ForecastConfig::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ForecastConfig::from_lookup(lookup(&[
            (ENV_MODEL_PATH, "/srv/models/canteen.bin"),
            (ENV_BUFFER_RATIO, " 0.12 "),
            (ENV_STRICT_CATEGORIES, "true"),
        ]))
        .unwrap();
        assert_eq!(config.model_path, PathBuf::from("/srv/models/canteen.bin"));
        assert_eq!(config.buffer_ratio, 0.12);
        assert_eq!(config.handle_unknown, HandleUnknown::Error);
    }

    #[test]
    fn test_from_lookup_rejects_bad_ratio() {
        let result = ForecastConfig::from_lookup(lookup(&[(ENV_BUFFER_RATIO, "lots")]));
        assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
        let result = ForecastConfig::from_lookup(lookup(&[(ENV_BUFFER_RATIO, "-0.5")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_rejects_bad_flag() {
        let result = ForecastConfig::from_lookup(lookup(&[(ENV_STRICT_CATEGORIES, "maybe")]));
        assert!(matches!(result, Err(ForecastError::InvalidInput(_))));
    }

    #[test]
    fn test_model_only_ignores_prediction_settings() {
        let vars = lookup(&[
            (ENV_MODEL_PATH, "canteen.bin"),
            (ENV_BUFFER_RATIO, "lots"),
            (ENV_STRICT_CATEGORIES, "maybe"),
        ]);
        let config = ForecastConfig::model_only_from_lookup(&vars);
        assert_eq!(config.model_path, PathBuf::from("canteen.bin"));
        assert_eq!(config.buffer_ratio, DEFAULT_BUFFER_RATIO);
        assert!(ForecastConfig::from_lookup(vars).is_err());
    }

    #[test]
    fn test_builders() {
        let config = ForecastConfig::default()
            .with_model_path("m.bin")
            .with_buffer_ratio(0.03)
            .with_handle_unknown(HandleUnknown::Error);
        assert_eq!(config.model_path, PathBuf::from("m.bin"));
        assert_eq!(config.serving_policy().unwrap().buffer_ratio(), 0.03);
        assert_eq!(config.handle_unknown, HandleUnknown::Error);
    }
}
