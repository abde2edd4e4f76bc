//! L2-regularized linear regression fitted by full-batch gradient descent.
//!
//! The model carries its training state in the type:
//! - [`LinearRegression`] = `LinearModel<Unfitted>`: hyperparameters, `fit`.
//! - `LinearModel<Fitted>`: weights and bias only, implements [`Regressor`]
//!   and serializes through [`LinearParams`].

use super::state::{Fitted, Unfitted};
use super::Regressor;
use crate::error::ForecastError;
use log::{debug, info};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Gradient-descent hyperparameters.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConfig {
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
    pub max_steps: usize,
    /// Stop once the gradient norm falls below this value.
    pub tolerance: f64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            l2: 1e-3,
            max_steps: 10_000,
            tolerance: 1e-6,
        }
    }
}

impl LinearConfig {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    pub fn with_max_steps(mut self, steps: usize) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::Training(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.l2.is_finite() && self.l2 >= 0.0) {
            return Err(ForecastError::Training(format!(
                "l2 penalty must be non-negative, got {}",
                self.l2
            )));
        }
        if self.max_steps == 0 {
            return Err(ForecastError::Training(
                "max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serializable representation of linear model parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weights: Vec<f64>,
    pub bias: f64,
}

/// A linear model with state encoded at the type level.
///
/// Hyperparameters live in the [`Unfitted`] state and are dropped by `fit`.
#[derive(Clone, Debug)]
pub struct LinearModel<S> {
    weights: Array1<f64>,
    bias: f64,
    state: S,
}

/// Alias for an **unfitted** linear regression model.
pub type LinearRegression = LinearModel<Unfitted>;

impl LinearModel<Unfitted> {
    /// Creates a zero-initialized model for `n_features` inputs.
    pub fn new(n_features: usize) -> Self {
        Self {
            weights: Array1::zeros(n_features),
            bias: 0.0,
            state: Unfitted::default(),
        }
    }

    pub fn with_config(mut self, config: LinearConfig) -> Self {
        self.state.config = config;
        self
    }

    pub fn config(&self) -> &LinearConfig {
        &self.state.config
    }

    /// Fit with full-batch gradient descent on mean squared error plus an L2
    /// penalty: `loss = mean((Xw + b - y)^2) + l2 * |w|^2`.
    ///
    /// The bias starts at `mean(y)` so that the weights only have to explain
    /// the deviation from the average.
    ///
    /// # Errors
    /// Returns [`ForecastError::Training`] for empty data, mismatched shapes,
    /// invalid hyperparameters or a diverging fit.
    pub fn fit(
        self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<LinearModel<Fitted>, ForecastError> {
        self.state.config.validate()?;
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(ForecastError::Training(
                "cannot fit a linear model on zero samples".to_string(),
            ));
        }
        if n_samples != y.len() {
            return Err(ForecastError::Training(format!(
                "X has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }
        if n_features != self.weights.len() {
            return Err(ForecastError::Training(format!(
                "model has {} weights but X has {} columns",
                self.weights.len(),
                n_features
            )));
        }

        let LinearConfig {
            learning_rate: lr,
            l2,
            max_steps,
            tolerance,
        } = self.state.config;
        let n = n_samples as f64;
        let mut weights = self.weights;
        let mut bias = y.mean().unwrap_or(0.0);

        let mut converged_at = None;
        for step in 0..max_steps {
            let preds = x.dot(&weights) + bias;
            let diffs = &preds - &y;

            let grad_bias = 2.0 / n * diffs.sum();
            let mut grad_w = x.t().dot(&diffs) * (2.0 / n);
            grad_w.scaled_add(2.0 * l2, &weights);

            weights.scaled_add(-lr, &grad_w);
            bias -= lr * grad_bias;

            let grad_norm = (grad_w.dot(&grad_w) + grad_bias * grad_bias).sqrt();
            if !grad_norm.is_finite() {
                return Err(ForecastError::Training(format!(
                    "gradient diverged at step {}; lower the learning rate",
                    step
                )));
            }
            if step % 1000 == 0 {
                debug!("step {}: gradient norm = {:.6}", step, grad_norm);
            }
            if grad_norm < tolerance {
                converged_at = Some(step);
                break;
            }
        }

        match converged_at {
            Some(step) => info!("linear model converged after {} steps", step + 1),
            None => info!("linear model stopped after max_steps = {}", max_steps),
        }

        Ok(LinearModel {
            weights,
            bias,
            state: Fitted,
        })
    }
}

impl LinearModel<Fitted> {
    /// Reconstruct a fitted model from stored parameters.
    pub fn from_params(params: LinearParams) -> Result<Self, ForecastError> {
        let model = Self {
            weights: Array1::from(params.weights),
            bias: params.bias,
            state: Fitted,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn extract_params(&self) -> LinearParams {
        LinearParams {
            weights: self.weights.to_vec(),
            bias: self.bias,
        }
    }

    /// Per-feature weights, in schema order.
    pub fn coefficients(&self) -> &[f64] {
        self.weights.as_slice().unwrap_or(&[])
    }

    pub fn intercept(&self) -> f64 {
        self.bias
    }

    pub(crate) fn validate(&self) -> Result<(), ForecastError> {
        if self.weights.iter().all(|w| w.is_finite()) && self.bias.is_finite() {
            Ok(())
        } else {
            Err(ForecastError::Serialization(
                "linear model contains non-finite parameters".to_string(),
            ))
        }
    }
}

impl Regressor for LinearModel<Fitted> {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.weights.dot(&row) + self.bias
    }
}

impl Serialize for LinearModel<Fitted> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.extract_params().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LinearModel<Fitted> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let params = LinearParams::deserialize(deserializer)?;
        Self::from_params(params).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_new_zero_initialized() {
        let model = LinearRegression::new(3);
        assert_eq!(model.weights.to_vec(), vec![0.0, 0.0, 0.0]);
        assert_eq!(model.bias, 0.0);
    }

    #[test]
    fn test_with_config_sets_unfitted_state() {
        let model = LinearRegression::new(1).with_config(LinearConfig::default().with_l2(0.5));
        assert_eq!(model.config().l2, 0.5);
    }

    #[test]
    fn test_fitted_model_is_parameters_only() {
        let x = array![[0.0], [1.0]];
        let y = array![1.0, 3.0];
        let fitted = LinearRegression::new(1)
            .with_config(LinearConfig::default().with_max_steps(5))
            .fit(x.view(), y.view())
            .unwrap();
        let restored = LinearModel::<Fitted>::from_params(fitted.extract_params()).unwrap();
        assert_eq!(
            bincode::serialize(&restored).unwrap(),
            bincode::serialize(&fitted).unwrap()
        );
    }

    #[test]
    fn test_fit_recovers_weights_and_bias() {
        // y = 2*x0 + 1*x1 + 3
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![3.0, 5.0, 4.0, 6.0];

        let fitted = LinearRegression::new(2)
            .with_config(LinearConfig::default().with_l2(0.0))
            .fit(x.view(), y.view())
            .unwrap();

        assert_abs_diff_eq!(fitted.coefficients()[0], 2.0, epsilon = 1e-2);
        assert_abs_diff_eq!(fitted.coefficients()[1], 1.0, epsilon = 1e-2);
        assert_abs_diff_eq!(fitted.intercept(), 3.0, epsilon = 1e-2);
        assert_abs_diff_eq!(
            fitted.predict_row(array![1.0, 1.0].view()),
            6.0,
            epsilon = 2e-2
        );
    }

    #[test]
    fn test_fit_l2_shrinks_weights() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 2.0, 4.0, 6.0];

        let plain = LinearRegression::new(1)
            .with_config(LinearConfig::default().with_l2(0.0))
            .fit(x.view(), y.view())
            .unwrap();
        let ridge = LinearRegression::new(1)
            .with_config(LinearConfig::default().with_l2(1.0))
            .fit(x.view(), y.view())
            .unwrap();

        assert!(ridge.coefficients()[0].abs() < plain.coefficients()[0].abs());
    }

    #[test]
    fn test_fit_empty_is_error() {
        let x = ndarray::Array2::<f64>::zeros((0, 2));
        let y = ndarray::Array1::<f64>::zeros(0);
        let result = LinearRegression::new(2).fit(x.view(), y.view());
        assert!(matches!(result, Err(ForecastError::Training(_))));
    }

    #[test]
    fn test_fit_shape_mismatch_is_error() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![1.0];
        assert!(LinearRegression::new(2).fit(x.view(), y.view()).is_err());

        let y = array![1.0, 2.0];
        assert!(LinearRegression::new(3).fit(x.view(), y.view()).is_err());
    }

    #[test]
    fn test_fit_rejects_bad_learning_rate() {
        let x = array![[1.0]];
        let y = array![1.0];
        let result = LinearRegression::new(1)
            .with_config(LinearConfig::default().with_learning_rate(0.0))
            .fit(x.view(), y.view());
        assert!(matches!(result, Err(ForecastError::Training(_))));
    }

    #[test]
    fn test_fit_divergence_is_error() {
        let x = array![[100.0], [200.0], [300.0]];
        let y = array![1.0, 2.0, 3.0];
        let result = LinearRegression::new(1)
            .with_config(LinearConfig::default().with_learning_rate(10.0))
            .fit(x.view(), y.view());
        assert!(matches!(result, Err(ForecastError::Training(_))));
    }

    #[test]
    fn test_params_roundtrip() {
        let params = LinearParams {
            weights: vec![0.5, -1.5],
            bias: 10.0,
        };
        let model = LinearModel::<Fitted>::from_params(params.clone()).unwrap();
        assert_eq!(model.extract_params(), params);
    }

    #[test]
    fn test_from_params_rejects_nan() {
        let params = LinearParams {
            weights: vec![f64::NAN],
            bias: 0.0,
        };
        assert!(LinearModel::<Fitted>::from_params(params).is_err());
    }

    #[test]
    fn test_serde_through_params() -> Result<(), Box<dyn std::error::Error>> {
        let model = LinearModel::<Fitted>::from_params(LinearParams {
            weights: vec![1.0, 2.0, 3.0],
            bias: 0.5,
        })?;
        let bytes = bincode::serialize(&model)?;
        let loaded: LinearModel<Fitted> = bincode::deserialize(&bytes)?;
        assert_eq!(loaded.extract_params(), model.extract_params());
        Ok(())
    }
}
