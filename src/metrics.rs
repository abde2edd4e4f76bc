//! Regression metrics used to report model quality after training.

use crate::error::ForecastError;
use serde::{Deserialize, Serialize};

/// Metrics for evaluating regression models.
pub struct Metrics;

impl Metrics {
    /// Calculate Mean Squared Error (MSE).
    ///
    /// MSE = mean((y_true - y_pred)^2)
    ///
    /// # Arguments
    ///
    /// * `y_true` - Observed attendance
    /// * `y_pred` - Predicted attendance
    ///
    /// # Returns
    ///
    /// The MSE value (lower is better); 0.0 for empty input
    pub fn mse(y_true: &[f64], y_pred: &[f64]) -> f64 {
        if y_true.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(&t, &p)| (t - p).powi(2))
            .sum();
        sum_sq / y_true.len() as f64
    }

    /// Root Mean Squared Error, in the units of the target.
    pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
        Self::mse(y_true, y_pred).sqrt()
    }

    /// Calculate Mean Absolute Error (MAE).
    ///
    /// MAE = mean(|y_true - y_pred|)
    ///
    /// # Arguments
    ///
    /// * `y_true` - Observed attendance
    /// * `y_pred` - Predicted attendance
    ///
    /// # Returns
    ///
    /// The MAE value, in students (lower is better)
    pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
        if y_true.is_empty() {
            return 0.0;
        }
        let sum_abs: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(&t, &p)| (t - p).abs())
            .sum();
        sum_abs / y_true.len() as f64
    }

    /// Calculate the coefficient of determination (R²).
    ///
    /// R² = 1 - SS_res / SS_tot
    ///
    /// # Arguments
    ///
    /// * `y_true` - Observed attendance
    /// * `y_pred` - Predicted attendance
    ///
    /// # Returns
    ///
    /// 1.0 for a perfect fit, negative when the model is worse than predicting
    /// the mean. A constant target gives 1.0 for a perfect fit and 0.0 otherwise.
    pub fn r_squared(y_true: &[f64], y_pred: &[f64]) -> f64 {
        if y_true.is_empty() {
            return 0.0;
        }
        let mean_true = y_true.iter().sum::<f64>() / y_true.len() as f64;
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(&t, &p)| (t - p).powi(2))
            .sum();
        let ss_tot: f64 = y_true.iter().map(|&t| (t - mean_true).powi(2)).sum();

        if ss_tot == 0.0 {
            return if ss_res == 0.0 { 1.0 } else { 0.0 };
        }
        1.0 - ss_res / ss_tot
    }

    /// All metrics at once.
    ///
    /// # Errors
    /// Returns [`ForecastError::InvalidInput`] if the slices differ in length.
    pub fn calculate_all(
        y_true: &[f64],
        y_pred: &[f64],
    ) -> Result<RegressionMetrics, ForecastError> {
        if y_true.len() != y_pred.len() {
            return Err(ForecastError::InvalidInput(format!(
                "{} targets but {} predictions",
                y_true.len(),
                y_pred.len()
            )));
        }
        Ok(RegressionMetrics {
            mse: Self::mse(y_true, y_pred),
            rmse: Self::rmse(y_true, y_pred),
            mae: Self::mae(y_true, y_pred),
            r_squared: Self::r_squared(y_true, y_pred),
            n_samples: y_true.len(),
        })
    }
}

/// Regression metrics computed on one evaluation set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
    pub r_squared: f64,
    pub n_samples: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mse_perfect() {
        let y = vec![1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(Metrics::mse(&y, &y), 0.0);
    }

    #[test]
    fn test_mse_and_mae_constant_offset() {
        let y_true = vec![1.0, 2.0, 3.0, 4.0];
        let y_pred = vec![2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(Metrics::mse(&y_true, &y_pred), 1.0);
        assert_abs_diff_eq!(Metrics::mae(&y_true, &y_pred), 1.0);
        assert_abs_diff_eq!(Metrics::rmse(&y_true, &y_pred), 1.0);
    }

    #[test]
    fn test_mae_mixed_signs() {
        let y_true = vec![10.0, 20.0];
        let y_pred = vec![12.0, 14.0];
        assert_abs_diff_eq!(Metrics::mae(&y_true, &y_pred), 4.0);
    }

    #[test]
    fn test_r_squared_perfect_and_mean() {
        let y_true = vec![1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(Metrics::r_squared(&y_true, &y_true), 1.0);
        let mean = vec![2.5; 4];
        assert_abs_diff_eq!(Metrics::r_squared(&y_true, &mean), 0.0);
    }

    #[test]
    fn test_r_squared_can_be_negative() {
        let y_true = vec![1.0, 2.0, 3.0];
        let y_pred = vec![3.0, 2.0, 1.0];
        assert!(Metrics::r_squared(&y_true, &y_pred) < 0.0);
    }

    #[test]
    fn test_r_squared_constant_target() {
        let y_true = vec![5.0, 5.0];
        assert_eq!(Metrics::r_squared(&y_true, &[5.0, 5.0]), 1.0);
        assert_eq!(Metrics::r_squared(&y_true, &[4.0, 6.0]), 0.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(Metrics::mae(&[], &[]), 0.0);
        assert_eq!(Metrics::r_squared(&[], &[]), 0.0);
    }

    #[test]
    fn test_calculate_all() {
        let m = Metrics::calculate_all(&[1.0, 3.0], &[2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(m.mse, 0.5);
        assert_abs_diff_eq!(m.mae, 0.5);
        assert_abs_diff_eq!(m.rmse, 0.5f64.sqrt());
        assert_eq!(m.n_samples, 2);
    }

    #[test]
    fn test_calculate_all_length_mismatch() {
        assert!(Metrics::calculate_all(&[1.0], &[1.0, 2.0]).is_err());
    }
}
