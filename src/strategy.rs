//! Serving-strategy calculation: portions to prepare and a waste-risk label.

use crate::error::ForecastError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Extra share of portions prepared on top of the prediction.
pub const DEFAULT_BUFFER_RATIO: f64 = 0.07;

/// Buffer ratios up to this value are [`RiskLevel::Low`].
pub const LOW_RISK_MAX_BUFFER: f64 = 0.05;
/// Buffer ratios up to this value (and above the low bound) are [`RiskLevel::Medium`].
pub const MEDIUM_RISK_MAX_BUFFER: f64 = 0.10;

/// Food-waste risk label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        })
    }
}

/// Portions to prepare and the associated waste risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingStrategy {
    pub portions: u64,
    pub risk: RiskLevel,
}

/// Risk label for a buffer ratio.
///
/// The label depends on the ratio alone, not on the predicted headcount.
pub fn risk_for_buffer(buffer_ratio: f64) -> RiskLevel {
    if buffer_ratio <= LOW_RISK_MAX_BUFFER {
        RiskLevel::Low
    } else if buffer_ratio <= MEDIUM_RISK_MAX_BUFFER {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Decide how many portions to prepare for a predicted headcount.
///
/// `portions = floor(predicted_students * (1 + buffer_ratio))`, never below zero.
///
/// # Arguments
///
/// * `predicted_students` - Headcount from the predictor
/// * `buffer_ratio` - Extra share of portions, e.g. `0.07` for 7%
///
/// # Returns
///
/// The portion count and a waste-risk label that depends on `buffer_ratio` only
///
/// # Examples
///
/// ```
/// use foodcast::{compute_serving_strategy, RiskLevel};
///
/// let strategy = compute_serving_strategy(100, 0.07);
/// assert_eq!(strategy.portions, 107);
/// assert_eq!(strategy.risk, RiskLevel::Medium);
/// ```
pub fn compute_serving_strategy(predicted_students: u32, buffer_ratio: f64) -> ServingStrategy {
    let scaled = (f64::from(predicted_students) * (1.0 + buffer_ratio)).floor();
    // Float-to-int casts saturate; NaN becomes 0.
    let portions = scaled.max(0.0) as u64;
    ServingStrategy {
        portions,
        risk: risk_for_buffer(buffer_ratio),
    }
}

/// A validated buffer ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ServingPolicy {
    buffer_ratio: f64,
}

impl Default for ServingPolicy {
    fn default() -> Self {
        Self {
            buffer_ratio: DEFAULT_BUFFER_RATIO,
        }
    }
}

impl ServingPolicy {
    /// # Errors
    /// Returns [`ForecastError::InvalidInput`] for a negative or non-finite ratio.
    pub fn new(buffer_ratio: f64) -> Result<Self, ForecastError> {
        if !buffer_ratio.is_finite() || buffer_ratio < 0.0 {
            return Err(ForecastError::InvalidInput(format!(
                "buffer ratio must be a non-negative number, got {}",
                buffer_ratio
            )));
        }
        Ok(Self { buffer_ratio })
    }

    pub fn buffer_ratio(&self) -> f64 {
        self.buffer_ratio
    }

    pub fn apply(&self, predicted_students: u32) -> ServingStrategy {
        compute_serving_strategy(predicted_students, self.buffer_ratio)
    }
}
