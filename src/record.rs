//! Raw input records and popularity-index sanitizing.
//!
//! A [`MealRecord`] is what a caller knows about one service: the weekday, the
//! meal, the dish, and how popular the dish tends to be. Records are ephemeral;
//! they are encoded against a [`FeatureSchema`](crate::schema::FeatureSchema)
//! and thrown away.

use crate::error::ForecastError;
use log::warn;
use serde::{Deserialize, Serialize};

/// Popularity index used when the supplied one is missing, unparseable or out of range.
pub const DEFAULT_POPULARITY: f64 = 0.5;

/// The seven weekday names accepted as `day_of_week`.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One prediction request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub day_of_week: String,
    pub meal_type: String,
    pub food_item: String,
    /// Expected in `[0.0, 1.0]`.
    pub popularity_index: f64,
}

impl MealRecord {
    pub fn new(
        day_of_week: impl Into<String>,
        meal_type: impl Into<String>,
        food_item: impl Into<String>,
        popularity_index: f64,
    ) -> Self {
        Self {
            day_of_week: day_of_week.into(),
            meal_type: meal_type.into(),
            food_item: food_item.into(),
            popularity_index,
        }
    }

    /// Whether `day_of_week` is one of the seven weekday names (case-sensitive).
    pub fn has_known_weekday(&self) -> bool {
        WEEKDAYS.contains(&self.day_of_week.as_str())
    }
}

/// Result of sanitizing a user-supplied popularity index.
#[derive(Debug)]
pub struct Popularity {
    pub value: f64,
    /// Set when the supplied value was replaced by [`DEFAULT_POPULARITY`].
    pub warning: Option<ForecastError>,
}

/// Check that a popularity index lies in `[0.0, 1.0]`.
pub fn validate_popularity(value: f64) -> Result<f64, ForecastError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ForecastError::InvalidInput(format!(
            "popularity index should be between 0.0 and 1.0, got {}",
            value
        )))
    }
}

/// Parse a popularity index typed by a user, falling back to
/// [`DEFAULT_POPULARITY`] instead of failing.
///
/// Unparseable and out-of-range values both degrade to the default; the
/// replaced value is reported through [`Popularity::warning`] and logged.
pub fn sanitize_popularity(raw: &str) -> Popularity {
    let parsed = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ForecastError::InvalidInput(format!("'{}' is not a number", raw.trim())))
        .and_then(validate_popularity);

    match parsed {
        Ok(value) => Popularity {
            value,
            warning: None,
        },
        Err(err) => {
            warn!("{}; using default popularity index {}", err, DEFAULT_POPULARITY);
            Popularity {
                value: DEFAULT_POPULARITY,
                warning: Some(err),
            }
        }
    }
}
