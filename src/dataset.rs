//! Historical attendance data loader.
//!
//! Reads CSV files with a header row containing at least:
//! `Day_of_Week, Meal_Type, Food_Item, Popularity_Index, Expected_Students`.
//! Extra columns are ignored.

use crate::error::ForecastError;
use crate::record::MealRecord;
use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Name of the regression target column.
pub const TARGET_COLUMN: &str = "Expected_Students";

/// One row of the historical attendance file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(rename = "Day_of_Week")]
    pub day_of_week: String,
    #[serde(rename = "Meal_Type")]
    pub meal_type: String,
    #[serde(rename = "Food_Item")]
    pub food_item: String,
    #[serde(rename = "Popularity_Index")]
    pub popularity_index: f64,
    #[serde(rename = "Expected_Students")]
    pub expected_students: f64,
}

impl TrainingRecord {
    fn into_parts(self) -> (MealRecord, f64) {
        (
            MealRecord::new(
                self.day_of_week,
                self.meal_type,
                self.food_item,
                self.popularity_index,
            ),
            self.expected_students,
        )
    }
}

/// Meal records paired with their observed attendance.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceDataset {
    records: Vec<MealRecord>,
    targets: Vec<f64>,
}

impl AttendanceDataset {
    /// Load a dataset from a CSV file.
    ///
    /// # Errors
    /// Returns [`ForecastError::Dataset`] if the file cannot be opened, a row
    /// cannot be parsed, a value is non-finite, or there are no rows.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ForecastError::Dataset(format!("cannot open {}: {}", path.display(), e))
        })?;
        let dataset = Self::from_reader(BufReader::new(file))?;
        info!("loaded {} rows from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse CSV data from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ForecastError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let mut records = Vec::new();
        let mut targets = Vec::new();
        for (row, result) in rdr.deserialize::<TrainingRecord>().enumerate() {
            let record = result?;
            if !record.popularity_index.is_finite() || !record.expected_students.is_finite() {
                return Err(ForecastError::Dataset(format!(
                    "row {} contains a non-finite number",
                    row + 1
                )));
            }
            let (meal, target) = record.into_parts();
            records.push(meal);
            targets.push(target);
        }
        Self::from_records(records, targets)
    }

    /// Build a dataset from records and their targets.
    pub fn from_records(records: Vec<MealRecord>, targets: Vec<f64>) -> Result<Self, ForecastError> {
        if records.len() != targets.len() {
            return Err(ForecastError::Dataset(format!(
                "{} records but {} targets",
                records.len(),
                targets.len()
            )));
        }
        if records.is_empty() {
            return Err(ForecastError::Dataset("dataset has no rows".to_string()));
        }
        Ok(Self { records, targets })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MealRecord] {
        &self.records
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    fn subset(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }

    /// Shuffle with `seed` and split into `(train, test)`.
    ///
    /// The test set gets `ceil(len * test_fraction)` rows. A fraction of 0.0
    /// returns an empty test set.
    ///
    /// # Errors
    /// Returns [`ForecastError::Training`] if the fraction is outside
    /// `[0.0, 1.0)` or leaves no training rows.
    pub fn split(&self, test_fraction: f64, seed: u64) -> Result<(Self, Self), ForecastError> {
        if !(0.0..1.0).contains(&test_fraction) {
            return Err(ForecastError::Training(format!(
                "test fraction must be in [0.0, 1.0), got {}",
                test_fraction
            )));
        }
        let n = self.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        if n_test >= n {
            return Err(ForecastError::Training(format!(
                "{} rows are too few to hold out {:.0}% for testing",
                n,
                test_fraction * 100.0
            )));
        }
        if test_fraction > 0.0 && n_test < 2 {
            warn!(
                "test split has only {} row(s); evaluation metrics will be unreliable",
                n_test
            );
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok((self.subset(train_idx), self.subset(test_idx)))
    }
}
