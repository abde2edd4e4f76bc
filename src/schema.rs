//! Feature schema: the ordered column names a model was trained against.
//!
//! The schema is captured when a model is fitted and stored inside the model
//! artifact, so inference never has to guess which columns the model expects.
//! Column layout follows dummy encoding: the numeric column comes first, then
//! each categorical field's values, sorted, as `"<Field>_<value>"`.

use crate::error::ForecastError;
use crate::record::MealRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Current schema layout version. Bumped whenever column naming changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Column name of the numeric popularity feature.
pub const POPULARITY_COLUMN: &str = "Popularity_Index";

/// Categorical input fields, in encoding order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    DayOfWeek,
    MealType,
    FoodItem,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::DayOfWeek,
        CategoricalField::MealType,
        CategoricalField::FoodItem,
    ];

    /// Field name used as the one-hot column prefix.
    pub fn name(self) -> &'static str {
        match self {
            CategoricalField::DayOfWeek => "Day_of_Week",
            CategoricalField::MealType => "Meal_Type",
            CategoricalField::FoodItem => "Food_Item",
        }
    }

    /// The record's value for this field.
    pub fn value_of(self, record: &MealRecord) -> &str {
        match self {
            CategoricalField::DayOfWeek => &record.day_of_week,
            CategoricalField::MealType => &record.meal_type,
            CategoricalField::FoodItem => &record.food_item,
        }
    }

    /// One-hot column name for `value`.
    pub fn column(self, value: &str) -> String {
        format!("{}_{}", self.name(), value)
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serializable representation of a [`FeatureSchema`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchemaParams {
    pub version: u32,
    pub columns: Vec<String>,
}

/// Ordered, immutable list of feature columns with a precomputed name lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "FeatureSchemaParams", into = "FeatureSchemaParams")]
pub struct FeatureSchema {
    version: u32,
    columns: Arc<[String]>,
    lookup: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Build a schema from an explicit column list.
    ///
    /// # Errors
    /// Returns [`ForecastError::InvalidInput`] if the list is empty or contains
    /// duplicate names.
    pub fn new(columns: Vec<String>) -> Result<Self, ForecastError> {
        Self::with_version(SCHEMA_VERSION, columns)
    }

    fn with_version(version: u32, columns: Vec<String>) -> Result<Self, ForecastError> {
        if columns.is_empty() {
            return Err(ForecastError::InvalidInput(
                "feature schema must have at least one column".to_string(),
            ));
        }
        let mut lookup = HashMap::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            if lookup.insert(name.clone(), idx).is_some() {
                return Err(ForecastError::InvalidInput(format!(
                    "duplicate feature column '{}'",
                    name
                )));
            }
        }
        Ok(Self {
            version,
            columns: columns.into(),
            lookup,
        })
    }

    /// Derive the schema from training records.
    ///
    /// Produces `Popularity_Index` followed by the sorted distinct values of
    /// each [`CategoricalField`], in field order.
    pub fn from_records<'a, I>(records: I) -> Result<Self, ForecastError>
    where
        I: IntoIterator<Item = &'a MealRecord>,
    {
        let mut seen: [BTreeSet<&'a str>; 3] = Default::default();
        let mut n_records = 0usize;
        for record in records {
            for (slot, field) in seen.iter_mut().zip(CategoricalField::ALL) {
                slot.insert(field.value_of(record));
            }
            n_records += 1;
        }
        if n_records == 0 {
            return Err(ForecastError::Training(
                "cannot derive a feature schema from zero records".to_string(),
            ));
        }

        let mut columns = vec![POPULARITY_COLUMN.to_string()];
        for (values, field) in seen.iter().zip(CategoricalField::ALL) {
            columns.extend(values.iter().map(|v| field.column(v)));
        }
        Self::new(columns)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Shared handle to the column list, attached to encoded vectors.
    pub fn shared_columns(&self) -> Arc<[String]> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column, if present.
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.lookup.get(column).copied()
    }

    /// Whether two schemas describe the same columns in the same order.
    pub fn same_columns(&self, columns: &[String]) -> bool {
        self.columns.len() == columns.len()
            && self.columns.iter().zip(columns).all(|(a, b)| a == b)
    }

    /// Describe how `columns` deviates from this schema.
    pub fn describe_mismatch(&self, columns: &[String]) -> String {
        if self.columns.len() != columns.len() {
            return format!(
                "column count differs: schema has {}, vector has {}",
                self.columns.len(),
                columns.len()
            );
        }
        let expected: HashSet<&String> = self.columns.iter().collect();
        match columns.iter().find(|c| !expected.contains(c)) {
            Some(extra) => format!("column '{}' is not part of the schema", extra),
            None => "columns are in a different order".to_string(),
        }
    }
}

impl PartialEq for FeatureSchema {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version && self.same_columns(&other.columns)
    }
}

impl TryFrom<FeatureSchemaParams> for FeatureSchema {
    type Error = ForecastError;

    fn try_from(params: FeatureSchemaParams) -> Result<Self, Self::Error> {
        if params.version > SCHEMA_VERSION {
            return Err(ForecastError::Serialization(format!(
                "feature schema version {} is newer than supported version {}",
                params.version, SCHEMA_VERSION
            )));
        }
        Self::with_version(params.version, params.columns)
    }
}

impl From<FeatureSchema> for FeatureSchemaParams {
    fn from(schema: FeatureSchema) -> Self {
        Self {
            version: schema.version,
            columns: schema.columns.to_vec(),
        }
    }
}
