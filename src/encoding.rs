//! One-hot encoding of meal records onto a fixed feature schema.
//!
//! Encoding is a pure function of `(record, schema)`: every categorical value
//! is looked up as `"<Field>_<value>"` in the schema's column index and the
//! matching slot is set to `1.0`; the popularity index is written to its own
//! column. Everything else stays `0.0`, so the output always has exactly the
//! schema's columns in the schema's order.
//!
//! # Unknown categories
//!
//! A value that never appeared in training has no column. Under
//! [`HandleUnknown::Ignore`] its block is left all-zero (no information) and
//! the value is reported in [`EncodedRecord::unseen`]; under
//! [`HandleUnknown::Error`] encoding fails with
//! [`ForecastError::UnknownCategory`].

use crate::error::ForecastError;
use crate::record::MealRecord;
use crate::schema::{CategoricalField, FeatureSchema, POPULARITY_COLUMN};
use log::warn;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Strategy for handling unknown categories during encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandleUnknown {
    /// Fail with [`ForecastError::UnknownCategory`].
    Error,
    /// Leave the field's one-hot block all-zero and report the value.
    #[default]
    Ignore,
}

/// A categorical value with no column in the schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnseenCategory {
    pub field: CategoricalField,
    pub value: String,
}

/// Dense feature vector laid out on a schema.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    columns: Arc<[String]>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Build a vector from explicit columns and values.
    ///
    /// # Errors
    /// Returns [`ForecastError::InvalidInput`] if the lengths differ.
    pub fn new(columns: Arc<[String]>, values: Vec<f64>) -> Result<Self, ForecastError> {
        if columns.len() != values.len() {
            return Err(ForecastError::InvalidInput(format!(
                "{} column names for {} values",
                columns.len(),
                values.len()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Lay out `values` on `schema`. Callers guarantee the length matches.
    pub(crate) fn from_schema(schema: &FeatureSchema, values: Vec<f64>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self {
            columns: schema.shared_columns(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub(crate) fn shares_columns_with(&self, schema: &FeatureSchema) -> bool {
        Arc::ptr_eq(&self.columns, &schema.shared_columns())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.values[i])
    }

    pub fn view(&self) -> ArrayView1<'_, f64> {
        ArrayView1::from(self.values.as_slice())
    }
}

/// Output of encoding one record.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedRecord {
    pub vector: FeatureVector,
    /// Categorical values that had no schema column.
    pub unseen: Vec<UnseenCategory>,
}

/// Encodes meal records against a fixed schema.
#[derive(Clone, Debug)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
    popularity_idx: Option<usize>,
    handle_unknown: HandleUnknown,
}

impl FeatureEncoder {
    pub fn new(schema: FeatureSchema) -> Self {
        let popularity_idx = schema.index_of(POPULARITY_COLUMN);
        Self {
            schema,
            popularity_idx,
            handle_unknown: HandleUnknown::default(),
        }
    }

    /// Set the strategy for handling unknown categories.
    pub fn with_handle_unknown(mut self, strategy: HandleUnknown) -> Self {
        self.handle_unknown = strategy;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn handle_unknown(&self) -> HandleUnknown {
        self.handle_unknown
    }

    /// Encode a single record.
    pub fn encode(&self, record: &MealRecord) -> Result<EncodedRecord, ForecastError> {
        let mut values = vec![0.0f64; self.schema.len()];
        let unseen = self.encode_into(record, &mut values)?;
        for u in &unseen {
            warn!(
                "{} '{}' was not seen during training; its features are left at zero",
                u.field, u.value
            );
        }
        Ok(EncodedRecord {
            vector: FeatureVector::from_schema(&self.schema, values),
            unseen,
        })
    }

    /// Encode many records into a `(n_records, n_features)` matrix.
    ///
    /// Unknown categories follow the encoder's policy but are not logged
    /// individually.
    pub fn encode_batch(&self, records: &[MealRecord]) -> Result<Array2<f64>, ForecastError> {
        let mut matrix = Array2::<f64>::zeros((records.len(), self.schema.len()));
        for (record, mut row) in records.iter().zip(matrix.rows_mut()) {
            let slice = row.as_slice_mut().ok_or_else(|| {
                ForecastError::InvalidInput("feature matrix row is not contiguous".to_string())
            })?;
            self.encode_into(record, slice)?;
        }
        Ok(matrix)
    }

    fn encode_into(
        &self,
        record: &MealRecord,
        out: &mut [f64],
    ) -> Result<Vec<UnseenCategory>, ForecastError> {
        debug_assert_eq!(out.len(), self.schema.len());

        if let Some(idx) = self.popularity_idx {
            out[idx] = record.popularity_index;
        }

        let mut unseen = Vec::new();
        for field in CategoricalField::ALL {
            let value = field.value_of(record);
            match self.schema.index_of(&field.column(value)) {
                Some(idx) => out[idx] = 1.0,
                None => match self.handle_unknown {
                    HandleUnknown::Error => {
                        return Err(ForecastError::UnknownCategory {
                            field: field.name().to_string(),
                            value: value.to_string(),
                        });
                    }
                    HandleUnknown::Ignore => unseen.push(UnseenCategory {
                        field,
                        value: value.to_string(),
                    }),
                },
            }
        }
        Ok(unseen)
    }
}
