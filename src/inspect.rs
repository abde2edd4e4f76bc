//! Human- and machine-readable summaries of a model artifact.

use crate::artifact::TrainedModelArtifact;
use crate::encoding::FeatureVector;
use crate::error::ForecastError;
use crate::metrics::RegressionMetrics;
use crate::model::{FittedModel, ModelKind};
use crate::predictor::{to_headcount, Predictor};
use crate::schema::{CategoricalField, FeatureSchema, SCHEMA_VERSION};
use crate::serialization::FORMAT_VERSION;
use serde::Serialize;
use std::fmt::{self, Write as _};
use std::sync::Arc;

/// Staple dishes switched on in the example row.
pub const STAPLE_FOODS: [&str; 4] = ["Rice", "Garri", "Bread", "Yam"];

/// Structural summary of the fitted model.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModelSummary {
    RandomForest {
        n_trees: usize,
        total_nodes: usize,
        max_depth: usize,
    },
    Linear {
        coefficients: Vec<(String, f64)>,
        intercept: f64,
    },
}

/// Everything `foodcast inspect` reports.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArtifactSummary {
    pub format_version: u32,
    pub schema_version: u32,
    pub crate_version: String,
    pub model_kind: ModelKind,
    pub features: Vec<String>,
    pub model: ModelSummary,
    pub train_rows: usize,
    pub test_rows: usize,
    pub test_metrics: Option<RegressionMetrics>,
    pub example_input: Vec<(String, f64)>,
    pub example_raw: f64,
    pub example_prediction: u32,
}

/// Example row: popularity 0.7, any `Expected*` column 120, Monday, Lunch,
/// and every staple dish present in the schema switched on.
pub fn example_vector(schema: &FeatureSchema) -> FeatureVector {
    let day = CategoricalField::DayOfWeek.column("Monday");
    let meal = CategoricalField::MealType.column("Lunch");
    let food_prefix = format!("{}_", CategoricalField::FoodItem.name());

    let values = schema
        .columns()
        .iter()
        .map(|c| {
            if c.contains("Expected") {
                120.0
            } else if c.contains("Popularity") {
                0.7
            } else if *c == day || *c == meal {
                1.0
            } else if c.starts_with(&food_prefix) && STAPLE_FOODS.iter().any(|s| c.contains(s)) {
                1.0
            } else {
                0.0
            }
        })
        .collect();

    FeatureVector::from_schema(schema, values)
}

impl ArtifactSummary {
    pub fn from_artifact(artifact: Arc<TrainedModelArtifact>) -> Result<Self, ForecastError> {
        let schema = artifact.schema();
        let metadata = artifact.metadata();

        let model = match artifact.model() {
            FittedModel::RandomForest(forest) => ModelSummary::RandomForest {
                n_trees: forest.n_trees(),
                total_nodes: forest.trees().iter().map(|t| t.n_nodes()).sum(),
                max_depth: forest.trees().iter().map(|t| t.depth()).max().unwrap_or(0),
            },
            FittedModel::Linear(linear) => ModelSummary::Linear {
                coefficients: schema
                    .columns()
                    .iter()
                    .cloned()
                    .zip(linear.coefficients().iter().copied())
                    .collect(),
                intercept: linear.intercept(),
            },
        };

        let example = example_vector(schema);
        let example_raw = artifact.regress(example.view());
        let example_prediction = Predictor::new(Arc::clone(&artifact)).predict_vector(&example)?;
        debug_assert_eq!(example_prediction, to_headcount(example_raw));

        Ok(Self {
            format_version: FORMAT_VERSION,
            schema_version: schema.version(),
            crate_version: metadata.crate_version.clone(),
            model_kind: artifact.model_kind(),
            features: schema.columns().to_vec(),
            model,
            train_rows: metadata.train_rows,
            test_rows: metadata.test_rows,
            test_metrics: metadata.test_metrics,
            example_input: example
                .columns()
                .iter()
                .cloned()
                .zip(example.values().iter().copied())
                .collect(),
            example_raw,
            example_prediction,
        })
    }

    pub fn to_json(&self) -> Result<String, ForecastError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ArtifactSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Artifact format v{} (schema v{}, reader supports v{}), written by foodcast {}",
            self.format_version, self.schema_version, SCHEMA_VERSION, self.crate_version
        )?;
        writeln!(f, "Model: {}", self.model_kind)?;
        match &self.model {
            ModelSummary::RandomForest {
                n_trees,
                total_nodes,
                max_depth,
            } => writeln!(
                f,
                "  {} trees, {} nodes, max depth {}",
                n_trees, total_nodes, max_depth
            )?,
            ModelSummary::Linear {
                coefficients,
                intercept,
            } => {
                writeln!(f, "  intercept: {:.4}", intercept)?;
                for (name, w) in coefficients {
                    writeln!(f, "  {:<32} {:>10.4}", name, w)?;
                }
            }
        }
        writeln!(f, "Features ({}):", self.features.len())?;
        for name in &self.features {
            writeln!(f, "  {}", name)?;
        }
        writeln!(
            f,
            "Trained on {} rows, evaluated on {}",
            self.train_rows, self.test_rows
        )?;
        if let Some(m) = &self.test_metrics {
            writeln!(
                f,
                "  MAE {:.3}  RMSE {:.3}  R² {:.4}",
                m.mae, m.rmse, m.r_squared
            )?;
        }

        let mut active = String::new();
        for (name, value) in self.example_input.iter().filter(|(_, v)| *v != 0.0) {
            if !active.is_empty() {
                active.push_str(", ");
            }
            write!(active, "{}={}", name, value)?;
        }
        writeln!(f, "Example input: {}", active)?;
        write!(
            f,
            "Example prediction: {:.2} -> {} students",
            self.example_raw, self.example_prediction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactMetadata;
    use crate::model::{Fitted, LinearModel, LinearParams};

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            [
                "Popularity_Index",
                "Day_of_Week_Monday",
                "Day_of_Week_Tuesday",
                "Meal_Type_Lunch",
                "Meal_Type_Supper",
                "Food_Item_Bread & Egg",
                "Food_Item_Jollof Rice",
                "Food_Item_Pizza",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_example_vector_layout() {
        let v = example_vector(&schema());
        assert_eq!(v.values(), &[0.7, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_example_vector_expected_columns() {
        let schema = FeatureSchema::new(vec![
            "Expected_Students_Last_Week".to_string(),
            "Popularity_Index".to_string(),
        ])
        .unwrap();
        assert_eq!(example_vector(&schema).values(), &[120.0, 0.7]);
    }

    #[test]
    fn test_summary_linear() -> Result<(), Box<dyn std::error::Error>> {
        let model = LinearModel::<Fitted>::from_params(LinearParams {
            weights: vec![100.0, 10.0, 0.0, 20.0, 0.0, 5.0, 5.0, 0.0],
            bias: 1.0,
        })?;
        let artifact = TrainedModelArtifact::new(
            schema(),
            model.into(),
            ArtifactMetadata::new(ModelKind::Linear, 50, 10),
        )?;
        let summary = ArtifactSummary::from_artifact(Arc::new(artifact))?;

        // 70 + 10 + 20 + 5 + 5 + 1
        assert_eq!(summary.example_prediction, 111);
        assert_eq!(summary.features.len(), 8);
        match &summary.model {
            ModelSummary::Linear {
                coefficients,
                intercept,
            } => {
                assert_eq!(coefficients[0], ("Popularity_Index".to_string(), 100.0));
                assert_eq!(*intercept, 1.0);
            }
            other => panic!("expected linear summary, got {:?}", other),
        }

        let text = summary.to_string();
        assert!(text.contains("Model: linear"));
        assert!(text.contains("Example prediction"));

        let json: serde_json::Value = serde_json::from_str(&summary.to_json()?)?;
        assert_eq!(json["model"]["kind"], "linear");
        assert_eq!(json["example_prediction"], 111);
        Ok(())
    }
}
