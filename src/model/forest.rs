//! Random forest regression: bootstrap-aggregated regression trees.
//!
//! Every tree gets its own RNG seeded from `seed + tree_index`, so the fitted
//! forest is identical no matter how rayon schedules the work.

use super::tree::{RegressionTree, TreeGrower, TreeParams, TreeValidationError};
use super::Regressor;
use crate::error::ForecastError;
use log::{debug, info};
use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Forest hyperparameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered at each split; `None` considers all of them.
    pub max_features: Option<usize>,
    /// Draw a bootstrap sample per tree instead of using every row.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, n: usize) -> Self {
        self.min_samples_leaf = n;
        self
    }

    pub fn with_max_features(mut self, n: Option<usize>) -> Self {
        self.max_features = n;
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn tree_params(&self) -> TreeParams {
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }

    fn validate(&self) -> Result<(), ForecastError> {
        if self.n_estimators == 0 {
            return Err(ForecastError::Training(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForecastError::Training(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ForecastError::Training(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ForecastError::Training(
                "max_features must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Unfitted random forest.
#[derive(Clone, Debug, Default)]
pub struct RandomForestRegressor {
    config: ForestConfig,
}

impl RandomForestRegressor {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit the forest on `x` (`n_samples x n_features`) and targets `y`.
    ///
    /// # Errors
    /// Returns [`ForecastError::Training`] for empty or mismatched inputs,
    /// non-finite values, or invalid hyperparameters.
    pub fn fit(
        &self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<RandomForest, ForecastError> {
        self.config.validate()?;
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 || n_features == 0 {
            return Err(ForecastError::Training(format!(
                "cannot fit a forest on a {}x{} matrix",
                n_samples, n_features
            )));
        }
        if y.len() != n_samples {
            return Err(ForecastError::Training(format!(
                "X has {} rows but y has {} values",
                n_samples,
                y.len()
            )));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(ForecastError::Training(
                "training data contains NaN or infinite values".to_string(),
            ));
        }

        let targets = y.to_vec();
        let params = self.config.tree_params();
        let grower = TreeGrower::new(x.reborrow(), &targets, &params);
        let ForestConfig {
            n_estimators,
            bootstrap,
            seed,
            ..
        } = self.config;

        info!(
            "fitting random forest: {} trees on {} samples x {} features",
            n_estimators, n_samples, n_features
        );

        let trees: Vec<RegressionTree> = (0..n_estimators)
            .into_par_iter()
            .map(|idx| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(idx as u64));
                let samples: Vec<usize> = if bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                grower.grow(samples, &mut rng)
            })
            .collect();

        let total_leaves: usize = trees.iter().map(RegressionTree::n_leaves).sum();
        debug!(
            "forest fitted: {} leaves total, max depth {}",
            total_leaves,
            trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
        );

        Ok(RandomForest { trees, n_features })
    }
}

/// Fitted random forest. Predicts the mean of its trees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    /// Check every tree against the forest's feature count.
    pub fn validate(&self) -> Result<(), ForestValidationError> {
        if self.trees.is_empty() {
            return Err(ForestValidationError::NoTrees);
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|source| ForestValidationError::Tree { idx, source })?;
        }
        Ok(())
    }
}

/// Structural validation errors for [`RandomForest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForestValidationError {
    NoTrees,
    Tree {
        idx: usize,
        source: TreeValidationError,
    },
}

impl std::fmt::Display for ForestValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForestValidationError::NoTrees => write!(f, "forest has no trees"),
            ForestValidationError::Tree { idx, source } => write!(f, "tree {}: {}", idx, source),
        }
    }
}

impl std::error::Error for ForestValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ForestValidationError::NoTrees => None,
            ForestValidationError::Tree { source, .. } => Some(source),
        }
    }
}

impl Regressor for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }
}
