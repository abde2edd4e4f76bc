//! Regression tree storage (SoA) and CART-style growing.
//!
//! Nodes are stored in parallel arrays indexed by node id. The root is node 0
//! and children are always allocated after their parent, so a valid tree is
//! acyclic by construction and traversal from the root always terminates.
//!
//! A sample goes left when `x[feature] <= threshold`, right otherwise (NaN
//! goes right).

use ndarray::{ArrayView1, ArrayView2};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node id type.
pub type NodeId = u32;

/// `split_feature` marker for leaf nodes.
const LEAF: u32 = u32::MAX;

/// Structural validation errors for [`RegressionTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeValidationError {
    /// Tree has no nodes.
    EmptyTree,
    /// Node arrays have different lengths.
    ArrayLenMismatch { n_nodes: usize },
    /// A child pointer is out of bounds or not after its parent.
    InvalidChild { node: NodeId, child: NodeId },
    /// A split references a feature the model does not have.
    FeatureOutOfRange { node: NodeId, feature: u32, n_features: usize },
    /// A threshold or leaf value is NaN or infinite.
    NonFiniteValue { node: NodeId },
}

impl fmt::Display for TreeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeValidationError::EmptyTree => write!(f, "tree has no nodes"),
            TreeValidationError::ArrayLenMismatch { n_nodes } => {
                write!(f, "node arrays disagree on length (expected {})", n_nodes)
            }
            TreeValidationError::InvalidChild { node, child } => {
                write!(f, "node {} has invalid child {}", node, child)
            }
            TreeValidationError::FeatureOutOfRange {
                node,
                feature,
                n_features,
            } => write!(
                f,
                "node {} splits on feature {} but the model has {} features",
                node, feature, n_features
            ),
            TreeValidationError::NonFiniteValue { node } => {
                write!(f, "node {} holds a non-finite value", node)
            }
        }
    }
}

impl std::error::Error for TreeValidationError {}

/// Immutable regression tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    split_feature: Vec<u32>,
    threshold: Vec<f64>,
    left: Vec<NodeId>,
    right: Vec<NodeId>,
    /// Mean target of the samples that reached the node.
    value: Vec<f64>,
    n_samples: Vec<u32>,
}

impl RegressionTree {
    fn with_root() -> Self {
        let mut tree = Self {
            split_feature: Vec::new(),
            threshold: Vec::new(),
            left: Vec::new(),
            right: Vec::new(),
            value: Vec::new(),
            n_samples: Vec::new(),
        };
        tree.push_node();
        tree
    }

    fn push_node(&mut self) -> NodeId {
        let id = self.split_feature.len() as NodeId;
        self.split_feature.push(LEAF);
        self.threshold.push(0.0);
        self.left.push(0);
        self.right.push(0);
        self.value.push(0.0);
        self.n_samples.push(0);
        id
    }

    /// Single-leaf tree predicting `value`.
    pub fn constant(value: f64) -> Self {
        let mut tree = Self::with_root();
        tree.value[0] = value;
        tree
    }

    pub fn n_nodes(&self) -> usize {
        self.split_feature.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.split_feature.iter().filter(|&&f| f == LEAF).count()
    }

    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.split_feature[node as usize] == LEAF
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        let mut depth = vec![0usize; self.n_nodes()];
        let mut max_depth = 0;
        // Children come after parents, so a forward pass sees parents first.
        for node in 0..self.n_nodes() {
            if self.split_feature[node] != LEAF {
                let d = depth[node] + 1;
                depth[self.left[node] as usize] = d;
                depth[self.right[node] as usize] = d;
                max_depth = max_depth.max(d);
            }
        }
        max_depth
    }

    /// Find the leaf a sample lands in.
    #[inline]
    pub fn traverse_to_leaf(&self, row: ArrayView1<'_, f64>) -> NodeId {
        let mut node = 0usize;
        while self.split_feature[node] != LEAF {
            let x = row[self.split_feature[node] as usize];
            node = if x <= self.threshold[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
        }
        node as NodeId
    }

    #[inline]
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.value[self.traverse_to_leaf(row) as usize]
    }

    /// Validate structural invariants for a model with `n_features` inputs.
    pub fn validate(&self, n_features: usize) -> Result<(), TreeValidationError> {
        let n = self.split_feature.len();
        if n == 0 {
            return Err(TreeValidationError::EmptyTree);
        }
        if [
            self.threshold.len(),
            self.left.len(),
            self.right.len(),
            self.value.len(),
            self.n_samples.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(TreeValidationError::ArrayLenMismatch { n_nodes: n });
        }

        for node in 0..n {
            let id = node as NodeId;
            if !self.value[node].is_finite() {
                return Err(TreeValidationError::NonFiniteValue { node: id });
            }
            let feature = self.split_feature[node];
            if feature == LEAF {
                continue;
            }
            if feature as usize >= n_features {
                return Err(TreeValidationError::FeatureOutOfRange {
                    node: id,
                    feature,
                    n_features,
                });
            }
            if self.threshold[node].is_nan() {
                return Err(TreeValidationError::NonFiniteValue { node: id });
            }
            for child in [self.left[node], self.right[node]] {
                if child as usize >= n || child as usize <= node {
                    return Err(TreeValidationError::InvalidChild { node: id, child });
                }
            }
        }
        Ok(())
    }
}

/// Growth limits for a single tree.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` means all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
}

/// Grows one tree over a (possibly bootstrapped) list of sample indices.
pub(crate) struct TreeGrower<'x, 'a> {
    x: ArrayView2<'x, f64>,
    y: &'a [f64],
    params: &'a TreeParams,
}

impl<'x, 'a> TreeGrower<'x, 'a> {
    pub(crate) fn new(x: ArrayView2<'x, f64>, y: &'a [f64], params: &'a TreeParams) -> Self {
        Self { x, y, params }
    }

    pub(crate) fn grow<R: Rng>(&self, samples: Vec<usize>, rng: &mut R) -> RegressionTree {
        let mut tree = RegressionTree::with_root();
        let mut stack: Vec<(NodeId, Vec<usize>, usize)> = vec![(0, samples, 0)];

        while let Some((node, samples, depth)) = stack.pop() {
            let idx = node as usize;
            tree.value[idx] = self.mean(&samples);
            tree.n_samples[idx] = samples.len() as u32;

            let depth_ok = self.params.max_depth.map_or(true, |d| depth < d);
            if !depth_ok || samples.len() < self.params.min_samples_split.max(2) {
                continue;
            }
            let Some(split) = self.find_split(&samples, rng) else {
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .iter()
                .partition(|&&s| self.x[[s, split.feature]] <= split.threshold);

            let left = tree.push_node();
            let right = tree.push_node();
            tree.split_feature[idx] = split.feature as u32;
            tree.threshold[idx] = split.threshold;
            tree.left[idx] = left;
            tree.right[idx] = right;

            stack.push((right, right_samples, depth + 1));
            stack.push((left, left_samples, depth + 1));
        }

        tree
    }

    fn mean(&self, samples: &[usize]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|&s| self.y[s]).sum::<f64>() / samples.len() as f64
    }

    /// Best variance-reducing split, maximizing `S_l^2 / n_l + S_r^2 / n_r`.
    fn find_split<R: Rng>(&self, samples: &[usize], rng: &mut R) -> Option<Split> {
        let n = samples.len();
        let n_features = self.x.ncols();
        let total: f64 = samples.iter().map(|&s| self.y[s]).sum();
        let parent_score = total * total / n as f64;
        let min_leaf = self.params.min_samples_leaf.max(1);

        let features: Vec<usize> = match self.params.max_features {
            Some(k) if k < n_features => {
                let mut chosen = index::sample(rng, n_features, k.max(1)).into_vec();
                chosen.sort_unstable();
                chosen
            }
            _ => (0..n_features).collect(),
        };

        let mut best: Option<(f64, Split)> = None;
        let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

        for feature in features {
            pairs.clear();
            pairs.extend(samples.iter().map(|&s| (self.x[[s, feature]], self.y[s])));
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 0..n - 1 {
                left_sum += pairs[i].1;
                let (lo, hi) = (pairs[i].0, pairs[i + 1].0);
                if lo == hi {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some((score, Split { feature, threshold }));
                }
            }
        }

        let min_gain = 1e-10 * parent_score.abs().max(1.0);
        best.filter(|(score, _)| score - parent_score > min_gain)
            .map(|(_, split)| split)
    }
}
