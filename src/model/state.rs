use super::linear::LinearConfig;

/// State of a model that is **not yet trained**.
///
/// Used as the state parameter of [`LinearModel`](super::linear::LinearModel):
/// a `LinearModel<Unfitted>` holds its hyperparameters here and can be
/// fitted, but has no `predict` method.
#[derive(Clone, Debug, Default)]
pub struct Unfitted {
    pub(crate) config: LinearConfig,
}

/// A marker type indicating that a model has been **fully trained**.
///
/// A `Fitted` model contains only inference parameters: no learning rate,
/// regularization strength or other training hyperparameters travel with it
/// into a saved artifact.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fitted;
