use crate::dataset::{Dataset, FeatureMask};

/// Scores attribute subsets of one fixed dataset.
///
/// `evaluate` must be deterministic: the same mask always yields the same score.
pub trait MeritOracle {
    fn evaluate(&self, mask: &FeatureMask) -> anyhow::Result<f64>;
}

/// Prepares a [`MeritOracle`] for a dataset (typically a member's bootstrap sample).
pub trait SubsetEvaluator: Send + Sync {
    fn build(&self, data: &Dataset) -> anyhow::Result<Box<dyn MeritOracle>>;

    fn name(&self) -> &str {
        "subset-evaluator"
    }
}

impl<F> MeritOracle for F
where
    F: Fn(&FeatureMask) -> anyhow::Result<f64>,
{
    fn evaluate(&self, mask: &FeatureMask) -> anyhow::Result<f64> {
        self(mask)
    }
}
