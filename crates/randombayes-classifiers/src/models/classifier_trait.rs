use ndarray::ArrayView1;

use crate::dataset::Dataset;

/// A probabilistic classifier trained as one ensemble member.
///
/// The learner sees a projected dataset: its own schema, with the class column
/// wherever the projection put it. Queries are rows of that same projected schema.
pub trait BaseLearner: Send + Sync {
    /// Train on `data`. Fails when the data has no usable class attribute.
    fn fit(&mut self, data: &Dataset) -> anyhow::Result<()>;

    /// Class probabilities for one projected instance, one entry per class value.
    fn distribution(&self, instance: ArrayView1<'_, f64>) -> anyhow::Result<Vec<f64>>;

    /// Whether [`BaseLearner::set_seed`] has any effect.
    fn supports_seeding(&self) -> bool {
        false
    }

    fn set_seed(&mut self, _seed: u64) {}

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}

/// Produces untrained learners, one per ensemble member.
pub trait LearnerFactory: Send + Sync {
    fn create(&self) -> Box<dyn BaseLearner>;
}

impl<F> LearnerFactory for F
where
    F: Fn() -> Box<dyn BaseLearner> + Send + Sync,
{
    fn create(&self) -> Box<dyn BaseLearner> {
        self()
    }
}
