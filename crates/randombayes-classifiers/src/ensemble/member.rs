use ndarray::ArrayView1;
use rand::Rng;

use crate::config::EnsembleConfig;
use crate::dataset::{Dataset, Projection};
use crate::ensemble::Components;
use crate::error::Result;
use crate::feature_selection::StochasticSelector;
use crate::models::BaseLearner;

/// One trained learner plus everything needed to feed it the right columns.
pub struct EnsembleMember {
    index: usize,
    seed: u64,
    bootstrap_rows: Vec<usize>,
    selected: Vec<usize>,
    projection: Projection,
    learner: Box<dyn BaseLearner>,
}

impl EnsembleMember {
    /// Sample, select, project and fit one member.
    ///
    /// `seed` drives the bootstrap draw (and the learner, when it accepts one);
    /// `rng` supplies the roulette draws of the feature selection.
    pub(crate) fn train<R>(
        index: usize,
        seed: u64,
        data: &Dataset,
        config: &EnsembleConfig,
        components: &Components,
        rng: &mut R,
    ) -> Result<EnsembleMember>
    where
        R: Rng + ?Sized,
    {
        let bootstrap_rows =
            components
                .sampler
                .sample_rows(data.num_instances(), config.instance_fraction, seed)?;
        let sample = data.select_rows(&bootstrap_rows);

        let oracle = components.evaluator.build(&sample)?;
        let selector = StochasticSelector::new(config.feature_fraction, config.acceptance);
        let selected = selector.select(&sample, &*oracle, rng)?;

        let projection = Projection::new(&selected, data.class_index());
        let projected = sample.project(&projection);

        let mut learner = components.learners.create();
        if learner.supports_seeding() {
            learner.set_seed(seed);
        }
        learner.fit(&projected)?;

        log::debug!(
            "Member {}: {} bootstrap rows, attributes {:?} (goal {}), learner {}",
            index,
            bootstrap_rows.len(),
            selected,
            selector.goal(data.feature_indices().len()),
            learner.name()
        );

        Ok(EnsembleMember {
            index,
            seed,
            bootstrap_rows,
            selected,
            projection,
            learner,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Rows of the training set drawn for this member, in draw order.
    pub fn bootstrap_rows(&self) -> &[usize] {
        &self.bootstrap_rows
    }

    /// Selected attribute indices (full schema, class excluded), ascending.
    pub fn selected_attributes(&self) -> &[usize] {
        &self.selected
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn learner(&self) -> &dyn BaseLearner {
        &*self.learner
    }

    /// Class distribution for a full-schema instance.
    pub fn distribution(&self, instance: ArrayView1<'_, f64>) -> anyhow::Result<Vec<f64>> {
        let projected = self.projection.project_instance(instance);
        self.learner.distribution(projected.view())
    }
}

impl std::fmt::Debug for EnsembleMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnsembleMember")
            .field("index", &self.index)
            .field("seed", &self.seed)
            .field("bootstrap_size", &self.bootstrap_rows.len())
            .field("selected", &self.selected)
            .field("learner", &self.learner.name())
            .finish()
    }
}
