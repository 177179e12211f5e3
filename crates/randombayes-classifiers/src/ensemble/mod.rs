//! Ensemble training and inference.
//!
//! Every member is trained on its own bootstrap sample, restricted to the
//! attributes its stochastic feature selection picked. Predictions average the
//! members' class distributions.
//!
//! Randomness comes from a single `u64` seed. With
//! [`SeedStrategy::Sequential`] one stream feeds every member in order (member
//! seed first, then that member's roulette draws), so members must be trained
//! one after the other. With [`SeedStrategy::PerMember`] each member's stream is
//! derived from `(seed, member index)` alone and members train in parallel on
//! the rayon pool; the result does not depend on scheduling.
pub mod controller;
pub mod member;

use std::sync::Arc;

use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{EnsembleConfig, SeedStrategy};
use crate::dataset::{Dataset, Schema};
use crate::error::{EnsembleError, Result};
use crate::feature_selection::{CfsSubsetEvaluator, SubsetEvaluator};
use crate::models::LearnerFactory;
use crate::sampling::{derive_member_seed, BootstrapSampler, Resample};

pub use controller::RandomBayes;
pub use member::EnsembleMember;

/// Collaborators plugged into the ensemble: merit evaluator, bootstrap sampler
/// and base-learner factory.
#[derive(Clone)]
pub struct Components {
    pub evaluator: Arc<dyn SubsetEvaluator>,
    pub sampler: Arc<dyn BootstrapSampler>,
    pub learners: Arc<dyn LearnerFactory>,
}

impl Components {
    /// CFS merit, uniform bootstrap and the learner described by `config.learner`.
    pub fn from_config(config: &EnsembleConfig) -> Self {
        Self {
            evaluator: Arc::new(CfsSubsetEvaluator),
            sampler: Arc::new(Resample),
            learners: Arc::new(config.learner.clone()),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn SubsetEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn BootstrapSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_learners(mut self, learners: Arc<dyn LearnerFactory>) -> Self {
        self.learners = learners;
        self
    }
}

impl Default for Components {
    fn default() -> Self {
        Self::from_config(&EnsembleConfig::default())
    }
}

/// A trained, immutable RandomBayes ensemble.
#[derive(Debug)]
pub struct Ensemble {
    schema: Schema,
    config: EnsembleConfig,
    members: Vec<EnsembleMember>,
}

impl Ensemble {
    /// Train `config.member_count` members on `data`.
    ///
    /// Any failure while training a member aborts the whole build.
    pub fn build(data: &Dataset, config: &EnsembleConfig, components: &Components) -> Result<Ensemble> {
        config.validate()?;
        if data.is_empty() {
            return Err(EnsembleError::InsufficientData(
                "dataset has no instances".to_string(),
            ));
        }
        if data.feature_indices().is_empty() {
            return Err(EnsembleError::InsufficientData(
                "dataset has no non-class attributes".to_string(),
            ));
        }

        log::info!(
            "Building RandomBayes: {} members, {:.1}% instances, {:.1}% features, seed {} ({:?}, {:?} acceptance)",
            config.member_count,
            config.instance_fraction * 100.0,
            config.feature_fraction * 100.0,
            config.seed,
            config.seeding,
            config.acceptance
        );

        let members = match config.seeding {
            SeedStrategy::Sequential => {
                let mut rng = StdRng::seed_from_u64(config.seed);
                (0..config.member_count)
                    .map(|index| {
                        let seed: u64 = rng.gen();
                        EnsembleMember::train(index, seed, data, config, components, &mut rng)
                    })
                    .collect::<Result<Vec<_>>>()?
            }
            SeedStrategy::PerMember => (0..config.member_count)
                .into_par_iter()
                .map(|index| {
                    let seed = derive_member_seed(config.seed, index);
                    let mut rng = StdRng::seed_from_u64(derive_member_seed(seed, 0));
                    EnsembleMember::train(index, seed, data, config, components, &mut rng)
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(Ensemble {
            schema: data.schema().clone(),
            config: config.clone(),
            members,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn members(&self) -> &[EnsembleMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Class probabilities for a full-schema instance.
    ///
    /// The summed member distributions are divided by the member count only when
    /// there are at least two members. A single member's vector is returned as the
    /// learner produced it unless `normalize_single_member` is set.
    pub fn predict(&self, instance: ArrayView1<'_, f64>) -> Result<Vec<f64>> {
        if instance.len() != self.schema.num_attributes() {
            return Err(EnsembleError::SchemaMismatch {
                expected: self.schema.num_attributes(),
                found: instance.len(),
            });
        }

        let mut members = self.members.iter();
        let first = members.next().ok_or(EnsembleError::NotBuilt)?;
        let mut sum = first.distribution(instance)?;
        for member in members {
            let probs = member.distribution(instance)?;
            if probs.len() != sum.len() {
                return Err(EnsembleError::DimensionMismatch {
                    member: member.index(),
                    expected: sum.len(),
                    found: probs.len(),
                });
            }
            for (acc, p) in sum.iter_mut().zip(&probs) {
                *acc += p;
            }
        }

        if self.members.len() >= 2 {
            let n = self.members.len() as f64;
            for v in sum.iter_mut() {
                *v /= n;
            }
        } else if self.config.normalize_single_member {
            let total: f64 = sum.iter().sum();
            if total > 0.0 {
                for v in sum.iter_mut() {
                    *v /= total;
                }
            }
        }
        Ok(sum)
    }

    /// Index of the most probable class. Ties go to the lowest index.
    pub fn classify(&self, instance: ArrayView1<'_, f64>) -> Result<usize> {
        let probs = self.predict(instance)?;
        Ok(argmax(&probs))
    }

    /// Distributions for every instance of `data`, computed in parallel.
    pub fn predict_dataset(&self, data: &Dataset) -> Result<Vec<Vec<f64>>> {
        (0..data.num_instances())
            .into_par_iter()
            .map(|row| self.predict(data.instance(row)))
            .collect()
    }

    /// How many members use each attribute of the training schema.
    pub fn attribute_usage(&self) -> Vec<usize> {
        let mut usage = vec![0; self.schema.num_attributes()];
        for member in &self.members {
            for &attr in member.selected_attributes() {
                usage[attr] += 1;
            }
        }
        usage
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
