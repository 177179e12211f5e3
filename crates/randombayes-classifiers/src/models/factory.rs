use crate::config::{LearnerConfig, LearnerType};
use crate::models::classifier_trait::{BaseLearner, LearnerFactory};
use crate::models::naive_bayes::NaiveBayesClassifier;

/// Build a boxed, untrained learner from a `LearnerConfig`.
pub fn build_learner(params: &LearnerConfig) -> Box<dyn BaseLearner> {
    match params.learner_type {
        LearnerType::NaiveBayes {
            laplace,
            min_std_dev,
        } => Box::new(NaiveBayesClassifier::new(laplace, min_std_dev)),
    }
}

impl LearnerFactory for LearnerConfig {
    fn create(&self) -> Box<dyn BaseLearner> {
        build_learner(self)
    }
}
