pub mod naive_bayes;

pub mod classifier_trait;
pub mod factory;

pub use classifier_trait::{BaseLearner, LearnerFactory};
pub use naive_bayes::NaiveBayesClassifier;
