//! randombayes-classifiers: a randomized ensemble of naive Bayes learners.
//!
//! Each ensemble member is trained on a bootstrap sample of the data, using a
//! feature subset grown by merit-weighted roulette selection over a
//! correlation-based (CFS) subset merit. Predictions average the members'
//! class distributions.
//!
//! Besides the ensemble itself the crate provides CSV loading, stratified
//! cross-validation and an HTML report used by the `randombayes` CLI.
pub mod config;
pub mod dataset;
pub mod ensemble;
pub mod error;
pub mod evaluation;
pub mod feature_selection;
pub mod io;
pub mod models;
pub mod report;
pub mod sampling;

pub use config::{AcceptancePolicy, EnsembleConfig, LearnerConfig, LearnerType, SeedStrategy};
pub use dataset::{Attribute, AttributeKind, Dataset, Schema};
pub use ensemble::{Components, Ensemble, EnsembleMember, RandomBayes};
pub use error::EnsembleError;
