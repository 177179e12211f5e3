//! Feature selection utilities.
//!
//! `merit` defines the subset-scoring seam, `cfs` the correlation-based
//! evaluator used by default, and `stochastic` the merit-weighted roulette
//! selector that picks each ensemble member's attributes.
pub mod cfs;
pub mod merit;
pub mod stochastic;

pub use cfs::CfsSubsetEvaluator;
pub use merit::{MeritOracle, SubsetEvaluator};
pub use stochastic::{roulette_pick, RatedAttribute, StochasticSelector};
