use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{EnsembleError, Result};

/// Number of ensemble members when not configured.
pub const DEFAULT_MEMBER_COUNT: usize = 10;
/// Fraction of the training set drawn (with replacement) for each member.
pub const DEFAULT_INSTANCE_FRACTION: f64 = 1.0;
/// Fraction of the non-class attributes each member aims to keep.
pub const DEFAULT_FEATURE_FRACTION: f64 = 0.5;

/// Central configuration for a RandomBayes ensemble.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnsembleConfig {
    pub member_count: usize,
    pub instance_fraction: f64,
    pub feature_fraction: f64,
    pub seed: u64,
    pub acceptance: AcceptancePolicy,
    pub seeding: SeedStrategy,
    /// Rescale the output of a single-member ensemble so it sums to one.
    /// Off by default: one member passes its learner's vector through untouched.
    pub normalize_single_member: bool,
    pub learner: LearnerConfig,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            member_count: DEFAULT_MEMBER_COUNT,
            instance_fraction: DEFAULT_INSTANCE_FRACTION,
            feature_fraction: DEFAULT_FEATURE_FRACTION,
            seed: 0,
            acceptance: AcceptancePolicy::default(),
            seeding: SeedStrategy::default(),
            normalize_single_member: false,
            learner: LearnerConfig::default(),
        }
    }
}

impl EnsembleConfig {
    pub fn new(member_count: usize, instance_fraction: f64, feature_fraction: f64) -> Self {
        Self {
            member_count,
            instance_fraction,
            feature_fraction,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptancePolicy) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_seeding(mut self, seeding: SeedStrategy) -> Self {
        self.seeding = seeding;
        self
    }

    /// Check the numeric ranges required before any member is trained.
    pub fn validate(&self) -> Result<()> {
        if self.member_count < 1 {
            return Err(EnsembleError::InvalidConfiguration(format!(
                "member_count must be at least 1, got {}",
                self.member_count
            )));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(EnsembleError::InvalidConfiguration(format!(
                "feature_fraction must be in (0, 1], got {}",
                self.feature_fraction
            )));
        }
        if !(self.instance_fraction.is_finite() && self.instance_fraction > 0.0) {
            return Err(EnsembleError::InvalidConfiguration(format!(
                "instance_fraction must be a positive finite number, got {}",
                self.instance_fraction
            )));
        }
        Ok(())
    }
}

/// What to do with the attribute drawn by the roulette wheel.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcceptancePolicy {
    /// Hill-climbing gate: keep the attribute only when it raises the subset merit,
    /// otherwise stop selecting. Members may end up with fewer features than the goal.
    #[default]
    Improving,
    /// Always keep the drawn attribute until the goal is reached.
    Unconditional,
}

impl FromStr for AcceptancePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "improving" | "gate" => Ok(AcceptancePolicy::Improving),
            "unconditional" | "always" => Ok(AcceptancePolicy::Unconditional),
            _ => Err(format!(
                "Unknown acceptance policy: {}. Expected `improving` or `unconditional`",
                s
            )),
        }
    }
}

/// How member randomness is derived from the global seed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeedStrategy {
    /// One stream advanced across all members in order. Members train sequentially.
    #[default]
    Sequential,
    /// Each member owns a stream keyed by (seed, member index). Members train in parallel.
    PerMember,
}

impl FromStr for SeedStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "sequential" => Ok(SeedStrategy::Sequential),
            "per_member" | "parallel" => Ok(SeedStrategy::PerMember),
            _ => Err(format!(
                "Unknown seeding strategy: {}. Expected `sequential` or `per_member`",
                s
            )),
        }
    }
}

/// Base learner configuration.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct LearnerConfig {
    #[serde(flatten)]
    pub learner_type: LearnerType,
}

/// Supported base learners and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum LearnerType {
    NaiveBayes {
        /// Additive smoothing applied to class priors and nominal value counts.
        laplace: f64,
        /// Floor for the per-class standard deviation of numeric attributes.
        min_std_dev: f64,
    },
}

impl Default for LearnerType {
    fn default() -> Self {
        LearnerType::NaiveBayes {
            laplace: 1.0,
            min_std_dev: 1e-3,
        }
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            learner_type: LearnerType::default(),
        }
    }
}

impl FromStr for LearnerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "naive_bayes" | "nb" => Ok(LearnerType::default()),
            _ => Err(format!("Unknown learner type: {}", s)),
        }
    }
}

impl LearnerConfig {
    pub fn new(learner_type: LearnerType) -> Self {
        Self { learner_type }
    }
}
