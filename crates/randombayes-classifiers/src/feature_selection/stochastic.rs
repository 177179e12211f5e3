//! Merit-weighted stochastic feature selection.
//!
//! Grows a subset one attribute at a time. Each round every remaining
//! attribute is scored by the merit of the subset it would produce, and the
//! next attribute is drawn from a roulette wheel whose slots are sized by those
//! scores. Candidates are always visited in ascending attribute index so a
//! given random draw maps to exactly one attribute.

use anyhow::bail;
use rand::Rng;

use crate::config::AcceptancePolicy;
use crate::dataset::{Dataset, FeatureMask};
use crate::feature_selection::merit::MeritOracle;

/// Merit of the current subset extended by one attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatedAttribute {
    pub index: usize,
    pub score: f64,
}

/// Spin the roulette wheel for a uniform `draw` in `[0, 1)`.
///
/// The running value starts at `draw * total` and each candidate subtracts its
/// score; the first positive-score candidate that brings it to `<= 0` wins.
/// When the scores sum to zero or less, or rounding leaves no winner, the last
/// candidate is returned. `None` only for an empty candidate list.
pub fn roulette_pick(candidates: &[RatedAttribute], draw: f64) -> Option<RatedAttribute> {
    let last = *candidates.last()?;
    let total: f64 = candidates.iter().map(|c| c.score).sum();
    if !(total > 0.0) {
        return Some(last);
    }

    let mut remaining = draw * total;
    for candidate in candidates {
        // Slots of zero width cannot be landed on.
        if candidate.score <= 0.0 {
            continue;
        }
        remaining -= candidate.score;
        if remaining <= 0.0 {
            return Some(*candidate);
        }
    }
    Some(last)
}

/// Constructive roulette-wheel selector over the non-class attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochasticSelector {
    feature_fraction: f64,
    acceptance: AcceptancePolicy,
}

impl StochasticSelector {
    pub fn new(feature_fraction: f64, acceptance: AcceptancePolicy) -> Self {
        Self {
            feature_fraction,
            acceptance,
        }
    }

    pub fn feature_fraction(&self) -> f64 {
        self.feature_fraction
    }

    pub fn acceptance(&self) -> AcceptancePolicy {
        self.acceptance
    }

    /// Target subset size: `ceil(num_features * fraction)`, within `[1, num_features]`.
    ///
    /// A tiny tolerance keeps products such as `10 * 0.3` from rounding up past the exact value.
    pub fn goal(&self, num_features: usize) -> usize {
        if num_features == 0 {
            return 0;
        }
        let raw = (num_features as f64 * self.feature_fraction - 1e-9).ceil();
        (raw.max(1.0) as usize).min(num_features)
    }

    /// Run one selection on `data`. Returns the chosen attribute indices in ascending
    /// order; the class attribute is never a candidate.
    pub fn select<R>(&self, data: &Dataset, oracle: &dyn MeritOracle, rng: &mut R) -> anyhow::Result<Vec<usize>>
    where
        R: Rng + ?Sized,
    {
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            bail!("Feature fraction must be in (0, 1], got {}", self.feature_fraction);
        }
        let features = data.feature_indices();
        if features.is_empty() {
            bail!("Feature selection needs at least one non-class attribute");
        }

        let goal = self.goal(features.len());
        let mut mask = FeatureMask::empty(data.num_attributes());
        let mut picked = 0usize;
        let mut current_score = 0.0;

        while picked < goal {
            let mut ranking = Vec::with_capacity(features.len() - picked);
            for &idx in &features {
                if mask.contains(idx) {
                    continue;
                }
                mask.set(idx);
                let score = oracle.evaluate(&mask)?;
                mask.clear(idx);
                ranking.push(RatedAttribute { index: idx, score });
            }

            let draw: f64 = rng.gen();
            let Some(choice) = roulette_pick(&ranking, draw) else {
                break;
            };

            match self.acceptance {
                AcceptancePolicy::Improving if choice.score <= current_score => {
                    log::trace!(
                        "Stopping selection at {} of {} attributes: attribute {} scores {:.6} <= {:.6}",
                        picked,
                        goal,
                        choice.index,
                        choice.score,
                        current_score
                    );
                    break;
                }
                _ => {
                    log::trace!(
                        "Round {}: picked attribute {} (merit {:.6}) from {} candidates",
                        picked,
                        choice.index,
                        choice.score,
                        ranking.len()
                    );
                    current_score = choice.score;
                    mask.set(choice.index);
                    picked += 1;
                }
            }
        }

        Ok(mask.indices())
    }
}
