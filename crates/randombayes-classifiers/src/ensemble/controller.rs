use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{AcceptancePolicy, EnsembleConfig, SeedStrategy};
use crate::dataset::Dataset;
use crate::ensemble::{Components, Ensemble};
use crate::error::{EnsembleError, Result};
use crate::feature_selection::StochasticSelector;

/// Stateful front end around [`Ensemble`].
///
/// Options can be changed until the first successful [`RandomBayes::build`];
/// after that every setter is ignored and a second build is refused.
pub struct RandomBayes {
    config: EnsembleConfig,
    components: Components,
    ensemble: Option<Ensemble>,
}

impl RandomBayes {
    pub fn new(config: EnsembleConfig) -> Self {
        let components = Components::from_config(&config);
        Self::with_components(config, components)
    }

    pub fn with_components(config: EnsembleConfig, components: Components) -> Self {
        Self {
            config,
            components,
            ensemble: None,
        }
    }

    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        self.ensemble.is_some()
    }

    fn locked(&self, option: &str) -> bool {
        if self.is_built() {
            log::debug!("Ignoring change to {}: ensemble already built", option);
        }
        self.is_built()
    }

    pub fn set_member_count(&mut self, member_count: usize) {
        if !self.locked("member count") {
            self.config.member_count = member_count;
        }
    }

    /// Bootstrap sample size as a percentage of the training set.
    pub fn set_instance_percent(&mut self, percent: f64) {
        if !self.locked("instance percentage") {
            self.config.instance_fraction = percent / 100.0;
        }
    }

    /// Target share of non-class attributes per member, as a percentage.
    pub fn set_feature_percent(&mut self, percent: f64) {
        if !self.locked("feature percentage") {
            self.config.feature_fraction = percent / 100.0;
        }
    }

    pub fn set_seed(&mut self, seed: u64) {
        if !self.locked("seed") {
            self.config.seed = seed;
        }
    }

    pub fn set_acceptance(&mut self, acceptance: AcceptancePolicy) {
        if !self.locked("acceptance policy") {
            self.config.acceptance = acceptance;
        }
    }

    pub fn set_seeding(&mut self, seeding: SeedStrategy) {
        if !self.locked("seeding strategy") {
            self.config.seeding = seeding;
        }
    }

    /// Current options in `-P <instance %> -F <feature %> -N <members>` form.
    pub fn options(&self) -> Vec<String> {
        vec![
            "-P".to_string(),
            format!("{}", self.config.instance_fraction * 100.0),
            "-F".to_string(),
            format!("{}", self.config.feature_fraction * 100.0),
            "-N".to_string(),
            self.config.member_count.to_string(),
        ]
    }

    /// Apply `-P`, `-F` and `-N` flags. Unknown flags are rejected, values are
    /// range-checked at build time.
    pub fn set_options<S: AsRef<str>>(&mut self, options: &[S]) -> Result<()> {
        let mut iter = options.iter().map(AsRef::as_ref);
        while let Some(flag) = iter.next() {
            let value = iter.next().ok_or_else(|| {
                EnsembleError::InvalidConfiguration(format!("option {} expects a value", flag))
            })?;
            let parse_number = |value: &str| {
                value.parse::<f64>().map_err(|_| {
                    EnsembleError::InvalidConfiguration(format!("{} is not a number: {}", flag, value))
                })
            };
            match flag {
                "-P" => self.set_instance_percent(parse_number(value)?),
                "-F" => self.set_feature_percent(parse_number(value)?),
                "-N" => {
                    let count = value.parse::<usize>().map_err(|_| {
                        EnsembleError::InvalidConfiguration(format!(
                            "-N expects a member count, got {}",
                            value
                        ))
                    })?;
                    self.set_member_count(count);
                }
                other => {
                    return Err(EnsembleError::InvalidConfiguration(format!(
                        "unknown option {}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }

    /// Train the ensemble. On failure the controller stays unbuilt.
    pub fn build(&mut self, data: &Dataset) -> Result<&Ensemble> {
        if self.is_built() {
            return Err(EnsembleError::AlreadyBuilt);
        }
        let ensemble = Ensemble::build(data, &self.config, &self.components)?;
        Ok(self.ensemble.insert(ensemble))
    }

    pub fn ensemble(&self) -> Result<&Ensemble> {
        self.ensemble.as_ref().ok_or(EnsembleError::NotBuilt)
    }

    pub fn into_ensemble(self) -> Result<Ensemble> {
        self.ensemble.ok_or(EnsembleError::NotBuilt)
    }

    pub fn predict(&self, instance: ArrayView1<'_, f64>) -> Result<Vec<f64>> {
        self.ensemble()?.predict(instance)
    }

    pub fn classify(&self, instance: ArrayView1<'_, f64>) -> Result<usize> {
        self.ensemble()?.classify(instance)
    }

    pub fn predict_dataset(&self, data: &Dataset) -> Result<Vec<Vec<f64>>> {
        self.ensemble()?.predict_dataset(data)
    }

    /// One stochastic selection over all of `data`, without bootstrapping.
    /// Uses the configured feature fraction, acceptance policy and seed.
    pub fn select_features(&self, data: &Dataset) -> Result<Vec<usize>> {
        self.config.validate()?;
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
        let oracle = self.components.evaluator.build(data)?;
        let selector = StochasticSelector::new(self.config.feature_fraction, self.config.acceptance);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        Ok(selector.select(data, &*oracle, &mut rng)?)
    }
}

impl std::fmt::Debug for RandomBayes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomBayes")
            .field("config", &self.config)
            .field("built", &self.is_built())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::toy_dataset;

    #[test]
    fn options_render_percentages() {
        let rb = RandomBayes::new(EnsembleConfig::new(7, 0.8, 0.25));
        assert_eq!(rb.options(), vec!["-P", "80", "-F", "25", "-N", "7"]);
    }

    #[test]
    fn set_options_updates_config() {
        let mut rb = RandomBayes::new(EnsembleConfig::default());
        rb.set_options(&["-N", "3", "-P", "50", "-F", "100"]).unwrap();
        assert_eq!(rb.config().member_count, 3);
        assert!((rb.config().instance_fraction - 0.5).abs() < 1e-12);
        assert!((rb.config().feature_fraction - 1.0).abs() < 1e-12);

        assert!(rb.set_options(&["-N"]).is_err());
        assert!(rb.set_options(&["-X", "1"]).is_err());
        assert!(rb.set_options(&["-P", "lots"]).is_err());
    }

    #[test]
    fn setters_lock_after_build() {
        let mut rb = RandomBayes::new(EnsembleConfig::new(2, 1.0, 1.0).with_seed(3));
        assert!(matches!(rb.ensemble(), Err(EnsembleError::NotBuilt)));
        rb.build(&toy_dataset()).unwrap();

        rb.set_member_count(9);
        rb.set_feature_percent(10.0);
        rb.set_seed(99);
        assert_eq!(rb.config().member_count, 2);
        assert_eq!(rb.config().feature_fraction, 1.0);
        assert_eq!(rb.config().seed, 3);
        assert!(matches!(rb.build(&toy_dataset()), Err(EnsembleError::AlreadyBuilt)));
    }

    #[test]
    fn failed_build_leaves_controller_unbuilt() {
        let mut rb = RandomBayes::new(EnsembleConfig::new(0, 1.0, 0.5));
        assert!(matches!(
            rb.build(&toy_dataset()),
            Err(EnsembleError::InvalidConfiguration(_))
        ));
        assert!(!rb.is_built());
        rb.set_member_count(2);
        assert!(rb.build(&toy_dataset()).is_ok());
    }
}
