use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ndarray::{array, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use randombayes_classifiers::config::{AcceptancePolicy, EnsembleConfig, SeedStrategy};
use randombayes_classifiers::dataset::{Attribute, Dataset};
use randombayes_classifiers::ensemble::{Components, Ensemble, RandomBayes};
use randombayes_classifiers::error::EnsembleError;
use randombayes_classifiers::models::{BaseLearner, LearnerFactory};
use randombayes_classifiers::sampling::BootstrapSampler;

/// 4 numeric attributes plus a binary class in the last column.
/// `x0` and `x1` carry the class, `x2` and `x3` are noise.
fn synthetic(rows: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let attributes = vec![
        Attribute::numeric("x0"),
        Attribute::numeric("x1"),
        Attribute::numeric("x2"),
        Attribute::numeric("x3"),
        Attribute::nominal("class", vec!["neg", "pos"]),
    ];
    let data = (0..rows)
        .map(|i| {
            let class = (i % 2) as f64;
            vec![
                class * 3.0 + rng.gen_range(-1.0..1.0),
                class * 1.5 + rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                class,
            ]
        })
        .collect();
    Dataset::from_rows(attributes, data, Some(4)).unwrap()
}

/// Learner that ignores its input and always answers the same vector.
struct FixedLearner(Vec<f64>);

impl BaseLearner for FixedLearner {
    fn fit(&mut self, _data: &Dataset) -> anyhow::Result<()> {
        Ok(())
    }

    fn distribution(&self, _instance: ArrayView1<'_, f64>) -> anyhow::Result<Vec<f64>> {
        Ok(self.0.clone())
    }
}

fn fixed_learners(output: Vec<f64>) -> Arc<dyn LearnerFactory> {
    Arc::new(move || -> Box<dyn BaseLearner> { Box::new(FixedLearner(output.clone())) })
}

/// Learner that remembers every seed handed to it.
struct SeedRecorder {
    seedable: bool,
    seeds: Arc<Mutex<Vec<u64>>>,
}

impl BaseLearner for SeedRecorder {
    fn fit(&mut self, _data: &Dataset) -> anyhow::Result<()> {
        Ok(())
    }

    fn distribution(&self, _instance: ArrayView1<'_, f64>) -> anyhow::Result<Vec<f64>> {
        Ok(vec![0.5, 0.5])
    }

    fn supports_seeding(&self) -> bool {
        self.seedable
    }

    fn set_seed(&mut self, seed: u64) {
        self.seeds.lock().unwrap().push(seed);
    }
}

fn recording_learners(seedable: bool, seeds: Arc<Mutex<Vec<u64>>>) -> Arc<dyn LearnerFactory> {
    Arc::new(move || -> Box<dyn BaseLearner> {
        Box::new(SeedRecorder {
            seedable,
            seeds: Arc::clone(&seeds),
        })
    })
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_unconditional_selection() {
    let data = synthetic(100, 1);
    let config = EnsembleConfig::new(5, 1.0, 0.5)
        .with_seed(42)
        .with_acceptance(AcceptancePolicy::Unconditional);
    let mut rb = RandomBayes::new(config);
    let ensemble = rb.build(&data).unwrap();

    assert_eq!(ensemble.len(), 5);
    for member in ensemble.members() {
        assert_eq!(member.selected_attributes().len(), 2);
        assert!(!member.selected_attributes().contains(&4));
        assert_eq!(member.bootstrap_rows().len(), 100);
    }

    for row in 0..data.num_instances() {
        let probs = rb.predict(data.instance(row)).unwrap();
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn improving_selection_never_exceeds_goal() {
    let data = synthetic(60, 2);
    for feature_fraction in [0.25, 0.5, 0.75, 1.0] {
        let config = EnsembleConfig::new(6, 0.8, feature_fraction).with_seed(9);
        let ensemble = Ensemble::build(&data, &config, &Components::from_config(&config)).unwrap();
        let goal = (4.0 * feature_fraction).ceil() as usize;
        for member in ensemble.members() {
            assert!(member.selected_attributes().len() <= goal);
            assert_eq!(member.bootstrap_rows().len(), 48);
        }
    }
}

#[test]
fn class_attribute_is_kept_in_every_projection() {
    let data = synthetic(40, 3);
    let config = EnsembleConfig::new(4, 1.0, 0.5)
        .with_seed(5)
        .with_acceptance(AcceptancePolicy::Unconditional);
    let ensemble = Ensemble::build(&data, &config, &Components::from_config(&config)).unwrap();
    for member in ensemble.members() {
        let projection = member.projection();
        assert_eq!(projection.columns().last(), Some(&4));
        assert_eq!(projection.class_position(), Some(projection.width() - 1));
        assert_eq!(projection.features(), member.selected_attributes());
    }
}

#[test]
fn same_seed_same_ensemble() {
    let data = synthetic(80, 4);
    for seeding in [SeedStrategy::Sequential, SeedStrategy::PerMember] {
        let config = EnsembleConfig::new(7, 1.0, 0.5).with_seed(123).with_seeding(seeding);
        let components = Components::from_config(&config);
        let a = Ensemble::build(&data, &config, &components).unwrap();
        let b = Ensemble::build(&data, &config, &components).unwrap();

        for (ma, mb) in a.members().iter().zip(b.members()) {
            assert_eq!(ma.seed(), mb.seed());
            assert_eq!(ma.bootstrap_rows(), mb.bootstrap_rows());
            assert_eq!(ma.selected_attributes(), mb.selected_attributes());
        }
        assert_eq!(a.predict_dataset(&data).unwrap(), b.predict_dataset(&data).unwrap());
    }
}

#[test]
fn per_member_seeding_ignores_thread_count() {
    let data = synthetic(80, 4);
    let config = EnsembleConfig::new(6, 0.8, 0.5)
        .with_seed(321)
        .with_seeding(SeedStrategy::PerMember);
    let components = Components::from_config(&config);

    let pooled = Ensemble::build(&data, &config, &components).unwrap();
    let single = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .unwrap()
        .install(|| Ensemble::build(&data, &config, &components).unwrap());

    for (a, b) in pooled.members().iter().zip(single.members()) {
        assert_eq!(a.index(), b.index());
        assert_eq!(a.seed(), b.seed());
        assert_eq!(a.bootstrap_rows(), b.bootstrap_rows());
        assert_eq!(a.selected_attributes(), b.selected_attributes());
    }
    assert_eq!(pooled.predict_dataset(&data).unwrap(), single.predict_dataset(&data).unwrap());
}

#[test]
fn seedable_learner_receives_member_seed() {
    let data = synthetic(30, 12);
    let config = EnsembleConfig::new(4, 1.0, 0.5).with_seed(9);
    let seeds = Arc::new(Mutex::new(Vec::new()));
    let components =
        Components::from_config(&config).with_learners(recording_learners(true, Arc::clone(&seeds)));

    let ensemble = Ensemble::build(&data, &config, &components).unwrap();
    let member_seeds: Vec<u64> = ensemble.members().iter().map(|m| m.seed()).collect();
    assert_eq!(*seeds.lock().unwrap(), member_seeds);
}

#[test]
fn learner_without_seeding_is_never_seeded() {
    let data = synthetic(30, 12);
    for seeding in [SeedStrategy::Sequential, SeedStrategy::PerMember] {
        let config = EnsembleConfig::new(4, 1.0, 0.5).with_seed(9).with_seeding(seeding);
        let seeds = Arc::new(Mutex::new(Vec::new()));
        let components =
            Components::from_config(&config).with_learners(recording_learners(false, Arc::clone(&seeds)));

        let ensemble = Ensemble::build(&data, &config, &components).unwrap();
        assert_eq!(ensemble.len(), 4);
        assert!(seeds.lock().unwrap().is_empty());
    }
}

#[test]
fn members_draw_different_bootstraps() {
    let data = synthetic(50, 5);
    let config = EnsembleConfig::new(3, 1.0, 0.5).with_seed(77);
    let ensemble = Ensemble::build(&data, &config, &Components::from_config(&config)).unwrap();
    let members = ensemble.members();
    assert_ne!(members[0].seed(), members[1].seed());
    assert_ne!(members[0].bootstrap_rows(), members[1].bootstrap_rows());
}

#[test]
fn dataset_without_class_fails() {
    let mut data = synthetic(20, 6);
    data.set_class_index(None).unwrap();
    let mut rb = RandomBayes::new(EnsembleConfig::new(2, 1.0, 0.5));
    assert!(rb.build(&data).is_err());
    assert!(!rb.is_built());
}

#[test]
fn empty_dataset_is_insufficient() {
    let data = synthetic(10, 7).select_rows(&[]);
    let mut rb = RandomBayes::new(EnsembleConfig::default());
    assert!(matches!(rb.build(&data), Err(EnsembleError::InsufficientData(_))));
    assert!(matches!(rb.ensemble(), Err(EnsembleError::NotBuilt)));
}

#[test]
fn class_only_dataset_is_insufficient() {
    let data = Dataset::from_rows(
        vec![Attribute::nominal("class", vec!["a", "b"])],
        vec![vec![0.0], vec![1.0]],
        Some(0),
    )
    .unwrap();
    let config = EnsembleConfig::default();
    assert!(matches!(
        Ensemble::build(&data, &config, &Components::from_config(&config)),
        Err(EnsembleError::InsufficientData(_))
    ));
}

#[test]
fn invalid_configuration_is_rejected_before_training() {
    let data = synthetic(20, 8);
    for config in [
        EnsembleConfig::new(0, 1.0, 0.5),
        EnsembleConfig::new(3, 1.0, 0.0),
        EnsembleConfig::new(3, 1.0, 1.01),
        EnsembleConfig::new(3, -0.5, 0.5),
    ] {
        let err = Ensemble::build(&data, &config, &Components::from_config(&config)).unwrap_err();
        assert!(matches!(err, EnsembleError::InvalidConfiguration(_)), "{}", err);
    }
}

#[test]
fn sampler_failure_aborts_build() {
    struct Broken;
    impl BootstrapSampler for Broken {
        fn sample_rows(&self, _n: usize, _fraction: f64, _seed: u64) -> anyhow::Result<Vec<usize>> {
            anyhow::bail!("disk on fire")
        }
    }

    let data = synthetic(20, 9);
    let config = EnsembleConfig::new(3, 1.0, 0.5);
    let components = Components::from_config(&config).with_sampler(Arc::new(Broken));
    let mut rb = RandomBayes::with_components(config, components);
    let err = rb.build(&data).unwrap_err();
    assert!(matches!(err, EnsembleError::Collaborator(_)));
    assert!(err.to_string().contains("disk on fire"));
    assert!(!rb.is_built());
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

#[test]
fn averages_member_distributions() {
    let data = synthetic(20, 10);
    let config = EnsembleConfig::new(3, 1.0, 0.5);
    let components = Components::from_config(&config).with_learners(fixed_learners(vec![2.0, 4.0]));
    let ensemble = Ensemble::build(&data, &config, &components).unwrap();
    assert_eq!(ensemble.predict(data.instance(0)).unwrap(), vec![2.0, 4.0]);
    assert_eq!(ensemble.classify(data.instance(0)).unwrap(), 1);
}

#[test]
fn single_member_passes_learner_output_through() {
    let data = synthetic(20, 11);
    let mut config = EnsembleConfig::new(1, 1.0, 0.5);
    let components = Components::from_config(&config).with_learners(fixed_learners(vec![3.0, 1.0]));

    let ensemble = Ensemble::build(&data, &config, &components).unwrap();
    assert_eq!(ensemble.predict(data.instance(0)).unwrap(), vec![3.0, 1.0]);

    config.normalize_single_member = true;
    let ensemble = Ensemble::build(&data, &config, &components).unwrap();
    assert_eq!(ensemble.predict(data.instance(0)).unwrap(), vec![0.75, 0.25]);
}

#[test]
fn mismatched_member_outputs_are_reported() {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let learners: Arc<dyn LearnerFactory> = Arc::new(move || -> Box<dyn BaseLearner> {
        let width = if counter.fetch_add(1, Ordering::SeqCst) == 0 { 2 } else { 3 };
        Box::new(FixedLearner(vec![1.0 / width as f64; width]))
    });

    let data = synthetic(20, 12);
    let config = EnsembleConfig::new(2, 1.0, 0.5).with_seeding(SeedStrategy::Sequential);
    let components = Components::from_config(&config).with_learners(learners);
    let ensemble = Ensemble::build(&data, &config, &components).unwrap();
    match ensemble.predict(data.instance(0)) {
        Err(EnsembleError::DimensionMismatch {
            member,
            expected,
            found,
        }) => {
            assert_eq!((member, expected, found), (1, 2, 3));
        }
        other => panic!("expected a dimension mismatch, got {:?}", other),
    }
}

#[test]
fn wrong_width_instance_is_rejected() {
    let data = synthetic(20, 13);
    let mut rb = RandomBayes::new(EnsembleConfig::new(2, 1.0, 0.5));
    rb.build(&data).unwrap();
    assert!(matches!(
        rb.predict(array![1.0, 2.0].view()),
        Err(EnsembleError::SchemaMismatch { expected: 5, found: 2 })
    ));
}

#[test]
fn separable_data_is_classified() {
    let train = synthetic(100, 14);
    let test = synthetic(40, 15);
    let config = EnsembleConfig::new(5, 1.0, 1.0)
        .with_seed(1)
        .with_acceptance(AcceptancePolicy::Unconditional);
    let mut rb = RandomBayes::new(config);
    rb.build(&train).unwrap();

    let correct = (0..test.num_instances())
        .filter(|&row| {
            let predicted = rb.classify(test.instance(row)).unwrap();
            Some(predicted as f64) == test.class_value(row)
        })
        .count();
    assert!(correct >= 36, "{} of 40 correct", correct);
}

#[test]
fn attribute_usage_counts_members() {
    let data = synthetic(30, 16);
    let config = EnsembleConfig::new(4, 1.0, 1.0).with_acceptance(AcceptancePolicy::Unconditional);
    let ensemble = Ensemble::build(&data, &config, &Components::from_config(&config)).unwrap();
    assert_eq!(ensemble.attribute_usage(), vec![4, 4, 4, 4, 0]);
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[test]
fn controller_locks_options_after_build() {
    let data = synthetic(30, 17);
    let mut rb = RandomBayes::new(EnsembleConfig::new(3, 1.0, 0.5));
    rb.set_instance_percent(50.0);
    rb.set_acceptance(AcceptancePolicy::Unconditional);
    rb.build(&data).unwrap();
    assert_eq!(rb.ensemble().unwrap().members()[0].bootstrap_rows().len(), 15);

    rb.set_member_count(10);
    rb.set_instance_percent(100.0);
    rb.set_seeding(SeedStrategy::PerMember);
    assert_eq!(rb.options(), vec!["-P", "50", "-F", "50", "-N", "3"]);
    assert_eq!(rb.config().seeding, SeedStrategy::Sequential);
    assert!(matches!(rb.build(&data), Err(EnsembleError::AlreadyBuilt)));
}

#[test]
fn select_features_runs_one_selection() {
    let data = synthetic(50, 18);
    let rb = RandomBayes::new(
        EnsembleConfig::new(1, 1.0, 0.5)
            .with_seed(3)
            .with_acceptance(AcceptancePolicy::Unconditional),
    );
    let selected = rb.select_features(&data).unwrap();
    assert_eq!(selected.len(), 2);
    assert!(selected.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(selected, rb.select_features(&data).unwrap());
}
