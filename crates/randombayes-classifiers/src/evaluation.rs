//! Stratified k-fold cross-validation of a RandomBayes configuration.
use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;

use crate::config::EnsembleConfig;
use crate::dataset::{AttributeKind, Dataset};
use crate::ensemble::{argmax, Components, Ensemble};
use crate::error::{EnsembleError, Result};

/// Accumulated classification statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    class_labels: Vec<String>,
    /// `confusion[actual][predicted]`
    confusion: Vec<Vec<usize>>,
    abs_error: f64,
    squared_error: f64,
    skipped: usize,
}

impl Evaluation {
    pub fn new(class_labels: Vec<String>) -> Self {
        let k = class_labels.len();
        Self {
            class_labels,
            confusion: vec![vec![0; k]; k],
            abs_error: 0.0,
            squared_error: 0.0,
            skipped: 0,
        }
    }

    /// Record one prediction. `actual` is the class label index.
    ///
    /// A prediction that does not fit the class labels is not scored; it is
    /// counted in [`Evaluation::num_skipped`].
    pub fn record(&mut self, actual: usize, distribution: &[f64]) {
        let k = self.class_labels.len();
        if actual >= k || distribution.len() != k {
            log::warn!(
                "Skipping prediction: class {} with {} probabilities for {} classes",
                actual,
                distribution.len(),
                k
            );
            self.skipped += 1;
            return;
        }
        self.confusion[actual][argmax(distribution)] += 1;
        for (class, &p) in distribution.iter().enumerate() {
            let target = if class == actual { 1.0 } else { 0.0 };
            let diff = p - target;
            self.abs_error += diff.abs() / k as f64;
            self.squared_error += diff * diff / k as f64;
        }
    }

    /// Fold another evaluation over the same classes into this one.
    pub fn merge(&mut self, other: &Evaluation) {
        for (row, other_row) in self.confusion.iter_mut().zip(&other.confusion) {
            for (cell, other_cell) in row.iter_mut().zip(other_row) {
                *cell += other_cell;
            }
        }
        self.abs_error += other.abs_error;
        self.squared_error += other.squared_error;
        self.skipped += other.skipped;
    }

    pub fn class_labels(&self) -> &[String] {
        &self.class_labels
    }

    pub fn confusion_matrix(&self) -> &[Vec<usize>] {
        &self.confusion
    }

    pub fn num_instances(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }

    /// Predictions rejected by [`Evaluation::record`].
    pub fn num_skipped(&self) -> usize {
        self.skipped
    }

    pub fn correct(&self) -> usize {
        (0..self.confusion.len()).map(|i| self.confusion[i][i]).sum()
    }

    pub fn incorrect(&self) -> usize {
        self.num_instances() - self.correct()
    }

    pub fn accuracy(&self) -> f64 {
        let n = self.num_instances();
        if n == 0 {
            return 0.0;
        }
        self.correct() as f64 / n as f64
    }

    /// Cohen's kappa of the confusion matrix.
    pub fn kappa(&self) -> f64 {
        let n = self.num_instances() as f64;
        if n == 0.0 {
            return 0.0;
        }
        let k = self.confusion.len();
        let observed = self.correct() as f64 / n;
        let expected: f64 = (0..k)
            .map(|i| {
                let actual: usize = self.confusion[i].iter().sum();
                let predicted: usize = self.confusion.iter().map(|row| row[i]).sum();
                (actual as f64 / n) * (predicted as f64 / n)
            })
            .sum();
        if (1.0 - expected).abs() < f64::EPSILON {
            return if observed >= 1.0 { 1.0 } else { 0.0 };
        }
        (observed - expected) / (1.0 - expected)
    }

    pub fn mean_absolute_error(&self) -> f64 {
        let n = self.num_instances();
        if n == 0 {
            return 0.0;
        }
        self.abs_error / n as f64
    }

    pub fn root_mean_squared_error(&self) -> f64 {
        let n = self.num_instances();
        if n == 0 {
            return 0.0;
        }
        (self.squared_error / n as f64).sqrt()
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.num_instances();
        let pct = |count: usize| {
            if n == 0 {
                0.0
            } else {
                100.0 * count as f64 / n as f64
            }
        };
        writeln!(
            f,
            "Correctly Classified Instances     {:>8} {:>10.4} %",
            self.correct(),
            pct(self.correct())
        )?;
        writeln!(
            f,
            "Incorrectly Classified Instances   {:>8} {:>10.4} %",
            self.incorrect(),
            pct(self.incorrect())
        )?;
        writeln!(f, "Kappa statistic                    {:>8.4}", self.kappa())?;
        writeln!(f, "Mean absolute error                {:>8.4}", self.mean_absolute_error())?;
        writeln!(f, "Root mean squared error            {:>8.4}", self.root_mean_squared_error())?;
        writeln!(f, "Total Number of Instances          {:>8}", n)?;
        if self.skipped > 0 {
            writeln!(f, "Skipped Predictions                {:>8}", self.skipped)?;
        }
        writeln!(f)?;
        writeln!(f, "=== Confusion Matrix ===")?;
        for (label, row) in self.class_labels.iter().zip(&self.confusion) {
            let cells: Vec<String> = row.iter().map(|c| format!("{:>6}", c)).collect();
            writeln!(f, "{} | {}", cells.join(" "), label)?;
        }
        Ok(())
    }
}

/// Split row indices into `folds` stratified folds.
///
/// Rows are shuffled, grouped by class (rows with a missing class last) and
/// dealt round-robin, so every fold gets a near-equal share of each class.
pub fn stratified_folds(data: &Dataset, folds: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<usize> = (0..data.num_instances()).collect();
    rows.shuffle(&mut rng);
    rows.sort_by_key(|&row| match data.class_value(row) {
        Some(class) => class as usize,
        None => usize::MAX,
    });

    let mut assignment = vec![Vec::new(); folds];
    for (i, row) in rows.into_iter().enumerate() {
        assignment[i % folds].push(row);
    }
    for fold in assignment.iter_mut() {
        fold.sort_unstable();
    }
    assignment
}

/// Cross-validate an ensemble configuration.
///
/// Each fold trains a fresh ensemble on the remaining folds; folds run on the rayon pool.
/// Test rows without a class value are skipped.
pub fn cross_validate(
    data: &Dataset,
    config: &EnsembleConfig,
    components: &Components,
    folds: usize,
    seed: u64,
) -> Result<Evaluation> {
    config.validate()?;
    let class_labels: Vec<String> = match data.schema().class_attribute() {
        Some(attr) => match &attr.kind {
            AttributeKind::Nominal(labels) => labels.clone(),
            AttributeKind::Numeric => {
                return Err(EnsembleError::InvalidConfiguration(format!(
                    "cross-validation needs a nominal class, '{}' is numeric",
                    attr.name
                )))
            }
        },
        None => {
            return Err(EnsembleError::InsufficientData(
                "dataset has no class attribute".to_string(),
            ))
        }
    };
    if folds < 2 {
        return Err(EnsembleError::InvalidConfiguration(format!(
            "cross-validation needs at least 2 folds, got {}",
            folds
        )));
    }
    if data.num_instances() < folds {
        return Err(EnsembleError::InsufficientData(format!(
            "{} instances cannot be split into {} folds",
            data.num_instances(),
            folds
        )));
    }

    let assignment = stratified_folds(data, folds, seed);
    log::info!(
        "Running {}-fold cross-validation on {} instances",
        folds,
        data.num_instances()
    );

    let per_fold = (0..folds)
        .into_par_iter()
        .map(|fold| {
            let train_rows: Vec<usize> = assignment
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != fold)
                .flat_map(|(_, rows)| rows.iter().copied())
                .collect();
            let train = data.select_rows(&train_rows);
            let ensemble = Ensemble::build(&train, config, components)?;

            let mut evaluation = Evaluation::new(class_labels.clone());
            for &row in &assignment[fold] {
                let Some(actual) = data.class_value(row) else {
                    continue;
                };
                let distribution = ensemble.predict(data.instance(row))?;
                evaluation.record(actual as usize, &distribution);
            }
            log::debug!(
                "Fold {}: {} training rows, accuracy {:.4}",
                fold,
                train_rows.len(),
                evaluation.accuracy()
            );
            Ok(evaluation)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut total = Evaluation::new(class_labels);
    for evaluation in &per_fold {
        total.merge(evaluation);
    }
    Ok(total)
}
