use anyhow::{anyhow, bail};
use ndarray::ArrayView1;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;

use crate::dataset::{AttributeKind, Dataset};
use crate::models::classifier_trait::BaseLearner;

/// Naive Bayes over nominal and numeric attributes.
///
/// Nominal attributes use Laplace-smoothed frequency tables, numeric ones a
/// per-class normal distribution. Missing values are ignored both when
/// training and when predicting.
pub struct NaiveBayesClassifier {
    laplace: f64,
    min_std_dev: f64,
    model: Option<TrainedModel>,
}

struct TrainedModel {
    num_attributes: usize,
    log_priors: Vec<f64>,
    estimators: Vec<(usize, Estimator)>,
}

enum Estimator {
    /// One normal per class; `None` when the class had no observed value.
    Gaussian(Vec<Option<Normal>>),
    /// Log-probabilities indexed by `[class][value]`.
    Nominal(Vec<Vec<f64>>),
}

impl NaiveBayesClassifier {
    pub fn new(laplace: f64, min_std_dev: f64) -> Self {
        NaiveBayesClassifier {
            laplace,
            min_std_dev,
            model: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn smoothed_log_probs(&self, counts: &[f64]) -> Vec<f64> {
        let total: f64 = counts.iter().sum::<f64>() + self.laplace * counts.len() as f64;
        if total <= 0.0 {
            return vec![-(counts.len() as f64).ln(); counts.len()];
        }
        counts
            .iter()
            .map(|&c| ((c + self.laplace) / total).ln())
            .collect()
    }
}

impl Default for NaiveBayesClassifier {
    fn default() -> Self {
        Self::new(1.0, 1e-3)
    }
}

impl BaseLearner for NaiveBayesClassifier {
    fn fit(&mut self, data: &Dataset) -> anyhow::Result<()> {
        let class_index = data
            .class_index()
            .ok_or_else(|| anyhow!("Naive Bayes cannot be trained on data without a class attribute"))?;
        let num_classes = match data.num_classes() {
            Some(k) if k > 0 => k,
            Some(_) => bail!("Class attribute '{}' has no labels", data.attribute(class_index).name),
            None => bail!(
                "Naive Bayes needs a nominal class, '{}' is numeric",
                data.attribute(class_index).name
            ),
        };

        // Rows with a missing or out-of-range class label carry no information.
        let labelled: Vec<(usize, usize)> = (0..data.num_instances())
            .filter_map(|row| {
                let class = data.class_value(row)?;
                let class = class as usize;
                (class < num_classes).then_some((row, class))
            })
            .collect();

        let mut class_counts = vec![0.0; num_classes];
        for &(_, class) in &labelled {
            class_counts[class] += 1.0;
        }
        let log_priors = self.smoothed_log_probs(&class_counts);

        let values = data.values();
        let mut estimators = Vec::with_capacity(data.num_attributes().saturating_sub(1));
        for attr in data.feature_indices() {
            let estimator = match &data.attribute(attr).kind {
                AttributeKind::Nominal(labels) => {
                    let mut counts = vec![vec![0.0; labels.len()]; num_classes];
                    for &(row, class) in &labelled {
                        let value = values[(row, attr)];
                        if !value.is_nan() && (value as usize) < labels.len() {
                            counts[class][value as usize] += 1.0;
                        }
                    }
                    Estimator::Nominal(counts.iter().map(|c| self.smoothed_log_probs(c)).collect())
                }
                AttributeKind::Numeric => {
                    let mut per_class = Vec::with_capacity(num_classes);
                    for class in 0..num_classes {
                        let observed: Vec<f64> = labelled
                            .iter()
                            .filter(|&&(_, c)| c == class)
                            .map(|&(row, _)| values[(row, attr)])
                            .filter(|v| !v.is_nan())
                            .collect();
                        if observed.is_empty() {
                            per_class.push(None);
                            continue;
                        }
                        let mean = observed.iter().mean();
                        let std_dev = if observed.len() > 1 {
                            observed.iter().population_std_dev()
                        } else {
                            0.0
                        };
                        let normal = Normal::new(mean, std_dev.max(self.min_std_dev))?;
                        per_class.push(Some(normal));
                    }
                    Estimator::Gaussian(per_class)
                }
            };
            estimators.push((attr, estimator));
        }

        log::trace!(
            "Trained naive Bayes on {} labelled instances, {} attributes, {} classes",
            labelled.len(),
            estimators.len(),
            num_classes
        );

        self.model = Some(TrainedModel {
            num_attributes: data.num_attributes(),
            log_priors,
            estimators,
        });
        Ok(())
    }

    fn distribution(&self, instance: ArrayView1<'_, f64>) -> anyhow::Result<Vec<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("Naive Bayes model has not been trained"))?;
        if instance.len() != model.num_attributes {
            bail!(
                "Instance has {} values, the model was trained on {} attributes",
                instance.len(),
                model.num_attributes
            );
        }

        let mut log_scores = model.log_priors.clone();
        for (attr, estimator) in &model.estimators {
            let value = instance[*attr];
            if value.is_nan() {
                continue;
            }
            match estimator {
                Estimator::Nominal(table) => {
                    let value = value as usize;
                    for (score, probs) in log_scores.iter_mut().zip(table) {
                        if let Some(lp) = probs.get(value) {
                            *score += lp;
                        }
                    }
                }
                Estimator::Gaussian(normals) => {
                    for (score, normal) in log_scores.iter_mut().zip(normals) {
                        if let Some(normal) = normal {
                            *score += normal.ln_pdf(value);
                        }
                    }
                }
            }
        }

        let max = log_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut probs: Vec<f64> = log_scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = probs.iter().sum();
        if !(total.is_finite() && total > 0.0) {
            let uniform = 1.0 / probs.len() as f64;
            return Ok(vec![uniform; probs.len()]);
        }
        for p in probs.iter_mut() {
            *p /= total;
        }
        Ok(probs)
    }

    fn name(&self) -> &str {
        "naive-bayes"
    }
}
