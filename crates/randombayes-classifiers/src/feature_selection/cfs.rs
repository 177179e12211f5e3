//! Correlation-based feature subset evaluation (CFS).
//!
//! A subset is good when its attributes correlate with the class but not with
//! each other. For a subset `S` of `k` attributes the merit is
//!
//! ```text
//! merit(S) = sum_{f in S} r_cf / sqrt(k + 2 * sum_{i<j in S} r_ij)
//! ```
//!
//! where every `r` is an absolute correlation in `[0, 1]`:
//! Pearson's r between numeric attributes, the prior-weighted correlation of
//! each label indicator for nominal/numeric pairs, and symmetric uncertainty
//! between two nominal attributes. Missing values are dropped pairwise.

use anyhow::{anyhow, bail};
use ndarray::{Array1, Array2};

use crate::dataset::{AttributeKind, Dataset, FeatureMask};
use crate::feature_selection::merit::{MeritOracle, SubsetEvaluator};

#[derive(Debug, Clone, Copy, Default)]
pub struct CfsSubsetEvaluator;

impl SubsetEvaluator for CfsSubsetEvaluator {
    fn build(&self, data: &Dataset) -> anyhow::Result<Box<dyn MeritOracle>> {
        let class_index = data
            .class_index()
            .ok_or_else(|| anyhow!("CFS requires a dataset with a class attribute"))?;
        let correlations = correlation_matrix(data);
        log::trace!(
            "Built CFS correlation matrix over {} attributes ({} instances)",
            data.num_attributes(),
            data.num_instances()
        );
        Ok(Box::new(CfsMerit {
            correlations,
            class_index,
        }))
    }

    fn name(&self) -> &str {
        "cfs"
    }
}

/// CFS merit over a precomputed correlation matrix.
#[derive(Debug, Clone)]
pub struct CfsMerit {
    correlations: Array2<f64>,
    class_index: usize,
}

impl CfsMerit {
    pub fn correlations(&self) -> &Array2<f64> {
        &self.correlations
    }
}

impl MeritOracle for CfsMerit {
    fn evaluate(&self, mask: &FeatureMask) -> anyhow::Result<f64> {
        if mask.len() != self.correlations.nrows() {
            bail!(
                "Feature mask covers {} attributes, the evaluator was built on {}",
                mask.len(),
                self.correlations.nrows()
            );
        }
        let subset: Vec<usize> = mask
            .indices()
            .into_iter()
            .filter(|&i| i != self.class_index)
            .collect();
        if subset.is_empty() {
            return Ok(0.0);
        }

        let num: f64 = subset
            .iter()
            .map(|&i| self.correlations[(i, self.class_index)])
            .sum();
        let mut denom = subset.len() as f64;
        for (pos, &i) in subset.iter().enumerate() {
            for &j in &subset[pos + 1..] {
                denom += 2.0 * self.correlations[(i, j)];
            }
        }

        if denom <= 0.0 {
            return Ok(0.0);
        }
        Ok(num / denom.sqrt())
    }
}

/// Symmetric matrix of absolute pairwise correlations, ones on the diagonal.
pub fn correlation_matrix(data: &Dataset) -> Array2<f64> {
    let n = data.num_attributes();
    let mut corr = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        corr[(i, i)] = 1.0;
        for j in (i + 1)..n {
            let r = correlate(data, i, j);
            corr[(i, j)] = r;
            corr[(j, i)] = r;
        }
    }
    corr
}

/// Absolute correlation between two attributes, using rows where both are present.
pub fn correlate(data: &Dataset, a: usize, b: usize) -> f64 {
    let values = data.values();
    let (xs, ys): (Vec<f64>, Vec<f64>) = values
        .column(a)
        .iter()
        .zip(values.column(b).iter())
        .filter(|(x, y)| !x.is_nan() && !y.is_nan())
        .map(|(&x, &y)| (x, y))
        .unzip();
    if xs.len() < 2 {
        return 0.0;
    }

    let r = match (&data.attribute(a).kind, &data.attribute(b).kind) {
        (AttributeKind::Numeric, AttributeKind::Numeric) => {
            pearson(&Array1::from(xs), &Array1::from(ys)).abs()
        }
        (AttributeKind::Nominal(labels), AttributeKind::Numeric) => {
            nominal_numeric(&xs, labels.len(), &Array1::from(ys))
        }
        (AttributeKind::Numeric, AttributeKind::Nominal(labels)) => {
            nominal_numeric(&ys, labels.len(), &Array1::from(xs))
        }
        (AttributeKind::Nominal(lx), AttributeKind::Nominal(ly)) => {
            symmetric_uncertainty(&xs, lx.len(), &ys, ly.len())
        }
    };

    if r.is_finite() {
        r.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Pearson's r. Zero when either side has no variance.
pub fn pearson(x: &Array1<f64>, y: &Array1<f64>) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return 0.0;
    }
    let x_centered = x - x.mean().unwrap_or(0.0);
    let y_centered = y - y.mean().unwrap_or(0.0);
    let denom = (x_centered.dot(&x_centered) * y_centered.dot(&y_centered)).sqrt();
    if denom <= f64::EPSILON {
        0.0
    } else {
        x_centered.dot(&y_centered) / denom
    }
}

fn nominal_numeric(codes: &[f64], num_labels: usize, numeric: &Array1<f64>) -> f64 {
    let total = codes.len() as f64;
    (0..num_labels)
        .map(|label| {
            let indicator: Array1<f64> = codes
                .iter()
                .map(|&c| if c as usize == label { 1.0 } else { 0.0 })
                .collect();
            let prior = indicator.sum() / total;
            if prior == 0.0 {
                0.0
            } else {
                prior * pearson(&indicator, numeric).abs()
            }
        })
        .sum()
}

fn entropy(counts: impl Iterator<Item = f64>, total: f64) -> f64 {
    counts
        .filter(|&c| c > 0.0)
        .map(|c| {
            let p = c / total;
            -p * p.ln()
        })
        .sum()
}

/// `2 * I(X; Y) / (H(X) + H(Y))` over two nominal columns.
pub fn symmetric_uncertainty(x: &[f64], kx: usize, y: &[f64], ky: usize) -> f64 {
    let mut joint = Array2::<f64>::zeros((kx.max(1), ky.max(1)));
    for (&a, &b) in x.iter().zip(y.iter()) {
        let (a, b) = (a as usize, b as usize);
        if a < kx && b < ky {
            joint[(a, b)] += 1.0;
        }
    }
    let total = joint.sum();
    if total == 0.0 {
        return 0.0;
    }
    let hx = entropy(joint.rows().into_iter().map(|r| r.sum()), total);
    let hy = entropy(joint.columns().into_iter().map(|c| c.sum()), total);
    let hxy = entropy(joint.iter().copied(), total);
    if hx + hy <= 0.0 {
        return 0.0;
    }
    2.0 * (hx + hy - hxy) / (hx + hy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Attribute;

    fn correlated_dataset() -> Dataset {
        // f0 tracks the class, f1 duplicates f0, f2 is constant, f3 is a nominal copy of the class.
        let mut rows = Vec::new();
        for i in 0..20 {
            let class = (i % 2) as f64;
            let f0 = class * 10.0 + (i as f64) * 0.01;
            rows.push(vec![f0, f0 * 2.0, 5.0, class, class]);
        }
        Dataset::from_rows(
            vec![
                Attribute::numeric("f0"),
                Attribute::numeric("f1"),
                Attribute::numeric("f2"),
                Attribute::nominal("f3", vec!["a", "b"]),
                Attribute::nominal("class", vec!["neg", "pos"]),
            ],
            rows,
            Some(4),
        )
        .unwrap()
    }

    #[test]
    fn pearson_detects_linear_relation() {
        let x = Array1::from(vec![1.0, 2.0, 3.0, 4.0]);
        let y = Array1::from(vec![2.0, 4.0, 6.0, 8.0]);
        let z = Array1::from(vec![8.0, 6.0, 4.0, 2.0]);
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &Array1::from(vec![3.0; 4])), 0.0);
    }

    #[test]
    fn symmetric_uncertainty_bounds() {
        let x = vec![0.0, 1.0, 0.0, 1.0];
        assert!((symmetric_uncertainty(&x, 2, &x, 2) - 1.0).abs() < 1e-12);
        let y = vec![0.0, 0.0, 1.0, 1.0];
        assert!(symmetric_uncertainty(&x, 2, &y, 2).abs() < 1e-12);
    }

    #[test]
    fn merit_prefers_relevant_attributes() {
        let data = correlated_dataset();
        let oracle = CfsSubsetEvaluator.build(&data).unwrap();
        let n = data.num_attributes();

        let relevant = oracle.evaluate(&FeatureMask::from_indices(n, &[0])).unwrap();
        let constant = oracle.evaluate(&FeatureMask::from_indices(n, &[2])).unwrap();
        let nominal = oracle.evaluate(&FeatureMask::from_indices(n, &[3])).unwrap();
        assert!(relevant > 0.9);
        assert_eq!(constant, 0.0);
        assert!((nominal - 1.0).abs() < 1e-9);

        // A redundant copy does not raise the merit of the pair above the single attribute.
        let pair = oracle.evaluate(&FeatureMask::from_indices(n, &[0, 1])).unwrap();
        assert!(pair <= relevant + 1e-9);

        assert_eq!(oracle.evaluate(&FeatureMask::empty(n)).unwrap(), 0.0);
    }

    #[test]
    fn merit_ignores_class_bit_and_checks_width() {
        let data = correlated_dataset();
        let oracle = CfsSubsetEvaluator.build(&data).unwrap();
        let n = data.num_attributes();
        let with_class = oracle.evaluate(&FeatureMask::from_indices(n, &[0, 4])).unwrap();
        let without = oracle.evaluate(&FeatureMask::from_indices(n, &[0])).unwrap();
        assert_eq!(with_class, without);
        assert!(oracle.evaluate(&FeatureMask::empty(n + 1)).is_err());
    }

    #[test]
    fn build_requires_class() {
        let mut data = correlated_dataset();
        data.set_class_index(None).unwrap();
        assert!(CfsSubsetEvaluator.build(&data).is_err());
    }
}
