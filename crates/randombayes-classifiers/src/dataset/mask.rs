use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Fixed-length selection vector over every attribute of a schema, class included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureMask {
    bits: Vec<bool>,
}

impl FeatureMask {
    pub fn empty(num_attributes: usize) -> Self {
        Self {
            bits: vec![false; num_attributes],
        }
    }

    pub fn from_indices(num_attributes: usize, indices: &[usize]) -> Self {
        let mut mask = Self::empty(num_attributes);
        for &idx in indices {
            mask.set(idx);
        }
        mask
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn set(&mut self, idx: usize) {
        self.bits[idx] = true;
    }

    pub fn clear(&mut self, idx: usize) {
        self.bits[idx] = false;
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.bits.get(idx).copied().unwrap_or(false)
    }

    /// Number of set bits.
    pub fn cardinality(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Set indices in ascending order.
    pub fn indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| if b { Some(i) } else { None })
            .collect()
    }
}

/// Ordered column list used to cut a member's view out of a full-schema row.
///
/// Built once per member from the selected attributes (ascending) with the
/// class index appended. Training data and every later query go through the
/// same instance, so the column order cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    columns: Vec<usize>,
    class_position: Option<usize>,
}

impl Projection {
    pub fn new(selected: &[usize], class_index: Option<usize>) -> Self {
        let mut columns: Vec<usize> = selected
            .iter()
            .copied()
            .filter(|&c| Some(c) != class_index)
            .collect();
        columns.sort_unstable();
        columns.dedup();
        let class_position = class_index.map(|idx| {
            columns.push(idx);
            columns.len() - 1
        });
        Self {
            columns,
            class_position,
        }
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Position of the class column inside the projected row.
    pub fn class_position(&self) -> Option<usize> {
        self.class_position
    }

    /// Projected columns without the class.
    pub fn features(&self) -> &[usize] {
        match self.class_position {
            Some(pos) => &self.columns[..pos],
            None => &self.columns,
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn project_instance(&self, instance: ArrayView1<'_, f64>) -> Array1<f64> {
        self.columns.iter().map(|&c| instance[c]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::toy_dataset;
    use ndarray::array;

    #[test]
    fn mask_tracks_indices() {
        let mut mask = FeatureMask::from_indices(5, &[3, 1]);
        assert_eq!(mask.indices(), vec![1, 3]);
        assert_eq!(mask.cardinality(), 2);
        mask.clear(3);
        assert!(!mask.contains(3));
        assert!(!mask.contains(42));
    }

    #[test]
    fn projection_appends_class_last() {
        let projection = Projection::new(&[2, 0], Some(3));
        assert_eq!(projection.columns(), &[0, 2, 3]);
        assert_eq!(projection.features(), &[0, 2]);
        assert_eq!(projection.class_position(), Some(2));
    }

    #[test]
    fn projection_never_duplicates_class() {
        let projection = Projection::new(&[1, 3], Some(3));
        assert_eq!(projection.columns(), &[1, 3]);
        assert_eq!(projection.class_position(), Some(1));
    }

    #[test]
    fn projection_without_class() {
        let projection = Projection::new(&[4, 1], None);
        assert_eq!(projection.columns(), &[1, 4]);
        assert_eq!(projection.class_position(), None);
        assert_eq!(projection.features(), &[1, 4]);
    }

    #[test]
    fn dataset_and_instance_projection_agree() {
        let data = toy_dataset();
        let projection = Projection::new(&[2], data.class_index());
        let projected = data.project(&projection);
        assert_eq!(projected.num_attributes(), 2);
        assert_eq!(projected.attribute(0).name, "b");
        assert_eq!(projected.class_index(), Some(1));
        for row in 0..data.num_instances() {
            let single = projection.project_instance(data.instance(row));
            assert_eq!(single.view(), projected.instance(row));
        }
        let raw = array![7.0, 8.0, 9.0, 1.0];
        assert_eq!(projection.project_instance(raw.view()), array![9.0, 1.0]);
    }
}
