//! Tabular datasets with a typed attribute schema.
//!
//! Values live in a dense `ndarray::Array2<f64>` (one row per instance).
//! Nominal values are stored as label indices and a missing value is `NaN`,
//! so an instance is simply a row view.
pub mod mask;

use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

pub use mask::{FeatureMask, Projection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeKind {
    Numeric,
    Nominal(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    pub fn nominal<S: Into<String>>(name: impl Into<String>, labels: Vec<S>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal(labels.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_nominal(&self) -> bool {
        matches!(self.kind, AttributeKind::Nominal(_))
    }

    /// Number of labels for a nominal attribute, `None` for numeric ones.
    pub fn num_values(&self) -> Option<usize> {
        match &self.kind {
            AttributeKind::Nominal(labels) => Some(labels.len()),
            AttributeKind::Numeric => None,
        }
    }

    pub fn label(&self, value: f64) -> Option<&str> {
        match &self.kind {
            AttributeKind::Nominal(labels) if value.is_finite() && value >= 0.0 => {
                labels.get(value as usize).map(String::as_str)
            }
            _ => None,
        }
    }
}

/// Attribute list plus the optional class index. Shared by every instance of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
    pub class_index: Option<usize>,
}

impl Schema {
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn class_attribute(&self) -> Option<&Attribute> {
        self.class_index.map(|idx| &self.attributes[idx])
    }

    /// Indices of every attribute except the class, ascending.
    pub fn feature_indices(&self) -> Vec<usize> {
        (0..self.attributes.len())
            .filter(|&i| Some(i) != self.class_index)
            .collect()
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.class_attribute().and_then(Attribute::num_values)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    schema: Schema,
    values: Array2<f64>,
}

impl Dataset {
    pub fn new(attributes: Vec<Attribute>, values: Array2<f64>, class_index: Option<usize>) -> Result<Self> {
        if values.ncols() != attributes.len() {
            bail!(
                "Value matrix has {} columns but the schema declares {} attributes",
                values.ncols(),
                attributes.len()
            );
        }
        if let Some(idx) = class_index {
            if idx >= attributes.len() {
                bail!("Class index {} out of range for {} attributes", idx, attributes.len());
            }
        }
        Ok(Self {
            schema: Schema {
                attributes,
                class_index,
            },
            values,
        })
    }

    /// Build a dataset from row vectors.
    pub fn from_rows(attributes: Vec<Attribute>, rows: Vec<Vec<f64>>, class_index: Option<usize>) -> Result<Self> {
        let ncols = attributes.len();
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * ncols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != ncols {
                bail!("Row {} has {} values, expected {}", i, row.len(), ncols);
            }
            data.extend(row);
        }
        let values = Array2::from_shape_vec((nrows, ncols), data)?;
        Self::new(attributes, values, class_index)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.schema.attributes
    }

    pub fn attribute(&self, idx: usize) -> &Attribute {
        &self.schema.attributes[idx]
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn num_attributes(&self) -> usize {
        self.schema.num_attributes()
    }

    pub fn num_instances(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    pub fn class_index(&self) -> Option<usize> {
        self.schema.class_index
    }

    pub fn set_class_index(&mut self, class_index: Option<usize>) -> Result<()> {
        if let Some(idx) = class_index {
            if idx >= self.num_attributes() {
                bail!("Class index {} out of range for {} attributes", idx, self.num_attributes());
            }
        }
        self.schema.class_index = class_index;
        Ok(())
    }

    pub fn num_classes(&self) -> Option<usize> {
        self.schema.num_classes()
    }

    pub fn feature_indices(&self) -> Vec<usize> {
        self.schema.feature_indices()
    }

    pub fn instance(&self, row: usize) -> ArrayView1<'_, f64> {
        self.values.row(row)
    }

    pub fn instances(&self) -> impl Iterator<Item = ArrayView1<'_, f64>> {
        self.values.axis_iter(Axis(0))
    }

    /// Class value of a row, `None` when there is no class or the value is missing.
    pub fn class_value(&self, row: usize) -> Option<f64> {
        let idx = self.schema.class_index?;
        let value = self.values[(row, idx)];
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    /// Copy of the dataset restricted to the given rows. Rows may repeat.
    pub fn select_rows(&self, rows: &[usize]) -> Dataset {
        Dataset {
            schema: self.schema.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    /// Copy of the dataset restricted to the given columns, in the given order.
    /// The class index follows the class column when it is kept.
    pub fn project(&self, projection: &Projection) -> Dataset {
        let columns = projection.columns();
        let attributes = columns
            .iter()
            .map(|&c| self.schema.attributes[c].clone())
            .collect();
        Dataset {
            schema: Schema {
                attributes,
                class_index: projection.class_position(),
            },
            values: self.values.select(Axis(1), columns),
        }
    }
}
