//! Delimited text reader producing a typed [`Dataset`].
use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::StringRecord;
use ndarray::Array2;

use crate::dataset::{Attribute, AttributeKind, Dataset, Schema};
use crate::ensemble::argmax;

/// Configuration for reading CSV/TSV datasets.
#[derive(Debug, Clone)]
pub struct DatasetReaderConfig {
    /// Column holding the class. `None` selects the last column.
    pub class_column: Option<String>,
    /// Read the file without a class when the named class column is absent.
    pub class_optional: bool,
    /// Field delimiter. `None` picks tab for `.tsv`/`.tab` files and comma otherwise.
    pub delimiter: Option<u8>,
    /// Cell values treated as missing, compared after trimming.
    pub missing_values: Vec<String>,
    /// Columns dropped before building the schema.
    pub ignore_columns: Vec<String>,
}

impl Default for DatasetReaderConfig {
    fn default() -> Self {
        Self {
            class_column: None,
            class_optional: false,
            delimiter: None,
            missing_values: vec!["?".to_string(), "".to_string(), "NA".to_string()],
            ignore_columns: Vec::new(),
        }
    }
}

impl DatasetReaderConfig {
    pub fn with_class_column(mut self, name: impl Into<String>) -> Self {
        self.class_column = Some(name.into());
        self
    }

    pub fn with_optional_class(mut self) -> Self {
        self.class_optional = true;
        self
    }

    fn is_missing(&self, value: &str) -> bool {
        let value = value.trim();
        self.missing_values.iter().any(|m| m == value)
    }
}

/// Read a delimited file with the default configuration.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_dataset_with_config(path, &DatasetReaderConfig::default())
}

/// Read a delimited file into a dataset.
///
/// A column whose non-missing cells all parse as numbers is numeric; any other
/// column is nominal with labels in first-seen order.
pub fn read_dataset_with_config<P: AsRef<Path>>(path: P, config: &DatasetReaderConfig) -> Result<Dataset> {
    let path = path.as_ref();
    let delimiter = config.delimiter.unwrap_or_else(|| delimiter_for(path));
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open dataset file: {}", path.display()))?;

    let headers = reader
        .headers()
        .context("Failed to read dataset header row")?
        .clone();

    let columns: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| {
            !config
                .ignore_columns
                .iter()
                .any(|ignored| ignored.eq_ignore_ascii_case(name))
        })
        .map(|(idx, _)| idx)
        .collect();
    if columns.is_empty() {
        bail!("No usable columns in {}", path.display());
    }

    let mut cells: Vec<Vec<String>> = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        let row = columns
            .iter()
            .map(|&idx| {
                record
                    .get(idx)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("Missing value for column {} at row {}", idx + 1, row_idx + 1))
            })
            .collect::<Result<Vec<_>>>()?;
        cells.push(row);
    }

    let class_position = match &config.class_column {
        Some(name) => match find_column(&headers, name) {
            Some(header_idx) => Some(
                columns
                    .iter()
                    .position(|&c| c == header_idx)
                    .ok_or_else(|| anyhow!("Class column '{}' is in the ignore list", name))?,
            ),
            None if config.class_optional => None,
            None => bail!("Missing class column '{}'", name),
        },
        None => Some(columns.len() - 1),
    };

    let mut attributes = Vec::with_capacity(columns.len());
    let mut values = vec![f64::NAN; cells.len() * columns.len()];
    for (col, &header_idx) in columns.iter().enumerate() {
        let name = headers.get(header_idx).unwrap_or_default().to_string();
        let numeric = cells
            .iter()
            .map(|row| row[col].as_str())
            .filter(|v| !config.is_missing(v))
            .all(|v| v.parse::<f64>().is_ok());

        // The class is always nominal so numeric-looking labels still classify.
        if numeric && Some(col) != class_position {
            for (row, row_cells) in cells.iter().enumerate() {
                let cell = row_cells[col].as_str();
                if !config.is_missing(cell) {
                    values[row * columns.len() + col] = cell.parse::<f64>()?;
                }
            }
            attributes.push(Attribute::numeric(name));
        } else {
            let mut labels: Vec<String> = Vec::new();
            let mut lookup: HashMap<String, usize> = HashMap::new();
            for (row, row_cells) in cells.iter().enumerate() {
                let cell = row_cells[col].as_str();
                if config.is_missing(cell) {
                    continue;
                }
                let code = *lookup.entry(cell.to_string()).or_insert_with(|| {
                    labels.push(cell.to_string());
                    labels.len() - 1
                });
                values[row * columns.len() + col] = code as f64;
            }
            attributes.push(Attribute::nominal(name, labels));
        }
    }

    let values = Array2::from_shape_vec((cells.len(), columns.len()), values)
        .context("Failed to build value matrix")?;
    let dataset = Dataset::new(attributes, values, class_position)?;
    log::debug!(
        "Read {} instances with {} attributes from {} (class {:?})",
        dataset.num_instances(),
        dataset.num_attributes(),
        path.display(),
        dataset.schema().class_attribute().map(|a| a.name.as_str())
    );
    Ok(dataset)
}

/// Read data to classify with a model trained on `schema`.
///
/// The file may omit the class column; its other columns are matched to the
/// schema by name through [`align_to_schema`].
pub fn read_for_schema<P: AsRef<Path>>(path: P, schema: &Schema, config: &DatasetReaderConfig) -> Result<Dataset> {
    let mut config = config.clone();
    if let Some(class) = schema.class_attribute() {
        config.class_column = Some(class.name.clone());
        config.class_optional = true;
    }
    let raw = read_dataset_with_config(path, &config)?;
    align_to_schema(&raw, schema)
}

/// Re-encode `data` against a training schema so nominal codes line up.
///
/// Columns are matched by name. Labels unknown to the training schema become
/// missing, and a missing class column is filled with missing values.
pub fn align_to_schema(data: &Dataset, schema: &Schema) -> Result<Dataset> {
    let mut values = Array2::from_elem((data.num_instances(), schema.num_attributes()), f64::NAN);
    for (target_col, target) in schema.attributes.iter().enumerate() {
        let Some(source_col) = data.attributes().iter().position(|a| a.name == target.name) else {
            if Some(target_col) == schema.class_index {
                continue;
            }
            bail!("Column '{}' is missing", target.name);
        };
        let source = data.attribute(source_col);
        if source.is_nominal() && !target.is_nominal() {
            bail!("Column '{}' is nominal but the model expects numbers", target.name);
        }
        for row in 0..data.num_instances() {
            let value = data.values()[(row, source_col)];
            if value.is_nan() {
                continue;
            }
            values[(row, target_col)] = match &target.kind {
                AttributeKind::Numeric => value,
                AttributeKind::Nominal(labels) => {
                    // Numeric-looking labels, e.g. a class coded 0/1, are matched by their text.
                    let label = match source.label(value) {
                        Some(label) => label.to_string(),
                        None => format_number(value),
                    };
                    labels
                        .iter()
                        .position(|l| *l == label)
                        .map_or(f64::NAN, |code| code as f64)
                }
            };
        }
    }
    Dataset::new(schema.attributes.clone(), values, schema.class_index)
}

/// Write one row per instance with the class distribution and the predicted label.
pub fn write_predictions<P: AsRef<Path>>(
    path: P,
    class_labels: &[String],
    distributions: &[Vec<f64>],
) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create predictions file: {}", path.display()))?;

    let mut header = vec!["row".to_string()];
    header.extend(class_labels.iter().map(|l| format!("p_{}", l)));
    header.push("predicted".to_string());
    writer.write_record(&header)?;

    for (row, probs) in distributions.iter().enumerate() {
        let best = argmax(probs);
        let mut record = vec![row.to_string()];
        record.extend(probs.iter().map(|p| format!("{:.6}", p)));
        record.push(class_labels.get(best).cloned().unwrap_or_default());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
        _ => b',',
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
