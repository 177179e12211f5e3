use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use randombayes_classifiers::config::{AcceptancePolicy, EnsembleConfig, SeedStrategy};
use randombayes_classifiers::io::DatasetReaderConfig;

use crate::util::validate_tsv_or_csv_file;

/// Everything a `randombayes` subcommand needs, read from JSON and then
/// overridden by command line flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Training data (CSV or TSV).
    pub data: String,
    /// Class column name. The last column when unset.
    pub class_column: Option<String>,
    pub ensemble: EnsembleConfig,
    pub folds: usize,
    /// Seed for the fold split of `evaluate`.
    pub cv_seed: u64,
    /// Data to classify after training.
    pub predict: Option<String>,
    pub output_file: String,
    pub report: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data: String::new(),
            class_column: None,
            ensemble: EnsembleConfig::default(),
            folds: 10,
            cv_seed: 1,
            predict: None,
            output_file: String::from("randombayes_predictions.csv"),
            report: None,
        }
    }
}

impl RunConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let config_json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_json::from_str(&config_json)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            }
            None => RunConfig::default(),
        };

        // Apply CLI overrides
        if let Some(data) = matches.get_one::<String>("data") {
            config.data = data.clone();
        }
        validate_tsv_or_csv_file(&config.data)?;

        if let Some(class_column) = matches.get_one::<String>("class") {
            config.class_column = Some(class_column.clone());
        }
        if let Some(&members) = matches.get_one::<usize>("members") {
            config.ensemble.member_count = members;
        }
        if let Some(&percent) = matches.get_one::<f64>("instance_percent") {
            config.ensemble.instance_fraction = percent / 100.0;
        }
        if let Some(&percent) = matches.get_one::<f64>("feature_percent") {
            config.ensemble.feature_fraction = percent / 100.0;
        }
        if let Some(&seed) = matches.get_one::<u64>("seed") {
            config.ensemble.seed = seed;
        }
        if let Some(acceptance) = matches.get_one::<String>("acceptance") {
            config.ensemble.acceptance = acceptance
                .parse::<AcceptancePolicy>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(seeding) = matches.get_one::<String>("seeding") {
            config.ensemble.seeding = seeding
                .parse::<SeedStrategy>()
                .map_err(anyhow::Error::msg)?;
        }

        // Subcommand specific flags; absent from the other subcommands' definitions.
        if let Ok(Some(report)) = matches.try_get_one::<String>("report") {
            config.report = Some(report.clone());
        }
        if let Ok(Some(&folds)) = matches.try_get_one::<usize>("folds") {
            config.folds = folds;
        }
        if let Ok(Some(predict)) = matches.try_get_one::<String>("predict") {
            validate_tsv_or_csv_file(predict)?;
            config.predict = Some(predict.clone());
        } else if let Some(predict) = &config.predict {
            validate_tsv_or_csv_file(predict)?;
        }
        if let Ok(Some(output_file)) = matches.try_get_one::<String>("output_file") {
            config.output_file = output_file.clone();
        }

        Ok(config)
    }

    pub fn reader_config(&self) -> DatasetReaderConfig {
        DatasetReaderConfig {
            class_column: self.class_column.clone(),
            ..DatasetReaderConfig::default()
        }
    }
}
