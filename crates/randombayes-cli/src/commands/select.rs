use anyhow::Result;

use randombayes_classifiers::ensemble::RandomBayes;
use randombayes_classifiers::io::read_dataset_with_config;

use crate::commands::input::RunConfig;

/// One stochastic feature selection over the whole dataset.
pub fn run_selection(config: &RunConfig) -> Result<Vec<String>> {
    let data = read_dataset_with_config(&config.data, &config.reader_config())?;
    let rb = RandomBayes::new(config.ensemble.clone());
    let selected = rb.select_features(&data)?;
    let names: Vec<String> = selected
        .iter()
        .map(|&a| data.attribute(a).name.clone())
        .collect();

    println!(
        "Selected {} of {} attributes: {:?}",
        names.len(),
        data.feature_indices().len(),
        selected
    );
    for name in &names {
        println!("  {}", name);
    }
    Ok(names)
}
