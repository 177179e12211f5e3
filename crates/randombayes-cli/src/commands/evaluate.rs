use anyhow::Result;

use randombayes_classifiers::ensemble::{Components, RandomBayes};
use randombayes_classifiers::evaluation::cross_validate;
use randombayes_classifiers::io::read_dataset_with_config;
use randombayes_classifiers::report::write_ensemble_report;

use crate::commands::input::RunConfig;

/// Stratified cross-validation of the configured ensemble.
pub fn run_evaluation(config: &RunConfig) -> Result<()> {
    let data = read_dataset_with_config(&config.data, &config.reader_config())?;
    let components = Components::from_config(&config.ensemble);
    let evaluation = cross_validate(
        &data,
        &config.ensemble,
        &components,
        config.folds,
        config.cv_seed,
    )?;

    println!("=== Stratified cross-validation ({} folds) ===", config.folds);
    println!();
    print!("{}", evaluation);

    if let Some(report_path) = &config.report {
        // The report describes the ensemble trained on all of the data.
        let mut rb = RandomBayes::with_components(config.ensemble.clone(), components);
        let ensemble = rb.build(&data)?;
        write_ensemble_report(report_path, ensemble, Some(&evaluation))?;
    }
    Ok(())
}
