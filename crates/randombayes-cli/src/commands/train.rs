use anyhow::{Context, Result};

use randombayes_classifiers::dataset::AttributeKind;
use randombayes_classifiers::ensemble::RandomBayes;
use randombayes_classifiers::io::{read_dataset_with_config, read_for_schema, write_predictions};
use randombayes_classifiers::report::write_ensemble_report;

use crate::commands::input::RunConfig;

/// Train an ensemble, print its members and optionally classify a second file.
pub fn run_training(config: &RunConfig) -> Result<()> {
    let start_time = std::time::Instant::now();
    let data = read_dataset_with_config(&config.data, &config.reader_config())?;
    log::info!(
        "Loaded {} instances with {} attributes from {}",
        data.num_instances(),
        data.num_attributes(),
        config.data
    );

    let mut rb = RandomBayes::new(config.ensemble.clone());
    let options = rb.options().join(" ");
    let ensemble = rb
        .build(&data)
        .with_context(|| "Training failed: an error occurred while building the ensemble")?;
    log::info!("Training completed in {:?}", start_time.elapsed());

    println!("RandomBayes ensemble ({})", options);
    for member in ensemble.members() {
        let names: Vec<&str> = member
            .selected_attributes()
            .iter()
            .map(|&a| data.attribute(a).name.as_str())
            .collect();
        println!(
            "  member {:>3}: {} bootstrap rows, attributes [{}]",
            member.index(),
            member.bootstrap_rows().len(),
            names.join(", ")
        );
    }

    if let Some(predict_path) = &config.predict {
        let unseen = read_for_schema(predict_path, data.schema(), &config.reader_config())
            .with_context(|| format!("{} does not match the training data", predict_path))?;
        let distributions = ensemble.predict_dataset(&unseen)?;

        let labels = match data.schema().class_attribute().map(|a| &a.kind) {
            Some(AttributeKind::Nominal(labels)) => labels.clone(),
            _ => Vec::new(),
        };
        write_predictions(&config.output_file, &labels, &distributions)?;
        log::info!(
            "Wrote {} predictions to {}",
            distributions.len(),
            config.output_file
        );
    }

    if let Some(report_path) = &config.report {
        write_ensemble_report(report_path, ensemble, None)?;
    }
    Ok(())
}

