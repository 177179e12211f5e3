pub mod plots;
#[allow(clippy::module_inception)]
pub mod report;

use std::path::Path;

use anyhow::{anyhow, Result};
use maud::{html, PreEscaped};

use crate::ensemble::Ensemble;
use crate::evaluation::Evaluation;
use plots::{plot_attribute_usage, plot_subset_sizes};
pub use report::{Report, ReportSection};

/// Assemble the HTML summary of a trained ensemble and, when given, its
/// cross-validation result.
pub fn ensemble_report(ensemble: &Ensemble, evaluation: Option<&Evaluation>) -> Result<Report> {
    let mut report = Report::new(
        "RandomBayes",
        env!("CARGO_PKG_VERSION"),
        "RandomBayes Ensemble Report",
    );
    let attributes = &ensemble.schema().attributes;

    /* Section 1: Members */
    {
        let mut section = ReportSection::new("Members");
        section.add_content(html! {
            table {
                tr { th { "Member" } th { "Seed" } th { "Bootstrap rows" } th { "Selected attributes" } }
                @for member in ensemble.members() {
                    tr {
                        td { (member.index()) }
                        td { (member.seed()) }
                        td { (member.bootstrap_rows().len()) }
                        td {
                            (member
                                .selected_attributes()
                                .iter()
                                .map(|&a| attributes[a].name.as_str())
                                .collect::<Vec<_>>()
                                .join(", "))
                        }
                    }
                }
            }
        });

        let names: Vec<String> = attributes.iter().map(|a| a.name.clone()).collect();
        let usage_plot = plot_attribute_usage(&names, &ensemble.attribute_usage(), "Attribute usage")
            .map_err(|e| anyhow!(e))?;
        section.add_plot(usage_plot);

        let sizes: Vec<usize> = ensemble
            .members()
            .iter()
            .map(|m| m.selected_attributes().len())
            .collect();
        section.add_plot(plot_subset_sizes(&sizes, "Selected attributes per member"));
        report.add_section(section);
    }

    /* Section 2: Evaluation */
    if let Some(evaluation) = evaluation {
        let mut section = ReportSection::new("Evaluation");
        section.add_content(html! {
            table {
                tr { th { "Accuracy" } td { (format!("{:.4}", evaluation.accuracy())) } }
                tr { th { "Kappa" } td { (format!("{:.4}", evaluation.kappa())) } }
                tr { th { "Mean absolute error" } td { (format!("{:.4}", evaluation.mean_absolute_error())) } }
                tr { th { "Root mean squared error" } td { (format!("{:.4}", evaluation.root_mean_squared_error())) } }
                tr { th { "Instances" } td { (evaluation.num_instances()) } }
            }
            pre { (evaluation.to_string()) }
        });
        report.add_section(section);
    }

    /* Section 3: Configuration */
    {
        let mut section = ReportSection::new("Configuration");
        section.add_content(html! {
            pre {
                code { (PreEscaped(serde_json::to_string_pretty(ensemble.config())?)) }
            }
        });
        report.add_section(section);
    }

    Ok(report)
}

pub fn write_ensemble_report<P: AsRef<Path>>(
    path: P,
    ensemble: &Ensemble,
    evaluation: Option<&Evaluation>,
) -> Result<()> {
    ensemble_report(ensemble, evaluation)?.save_to_file(path)
}
