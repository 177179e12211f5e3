use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use randombayes_cli::commands::evaluate::run_evaluation;
use randombayes_cli::commands::input::RunConfig;
use randombayes_cli::commands::select::run_selection;
use randombayes_cli::commands::train::run_training;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("RANDOMBAYES_LOG", "error,randombayes=info"))
        .init();

    let matches = Command::new("randombayes")
        .version(clap::crate_version!())
        .about("RandomBayes - randomized ensembles of naive Bayes learners")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train an ensemble and optionally classify new data")
                .args(ensemble_args())
                .arg(
                    Arg::new("predict")
                        .long("predict")
                        .help("CSV/TSV file to classify with the trained ensemble")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Where class distributions for --predict are written (CSV)")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::FilePath),
                )
                .arg(report_arg()),
        )
        .subcommand(
            Command::new("evaluate")
                .about("Stratified k-fold cross-validation of an ensemble configuration")
                .args(ensemble_args())
                .arg(
                    Arg::new("folds")
                        .long("folds")
                        .help("Number of cross-validation folds")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(report_arg()),
        )
        .subcommand(
            Command::new("select")
                .about("Run one stochastic feature selection over the whole dataset")
                .args(ensemble_args()),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => run_command(sub_m, "Training", run_training),
        Some(("evaluate", sub_m)) => run_command(sub_m, "Evaluation", run_evaluation),
        Some(("select", sub_m)) => {
            run_command(sub_m, "Feature selection", |config| run_selection(config).map(|_| ()))
        }
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Resolve the run configuration and execute `command`, exiting with status 1 on failure.
fn run_command<F>(matches: &ArgMatches, what: &str, command: F) -> Result<()>
where
    F: FnOnce(&RunConfig) -> Result<()>,
{
    let config_path: Option<&PathBuf> = matches.get_one("config");
    if config_path.is_none() && matches.get_one::<String>("data").is_none() {
        eprintln!("No config file provided and no --data given. Configuration template:");
        println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
        return Ok(());
    }
    if let Some(path) = config_path {
        log::info!("[RandomBayes] Using config: {:?}", path);
    }

    let params = RunConfig::from_arguments(config_path, matches)?;
    match command(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("{} failed: {:#}", what, e);
            std::process::exit(1)
        }
    }
}

fn ensemble_args() -> Vec<Arg> {
    vec![
        Arg::new("config")
            .help("Path to a JSON run configuration")
            .required(false)
            .value_parser(clap::value_parser!(PathBuf))
            .value_hint(ValueHint::FilePath),
        Arg::new("data")
            .short('d')
            .long("data")
            .help("Training data (CSV or TSV). Overrides the data file of the configuration.")
            .value_parser(clap::builder::NonEmptyStringValueParser::new())
            .value_hint(ValueHint::FilePath),
        Arg::new("class")
            .short('c')
            .long("class")
            .help("Name of the class column. Defaults to the last column.")
            .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        Arg::new("members")
            .short('N')
            .long("members")
            .help("Number of ensemble members")
            .value_parser(clap::value_parser!(usize)),
        Arg::new("instance_percent")
            .short('P')
            .long("instance-percent")
            .help("Bootstrap sample size as a percentage of the training set")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("feature_percent")
            .short('F')
            .long("feature-percent")
            .help("Percentage of the attributes each member aims to select")
            .value_parser(clap::value_parser!(f64)),
        Arg::new("seed")
            .short('S')
            .long("seed")
            .help("Random seed")
            .value_parser(clap::value_parser!(u64)),
        Arg::new("acceptance")
            .long("acceptance")
            .help("Whether a drawn attribute must improve the subset merit")
            .value_parser(["improving", "unconditional"]),
        Arg::new("seeding")
            .long("seeding")
            .help("How member random streams are derived from the seed")
            .value_parser(["sequential", "per_member"]),
    ]
}

fn report_arg() -> Arg {
    Arg::new("report")
        .long("report")
        .help("Write an HTML report to this path")
        .value_parser(clap::builder::NonEmptyStringValueParser::new())
        .value_hint(ValueHint::FilePath)
}
