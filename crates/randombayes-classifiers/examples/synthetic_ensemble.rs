use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use randombayes_classifiers::config::{AcceptancePolicy, EnsembleConfig};
use randombayes_classifiers::dataset::{Attribute, Dataset};
use randombayes_classifiers::ensemble::{Components, RandomBayes};
use randombayes_classifiers::evaluation::cross_validate;
use randombayes_classifiers::report::write_ensemble_report;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // 200 rows, 6 numeric attributes: the first two follow the class, the rest are noise
    let mut rng = StdRng::seed_from_u64(7);
    let mut attributes: Vec<Attribute> = (0..6).map(|i| Attribute::numeric(format!("x{}", i))).collect();
    attributes.push(Attribute::nominal("class", vec!["neg", "pos"]));
    let rows: Vec<Vec<f64>> = (0..200)
        .map(|i| {
            let class = (i % 2) as f64;
            let mut row: Vec<f64> = (0..6).map(|_| rng.gen_range(-1.0..1.0)).collect();
            row[0] += class * 2.0;
            row[1] -= class * 1.5;
            row.push(class);
            row
        })
        .collect();
    let data = Dataset::from_rows(attributes, rows, Some(6))?;
    println!("Synthetic data: {} instances, {} attributes", data.num_instances(), data.num_attributes());

    let config = EnsembleConfig::new(10, 1.0, 0.5)
        .with_seed(42)
        .with_acceptance(AcceptancePolicy::Improving);

    let evaluation = cross_validate(&data, &config, &Components::from_config(&config), 10, 1)?;
    println!("{}", evaluation);

    let mut rb = RandomBayes::new(config);
    println!("Options: {}", rb.options().join(" "));
    let ensemble = rb.build(&data)?;
    for member in ensemble.members() {
        println!(
            "Member {}: attributes {:?}",
            member.index(),
            member.selected_attributes()
        );
    }

    write_ensemble_report("randombayes_report.html", ensemble, Some(&evaluation))?;
    println!("Report saved to randombayes_report.html");
    Ok(())
}
