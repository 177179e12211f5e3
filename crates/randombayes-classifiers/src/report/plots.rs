use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot};

/// Bar chart of how many ensemble members use each attribute.
pub fn plot_attribute_usage(names: &[String], usage: &[usize], title: &str) -> Result<Plot, String> {
    if names.len() != usage.len() {
        return Err(format!(
            "{} attribute names for {} usage counts",
            names.len(),
            usage.len()
        ));
    }

    let trace = Bar::new(names.to_vec(), usage.to_vec()).name("Members");
    let layout = Layout::new()
        .title(title)
        .x_axis(Axis::new().title("Attribute"))
        .y_axis(Axis::new().title("Members using attribute"));

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);
    Ok(plot)
}

/// Bar chart of the number of attributes kept by each member.
pub fn plot_subset_sizes(sizes: &[usize], title: &str) -> Plot {
    let members: Vec<String> = (0..sizes.len()).map(|i| format!("#{}", i)).collect();
    let trace = Bar::new(members, sizes.to_vec()).name("Selected attributes");

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Member"))
            .y_axis(Axis::new().title("Attributes")),
    );
    plot
}
