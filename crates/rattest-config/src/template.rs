//! Starter config for a new test case.

use toml_edit::{DocumentMut, InlineTable, Item, Value};

fn commented(value: impl Into<Value>, comment: &str) -> Item {
    let mut value = value.into();
    value.decor_mut().set_suffix(format!("  # {comment}"));
    Item::Value(value)
}

/// `rattest.config` text for a test whose macro and post-processor are named after `name`.
pub fn render_template_config(name: &str) -> String {
    let mut doc = DocumentMut::new();
    doc["description"] = commented(
        format!("{name}: describe what this test checks"),
        "shown at the top of results.html",
    );
    doc["rat_macro"] = commented(format!("{name}.mac"), "simulation macro");
    doc["root_macro"] = commented(
        format!("{name}.C"),
        "post-processor, called with (event_file, results_file)",
    );
    doc["seed"] = commented(-1i64, "fixed simulation seed, -1 for none");
    doc["KS_threshold"] = commented(
        0.01,
        "false-failure budget shared by all histograms, 1.0 requires identical histograms",
    );
    doc["num_macros"] = commented(1i64, "chained stages: NAME.mac, NAME_1.mac, ...");

    let mut plot = InlineTable::new();
    plot.insert("logX", false.into());
    plot.insert("logY", false.into());
    doc["plot_options"] = Item::Value(Value::InlineTable(plot));

    format!(
        "# rattest configuration for {name}\n# Add output_type = 'compiled' to compile the ROOT macro before running it.\n{doc}"
    )
}
