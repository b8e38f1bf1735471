//! Inspection of simulation macros.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Output processors that write an event file, in order of precedence.
const OUTPUT_PROCESSORS: [&str; 3] = ["outroot", "outsoc", "outntuple"];

static OUTPUT_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"/rat/proc[last]*\s+(outroot|outsoc|outntuple)\s+/rat/procset\s+file\s+"(.+)""#)
        .expect("output directive pattern is valid")
});

/// File name the macro asks its output processor to write, if any.
pub fn find_output_file(macro_text: &str) -> Option<String> {
    let found: Vec<(&str, &str)> = OUTPUT_DIRECTIVE
        .captures_iter(macro_text)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect();

    OUTPUT_PROCESSORS.iter().find_map(|proc_name| {
        found
            .iter()
            .find(|(p, _)| p == proc_name)
            .map(|(_, file)| file.to_string())
    })
}

/// Macro run at `stage` of a chain: `foo.mac`, `foo_1.mac`, `foo_2.mac`, ...
pub fn stage_macro_path(base: &Path, stage: u32) -> PathBuf {
    if stage == 0 {
        return base.to_path_buf();
    }
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match base.extension() {
        Some(ext) => format!("{stem}_{stage}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{stage}"),
    };
    base.with_file_name(name)
}
