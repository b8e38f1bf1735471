//! Scaffolding for a new test case.

use anyhow::{Context, bail};
use rattest_adapters::atomic_write;
use rattest_config::render_template_config;
use rattest_types::CONFIG_FILE_NAME;
use std::path::{Path, PathBuf};
use tracing::info;

const MACRO_TEMPLATE: &str = include_str!("../templates/template.mac");
const POST_PROCESS_TEMPLATE: &str = include_str!("../templates/template.C");
const NAME_PLACEHOLDER: &str = "@NAME@";

/// Write `rattest.config`, `<name>.mac` and `<name>.C` into `dir`.
///
/// Nothing is written if any of the three files already exists.
pub fn scaffold_template(dir: &Path, name: &str) -> anyhow::Result<Vec<PathBuf>> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid || name.starts_with(|c: char| c.is_ascii_digit()) {
        bail!("test name {name:?} must be a C identifier (letters, digits and underscores)");
    }

    let files = [
        (dir.join(CONFIG_FILE_NAME), render_template_config(name)),
        (
            dir.join(format!("{name}.mac")),
            MACRO_TEMPLATE.replace(NAME_PLACEHOLDER, name),
        ),
        (
            dir.join(format!("{name}.C")),
            POST_PROCESS_TEMPLATE.replace(NAME_PLACEHOLDER, name),
        ),
    ];

    if let Some((existing, _)) = files.iter().find(|(path, _)| path.exists()) {
        bail!("{} already exists; not overwriting", existing.display());
    }

    let mut written = Vec::with_capacity(files.len());
    for (path, text) in files {
        atomic_write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
        info!(file = %path.display(), "template written");
        written.push(path);
    }
    Ok(written)
}
