//! Locating test directories under the command-line inputs.

use crate::ConfigError;
use rattest_types::CONFIG_FILE_NAME;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Every `rattest.config` at any depth below each input, sorted and deduplicated.
pub fn discover_tests<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>, ConfigError> {
    let mut found = BTreeSet::new();

    for input in inputs {
        let input = input.as_ref();
        if !input.exists() {
            return Err(ConfigError::MissingInput(input.to_path_buf()));
        }

        let base = glob::Pattern::escape(&input.to_string_lossy());
        let pattern = format!("{}/**/{CONFIG_FILE_NAME}", base.trim_end_matches('/'));
        let paths = glob::glob(&pattern).map_err(|e| ConfigError::Pattern(e.to_string()))?;

        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    found.insert(path);
                }
                Ok(_) => {}
                Err(err) => warn!(
                    path = %err.path().display(),
                    "skipping unreadable path during test discovery: {}",
                    err.error()
                ),
            }
        }
    }

    Ok(found.into_iter().collect())
}
