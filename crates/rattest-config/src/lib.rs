//! Configuration loading for rattest.
//!
//! Turns a `rattest.config` file into a fully resolved [`TestCase`]: every
//! path absolute, defaults applied, the event file located by reading the
//! simulation macro.

mod discover;
mod macros;
mod template;

pub use discover::discover_tests;
pub use macros::{find_output_file, stage_macro_path};
pub use template::render_template_config;

use rattest_types::{
    CONFIG_FILE_NAME, CURRENT_RESULTS_FILE, ConfigFile, PlotOptions, PostProcessKind,
    REPORT_FILE_NAME, STANDARD_RESULTS_FILE, UNSET_SEED,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid config {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("no output file directive (outroot, outsoc or outntuple) found in {}", .0.display())]
    NoOutputDirective(PathBuf),

    #[error("input path {} does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("invalid search pattern: {0}")]
    Pattern(String),
}

/// One regression scenario, resolved against its directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Basename of the test directory.
    pub name: String,
    pub description: String,
    pub dir: PathBuf,

    /// Simulation macros in execution order (stage 0 first).
    pub stage_macros: Vec<PathBuf>,
    pub post_script: PathBuf,
    pub post_kind: PostProcessKind,

    /// Event file written by the last simulation stage.
    pub event_file: PathBuf,
    pub standard_results: PathBuf,
    pub current_results: PathBuf,
    pub report: PathBuf,

    pub seed: Option<i64>,
    pub ks_threshold: f64,
    pub plot_options: PlotOptions,
}

impl TestCase {
    pub fn base_macro(&self) -> &Path {
        &self.stage_macros[0]
    }
}

/// Parse `rattest.config` text without touching the filesystem.
pub fn parse_config(text: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
    let cfg: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    validate_config(&cfg).map_err(|message| ConfigError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(cfg)
}

fn validate_config(cfg: &ConfigFile) -> Result<(), String> {
    if cfg.rat_macro.trim().is_empty() {
        return Err("rat_macro must not be empty".to_string());
    }
    if cfg.root_macro.trim().is_empty() {
        return Err("root_macro must not be empty".to_string());
    }
    if !(cfg.ks_threshold > 0.0 && cfg.ks_threshold <= 1.0) {
        return Err(format!(
            "KS_threshold must be in (0, 1], got {}",
            cfg.ks_threshold
        ));
    }
    if cfg.num_macros < 1 {
        return Err("num_macros must be at least 1".to_string());
    }
    Ok(())
}

fn post_process_kind(script: &Path, compiled: bool) -> PostProcessKind {
    let is_root_macro = script
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "C" | "cc" | "cxx" | "cpp"));
    match (is_root_macro, compiled) {
        (true, true) => PostProcessKind::CompiledMacro,
        (true, false) => PostProcessKind::InterpretedMacro,
        (false, _) => PostProcessKind::Executable,
    }
}

fn read_to_string(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a test case from its config file.
///
/// Reads the last stage macro to find the event file name.
pub fn load_test_case(config_path: &Path) -> Result<TestCase, ConfigError> {
    let config_path = std::path::absolute(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let text = read_to_string(&config_path)?;
    let cfg = parse_config(&text, &config_path)?;

    let dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"));
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());

    let base_macro = dir.join(&cfg.rat_macro);
    let stage_macros: Vec<PathBuf> = (0..cfg.num_macros)
        .map(|i| stage_macro_path(&base_macro, i))
        .collect();

    let last_macro = &stage_macros[stage_macros.len() - 1];
    let macro_text = read_to_string(last_macro)?;
    let out_name = find_output_file(&macro_text)
        .ok_or_else(|| ConfigError::NoOutputDirective(last_macro.clone()))?;

    let post_script = dir.join(&cfg.root_macro);
    let post_kind = post_process_kind(&post_script, cfg.output_type.is_some());

    Ok(TestCase {
        name,
        description: cfg.description,
        event_file: dir.join(out_name),
        standard_results: dir.join(STANDARD_RESULTS_FILE),
        current_results: dir.join(CURRENT_RESULTS_FILE),
        report: dir.join(REPORT_FILE_NAME),
        stage_macros,
        post_script,
        post_kind,
        seed: (cfg.seed != UNSET_SEED).then_some(cfg.seed),
        ks_threshold: cfg.ks_threshold,
        plot_options: cfg.plot_options.unwrap_or_default(),
        dir,
    })
}
