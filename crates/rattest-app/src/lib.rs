//! Application layer for rattest.
//!
//! The app layer coordinates adapters, config and domain logic for one
//! test case at a time. It does not parse CLI flags.

mod compare;
mod postprocess;
mod run;
mod simulate;
mod template;

pub use compare::{CompareOutcome, CompareUseCase, load_results, plot_file_names};
pub use postprocess::{PostProcessUseCase, post_process_command};
pub use run::{BatchOutcome, CaseOutcome, Mode, RegenPolicy, TestCaseUseCase};
pub use simulate::{SimulateUseCase, simulation_command};
pub use template::scaffold_template;

use anyhow::Context;
use rattest_adapters::locate_executable;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now_rfc3339(&self) -> String;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        use time::format_description::well_known::Rfc3339;
        time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
    }
}

/// External programs a test case may need. Either may be missing until used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolchain {
    pub rat: Option<PathBuf>,
    pub root: Option<PathBuf>,
}

impl Toolchain {
    /// `$RATROOT/bin/rat` and `$ROOTSYS/bin/root`, falling back to `PATH`.
    pub fn locate() -> Self {
        Self {
            rat: locate_executable("rat", "RATROOT").ok(),
            root: locate_executable("root", "ROOTSYS").ok(),
        }
    }

    pub fn rat(&self) -> anyhow::Result<&Path> {
        self.rat
            .as_deref()
            .context("simulation executable `rat` not found; set RATROOT or add it to PATH")
    }

    pub fn root(&self) -> anyhow::Result<&Path> {
        self.root
            .as_deref()
            .context("`root` not found; set ROOTSYS or add it to PATH")
    }
}

/// `path` relative to `dir` when it lies inside it.
fn relative_to<'a>(dir: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(dir).unwrap_or(path)
}

/// Wall time rounded to milliseconds, for logs.
fn display_duration(d: Duration) -> String {
    humantime::format_duration(Duration::from_millis(d.as_millis() as u64)).to_string()
}
