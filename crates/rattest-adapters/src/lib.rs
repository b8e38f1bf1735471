//! Std adapters for rattest.
//!
//! In clean-arch terms: this is where we touch the world.

mod files;
mod staleness;

pub use files::{ROOT_FILE_MAGIC, atomic_copy, atomic_write, check_event_file};
pub use staleness::needs_update;

use anyhow::Context;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub argv: Vec<OsString>,

    /// Working directory of the child; the harness itself never changes directory.
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// argv joined with spaces, for logs.
    pub fn display(&self) -> String {
        self.argv
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub wall: Duration,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("command argv must not be empty")]
    EmptyArgv,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "event file {} could not be opened ({reason}); check the simulation logs for problems, the post-processing step was not run",
        .path.display()
    )]
    EventFile { path: PathBuf, reason: String },

    #[error("could not find executable {0}")]
    ExecutableNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Runs external programs to completion.
///
/// The child inherits stdout/stderr so the tool's own logs reach the operator.
pub trait ProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError>;
}

#[derive(Debug, Default, Clone)]
pub struct StdProcessRunner;

impl ProcessRunner for StdProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError> {
        let Some((program, args)) = spec.argv.split_first() else {
            return Err(AdapterError::EmptyArgv);
        };

        let mut cmd = Command::new(program);
        cmd.args(args);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::inherit());
        cmd.stderr(Stdio::inherit());

        let start = Instant::now();
        let status = cmd.status().map_err(|source| AdapterError::Spawn {
            program: program.to_string_lossy().into_owned(),
            source,
        })?;

        Ok(RunResult {
            exit_code: status.code(),
            wall: start.elapsed(),
        })
    }
}

/// Find `name` as `$<root_var>/bin/<name>` when the variable is set, else on `PATH`.
pub fn locate_executable(name: &str, root_var: &str) -> Result<PathBuf, AdapterError> {
    let root = std::env::var_os(root_var).map(PathBuf::from);
    locate_executable_in(name, root.as_deref())
}

/// Find `name` under `<root>/bin`, falling back to `PATH`.
pub fn locate_executable_in(name: &str, root: Option<&Path>) -> Result<PathBuf, AdapterError> {
    if let Some(root) = root {
        let candidate = root.join("bin").join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    which::which(name).map_err(|_| AdapterError::ExecutableNotFound(name.to_string()))
}

/// Opens a finished report for the operator.
pub trait Viewer {
    fn open(&self, path: &Path) -> Result<(), AdapterError>;
}

/// Hands the file to the desktop's default handler without waiting for it.
#[derive(Debug, Default, Clone)]
pub struct BrowserViewer;

impl Viewer for BrowserViewer {
    fn open(&self, path: &Path) -> Result<(), AdapterError> {
        let (opener, pre_args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(windows) {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        };

        let program = which::which(opener)
            .map_err(|_| AdapterError::ExecutableNotFound(opener.to_string()))?;

        Command::new(&program)
            .args(pre_args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("open {} with {opener}", path.display()))?;
        Ok(())
    }
}
