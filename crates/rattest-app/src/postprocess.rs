//! Turning an event file into a results document.

use crate::{display_duration, relative_to};
use anyhow::Context;
use rattest_adapters::{CommandSpec, ProcessRunner, RunResult, check_event_file};
use rattest_config::TestCase;
use rattest_types::PostProcessKind;
use std::ffi::OsString;
use std::path::Path;
use tracing::{info, warn};

/// Command that runs the test's post-processor on its event file.
///
/// ROOT macros go through `root -l -b -q`, anything else is executed
/// directly. Paths are given relative to the test directory, which is the
/// child's working directory.
pub fn post_process_command(tc: &TestCase, root: Option<&Path>) -> anyhow::Result<CommandSpec> {
    let script = relative_to(&tc.dir, &tc.post_script).display().to_string();
    let event = relative_to(&tc.dir, &tc.event_file).display().to_string();
    let results = relative_to(&tc.dir, &tc.current_results)
        .display()
        .to_string();

    let spec = match tc.post_kind {
        PostProcessKind::CompiledMacro | PostProcessKind::InterpretedMacro => {
            let root = root.context("`root` not found; set ROOTSYS or add it to PATH")?;
            let compile = if tc.post_kind == PostProcessKind::CompiledMacro {
                "+"
            } else {
                ""
            };
            let call = format!("./{script}{compile}(\"{event}\",\"{results}\")");
            let mut argv: Vec<OsString> = vec![root.into()];
            argv.extend(["-l", "-b", "-q"].map(OsString::from));
            argv.push(call.into());
            CommandSpec::new(argv)
        }
        PostProcessKind::Executable => {
            let program = if Path::new(&script).is_absolute() {
                script
            } else {
                format!("./{script}")
            };
            CommandSpec::new([program, event, results])
        }
    };

    Ok(spec.in_dir(tc.dir.clone()))
}

pub struct PostProcessUseCase<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> PostProcessUseCase<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Check the event file, then run the post-processor.
    ///
    /// A non-zero exit is only logged: the comparison notices a missing or
    /// stale results file on its own.
    pub fn execute(&self, tc: &TestCase, root: Option<&Path>) -> anyhow::Result<RunResult> {
        check_event_file(&tc.event_file)?;

        let spec = post_process_command(tc, root)?;
        info!(test = %tc.name, command = %spec.display(), "running post-processor");

        let run = self
            .runner
            .run(&spec)
            .with_context(|| format!("post-processing of {}", tc.name))?;

        if run.success() {
            info!(test = %tc.name, elapsed = %display_duration(run.wall), "post-processing finished");
        } else {
            warn!(test = %tc.name, exit_code = ?run.exit_code, "post-processor exited with non-zero status");
        }
        Ok(run)
    }
}
