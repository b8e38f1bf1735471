//! Running the simulation over a test case's macros.

use crate::{display_duration, relative_to};
use anyhow::Context;
use rattest_adapters::{CommandSpec, ProcessRunner, RunResult};
use rattest_config::TestCase;
use std::ffi::OsString;
use std::path::Path;
use tracing::{info, warn};

/// `<rat> [-s <seed>] <macro>`, run from the test directory.
pub fn simulation_command(rat: &Path, tc: &TestCase, macro_path: &Path) -> CommandSpec {
    let mut argv: Vec<OsString> = vec![rat.into()];
    if let Some(seed) = tc.seed {
        argv.push("-s".into());
        argv.push(seed.to_string().into());
    }
    argv.push(relative_to(&tc.dir, macro_path).into());
    CommandSpec::new(argv).in_dir(tc.dir.clone())
}

pub struct SimulateUseCase<R: ProcessRunner> {
    runner: R,
}

impl<R: ProcessRunner> SimulateUseCase<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Run every stage in order.
    ///
    /// A stage exiting non-zero is logged and the next stage still runs;
    /// a stage that cannot be started at all is an error.
    pub fn execute(&self, tc: &TestCase, rat: &Path) -> anyhow::Result<Vec<RunResult>> {
        let mut runs = Vec::with_capacity(tc.stage_macros.len());

        for (stage, macro_path) in tc.stage_macros.iter().enumerate() {
            let spec = simulation_command(rat, tc, macro_path);
            info!(test = %tc.name, stage, command = %spec.display(), "running simulation");

            let run = self
                .runner
                .run(&spec)
                .with_context(|| format!("simulation stage {stage} of {}", tc.name))?;

            if run.success() {
                info!(test = %tc.name, stage, elapsed = %display_duration(run.wall), "simulation stage finished");
            } else {
                warn!(
                    test = %tc.name,
                    stage,
                    exit_code = ?run.exit_code,
                    "simulation exited with non-zero status"
                );
            }
            runs.push(run);
        }

        Ok(runs)
    }
}
