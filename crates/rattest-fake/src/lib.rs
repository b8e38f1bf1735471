//! Fakes for exercising rattest use cases without the simulation toolchain.

use rattest_adapters::{AdapterError, CommandSpec, ProcessRunner, RunResult};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type Action = Arc<dyn Fn(&CommandSpec) -> Result<RunResult, AdapterError> + Send + Sync>;

/// A [`RunResult`] with the given exit code and a fixed wall time.
pub fn exited(code: i32) -> RunResult {
    RunResult {
        exit_code: Some(code),
        wall: Duration::from_millis(250),
    }
}

/// Process runner that records every command and replies with scripted actions.
///
/// Actions are keyed by the file name of `argv[0]`; unknown programs exit 0
/// without doing anything. Clones share the call log.
#[derive(Clone, Default)]
pub struct FakeProcessRunner {
    calls: Arc<Mutex<Vec<CommandSpec>>>,
    actions: Vec<(String, Action)>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` whenever a program named `program` is invoked.
    pub fn on<F>(mut self, program: &str, action: F) -> Self
    where
        F: Fn(&CommandSpec) -> Result<RunResult, AdapterError> + Send + Sync + 'static,
    {
        self.actions.push((program.to_string(), Arc::new(action)));
        self
    }

    /// Commands seen so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        lock(&self.calls).clone()
    }

    /// Names of the programs invoked so far.
    pub fn programs(&self) -> Vec<String> {
        self.calls().iter().map(program_name).collect()
    }
}

fn program_name(spec: &CommandSpec) -> String {
    spec.argv
        .first()
        .and_then(|p| Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ProcessRunner for FakeProcessRunner {
    fn run(&self, spec: &CommandSpec) -> Result<RunResult, AdapterError> {
        if spec.argv.is_empty() {
            return Err(AdapterError::EmptyArgv);
        }
        lock(&self.calls).push(spec.clone());

        let name = program_name(spec);
        match self.actions.iter().find(|(p, _)| *p == name) {
            Some((_, action)) => action(spec),
            None => Ok(exited(0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_and_dispatches_by_program_name() {
        let runner = FakeProcessRunner::new().on("rat", |_| Ok(exited(3)));
        let shared = runner.clone();

        let rat = runner
            .run(&CommandSpec::new(["/opt/rat/bin/rat", "a.mac"]))
            .unwrap();
        let other = runner.run(&CommandSpec::new(["root", "-b"])).unwrap();

        assert_eq!(rat.exit_code, Some(3));
        assert!(other.success());
        assert_eq!(shared.programs(), vec!["rat", "root"]);
    }

    #[test]
    fn empty_argv_is_rejected() {
        let runner = FakeProcessRunner::new();
        assert!(matches!(
            runner.run(&CommandSpec::new(Vec::<String>::new())),
            Err(AdapterError::EmptyArgv)
        ));
        assert!(runner.calls().is_empty());
    }
}
