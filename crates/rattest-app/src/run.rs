//! Run and update workflows over one or many test cases.

use crate::{Clock, CompareUseCase, PostProcessUseCase, SimulateUseCase, Toolchain};
use anyhow::Context;
use rattest_adapters::{ProcessRunner, atomic_copy, atomic_write, needs_update};
use rattest_config::{TestCase, load_test_case};
use rattest_render::ReportBuilder;
use rattest_types::{ComparisonResult, TestOutcome, TestStatus};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Steps to redo even when their outputs look up to date.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RegenPolicy {
    pub force_simulation: bool,
    pub force_post_process: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Compare against the standard and write a report.
    Compare,
    /// Promote the current results to the new standard.
    Update,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOutcome {
    pub outcome: TestOutcome,
    pub results: Vec<ComparisonResult>,
    pub report: Option<PathBuf>,
}

impl CaseOutcome {
    fn errored(name: String, err: &anyhow::Error) -> Self {
        Self {
            outcome: TestOutcome {
                name,
                status: TestStatus::Errored,
                message: Some(format!("{err:#}")),
            },
            results: Vec::new(),
            report: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub cases: Vec<CaseOutcome>,
}

impl BatchOutcome {
    /// True when every test case passed (or was updated).
    pub fn success(&self) -> bool {
        self.cases.iter().all(|c| c.outcome.status.is_success())
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.cases
            .iter()
            .filter(|c| c.outcome.status == status)
            .count()
    }
}

/// Name for a test case whose config could not be loaded.
fn name_from_config_path(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub struct TestCaseUseCase<R: ProcessRunner + Clone, C: Clock> {
    runner: R,
    clock: C,
    toolchain: Toolchain,
    regen: RegenPolicy,
}

impl<R: ProcessRunner + Clone, C: Clock> TestCaseUseCase<R, C> {
    pub fn new(runner: R, clock: C, toolchain: Toolchain, regen: RegenPolicy) -> Self {
        Self {
            runner,
            clock,
            toolchain,
            regen,
        }
    }

    /// Bring the event file and current results up to date.
    fn regenerate(&self, tc: &TestCase) -> anyhow::Result<()> {
        let mut sim_sources: Vec<&Path> = tc.stage_macros.iter().map(PathBuf::as_path).collect();
        if let Some(rat) = &self.toolchain.rat {
            sim_sources.push(rat);
        }
        let simulate = self.regen.force_simulation || needs_update(&tc.event_file, &sim_sources);
        if simulate {
            let rat = self.toolchain.rat()?;
            SimulateUseCase::new(self.runner.clone()).execute(tc, rat)?;
        } else {
            debug!(test = %tc.name, "event file up to date");
        }

        // A rerun simulation always invalidates the results.
        let post_sources = [tc.event_file.as_path(), tc.post_script.as_path()];
        if simulate
            || self.regen.force_post_process
            || needs_update(&tc.current_results, &post_sources)
        {
            PostProcessUseCase::new(self.runner.clone())
                .execute(tc, self.toolchain.root.as_deref())?;
        } else {
            debug!(test = %tc.name, "current results up to date");
        }
        Ok(())
    }

    /// Regenerate, compare and write `results.html`.
    pub fn run(&self, tc: &TestCase) -> anyhow::Result<CaseOutcome> {
        self.regenerate(tc)?;
        let cmp = CompareUseCase::execute(tc)?;

        let mut report = ReportBuilder::new(&tc.name, &tc.description)
            .generated_at(self.clock.now_rfc3339());
        for r in &cmp.results {
            report.append(r.clone());
        }
        let html = report.render()?;
        atomic_write(&tc.report, html.as_bytes())
            .with_context(|| format!("write report {}", tc.report.display()))?;
        info!(test = %tc.name, report = %tc.report.display(), "report written");

        let failed = cmp.results.iter().filter(|r| !r.pass).count();
        let (status, message) = if cmp.results.is_empty() {
            (TestStatus::Failed, Some("no common histograms".to_string()))
        } else if cmp.overall_pass {
            (TestStatus::Passed, None)
        } else {
            (
                TestStatus::Failed,
                Some(format!(
                    "{failed} of {} histograms failed the KS test",
                    cmp.results.len()
                )),
            )
        };

        Ok(CaseOutcome {
            outcome: TestOutcome {
                name: tc.name.clone(),
                status,
                message,
            },
            results: cmp.results,
            report: Some(tc.report.clone()),
        })
    }

    /// Regenerate, then make the current results the new standard.
    pub fn update(&self, tc: &TestCase) -> anyhow::Result<CaseOutcome> {
        self.regenerate(tc)?;
        atomic_copy(&tc.current_results, &tc.standard_results).with_context(|| {
            format!(
                "copy {} over {}",
                tc.current_results.display(),
                tc.standard_results.display()
            )
        })?;
        info!(test = %tc.name, "standard results updated");

        Ok(CaseOutcome {
            outcome: TestOutcome {
                name: tc.name.clone(),
                status: TestStatus::Updated,
                message: None,
            },
            results: Vec::new(),
            report: None,
        })
    }

    /// Load and process every config in order.
    ///
    /// A failing test case is recorded and the batch moves on.
    pub fn execute_batch(&self, configs: &[PathBuf], mode: Mode) -> BatchOutcome {
        let mut batch = BatchOutcome::default();

        for path in configs {
            let tc = match load_test_case(path) {
                Ok(tc) => tc,
                Err(err) => {
                    let err = anyhow::Error::from(err);
                    error!(config = %path.display(), "{err:#}");
                    batch
                        .cases
                        .push(CaseOutcome::errored(name_from_config_path(path), &err));
                    continue;
                }
            };

            info!(test = %tc.name, description = %tc.description, "starting test");
            let result = match mode {
                Mode::Compare => self.run(&tc),
                Mode::Update => self.update(&tc),
            };
            match result {
                Ok(case) => batch.cases.push(case),
                Err(err) => {
                    error!(test = %tc.name, "{err:#}");
                    batch.cases.push(CaseOutcome::errored(tc.name.clone(), &err));
                }
            }
        }

        batch
    }
}
