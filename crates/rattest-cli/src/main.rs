use anyhow::Context;
use clap::{ArgAction, Parser};
use rattest_adapters::{BrowserViewer, StdProcessRunner, Viewer};
use rattest_app::{
    BatchOutcome, Mode, RegenPolicy, SystemClock, TestCaseUseCase, Toolchain, scaffold_template,
};
use rattest_config::discover_tests;
use rattest_types::TestStatus;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "rattest",
    version,
    about = "Run RAT regression tests and compare their histograms against the standard"
)]
struct Cli {
    /// Test directories, searched recursively for rattest.config
    #[arg(required_unless_present = "make_template")]
    input: Vec<PathBuf>,

    /// Replace the standard results with the current ones instead of comparing
    #[arg(short = 'u', long)]
    update: bool,

    /// Rerun the simulation even if the event file is up to date
    #[arg(short = 'm', long)]
    regen_mc: bool,

    /// Rerun the post-processor even if the current results are up to date
    #[arg(short = 'r', long)]
    regen_plots: bool,

    /// Do not open reports in a web browser
    #[arg(short = 't', long)]
    text_only: bool,

    /// Write a template test named NAME into the current directory and exit
    #[arg(long, value_name = "NAME")]
    make_template: Option<String>,

    /// More log output (repeatable); RATTEST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("RATTEST_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn real_main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(name) = &cli.make_template {
        let cwd = std::env::current_dir().context("current directory")?;
        scaffold_template(&cwd, name)?;
        println!("Wrote template test {name} to {}", cwd.display());
        return Ok(ExitCode::SUCCESS);
    }

    let configs = discover_tests(&cli.input)?;
    if configs.is_empty() {
        warn!("no {} found under the given inputs", rattest_types::CONFIG_FILE_NAME);
    }

    let mode = if cli.update {
        Mode::Update
    } else {
        Mode::Compare
    };
    let regen = RegenPolicy {
        force_simulation: cli.regen_mc,
        force_post_process: cli.regen_plots,
    };
    let usecase = TestCaseUseCase::new(StdProcessRunner, SystemClock, Toolchain::locate(), regen);
    let batch = usecase.execute_batch(&configs, mode);

    print_summary(&batch);

    if mode == Mode::Compare && !cli.text_only {
        let viewer = BrowserViewer;
        for report in batch.cases.iter().filter_map(|c| c.report.as_ref()) {
            if let Err(err) = viewer.open(report) {
                warn!("could not open {}: {err}", report.display());
            }
        }
    }

    if mode == Mode::Update || batch.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn status_label(status: TestStatus) -> &'static str {
    match status {
        TestStatus::Passed => "PASSED",
        TestStatus::Failed => "FAILED",
        TestStatus::Errored => "ERROR",
        TestStatus::Updated => "UPDATED",
    }
}

fn print_summary(batch: &BatchOutcome) {
    for case in &batch.cases {
        for r in &case.results {
            println!(
                "  {:<30} KS probability {:.6}  {}",
                r.name,
                r.score,
                if r.pass { "ok" } else { "FAIL" }
            );
        }
        let outcome = &case.outcome;
        match &outcome.message {
            Some(msg) => println!("{}: {} ({msg})", outcome.name, status_label(outcome.status)),
            None => println!("{}: {}", outcome.name, status_label(outcome.status)),
        }
    }

    info!(
        passed = batch.count(TestStatus::Passed),
        failed = batch.count(TestStatus::Failed),
        errored = batch.count(TestStatus::Errored),
        updated = batch.count(TestStatus::Updated),
        "done"
    );
}
