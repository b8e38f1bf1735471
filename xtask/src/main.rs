use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Repo automation for rattest")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// (Re)generate JSON Schemas for the results document and config file.
    Schema {
        /// Output directory
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },

    /// Check results documents (standard.json, current.json) against the schema.
    Validate {
        /// Results files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Run the "usual" repo checks (fmt, clippy, test, schema).
    Ci,

    /// Run mutation testing via cargo-mutants (must be installed).
    Mutants {
        /// Extra args forwarded to cargo-mutants
        #[arg(trailing_var_arg = true)]
        args: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Schema { out_dir } => cmd_schema(&out_dir),
        Command::Validate { files } => cmd_validate(&files),
        Command::Ci => cmd_ci(),
        Command::Mutants { args } => cmd_mutants(args),
    }
}

fn cmd_ci() -> anyhow::Result<()> {
    run("cargo", ["fmt", "--all", "--", "--check"])?;
    run(
        "cargo",
        ["clippy", "--all-targets", "--all-features", "--", "-D", "warnings"],
    )?;
    run("cargo", ["test", "--all"])?;
    run("cargo", ["run", "-p", "xtask", "--", "schema"])?;
    Ok(())
}

fn cmd_mutants(args: Vec<String>) -> anyhow::Result<()> {
    let status = std::process::Command::new("cargo")
        .arg("mutants")
        .args(&args)
        .status()
        .context("running cargo mutants")?;
    if !status.success() {
        bail!("cargo mutants failed: {status}");
    }
    Ok(())
}

fn run<const N: usize>(bin: &str, args: [&str; N]) -> anyhow::Result<()> {
    let status = std::process::Command::new(bin)
        .args(args)
        .status()
        .with_context(|| format!("running {bin}"))?;
    if !status.success() {
        bail!("{bin} failed: {status}");
    }
    Ok(())
}

fn cmd_schema(out_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create dir {}", out_dir.display()))?;

    write_schema(
        out_dir,
        "rattest.results.v1.schema.json",
        schema_for!(rattest_types::ResultsDocument),
    )?;

    write_schema(
        out_dir,
        "rattest.config.schema.json",
        schema_for!(rattest_types::ConfigFile),
    )?;

    Ok(())
}

fn write_schema<T: serde::Serialize>(out_dir: &Path, name: &str, schema: T) -> anyhow::Result<()> {
    let path = out_dir.join(name);
    let json = serde_json::to_vec_pretty(&schema)?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn cmd_validate(files: &[PathBuf]) -> anyhow::Result<()> {
    let schema = serde_json::to_value(schema_for!(rattest_types::ResultsDocument))?;
    let validator =
        jsonschema::validator_for(&schema).map_err(|e| anyhow!("invalid results schema: {e}"))?;

    let mut failures = 0;
    for path in files {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let instance: serde_json::Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;

        let errors: Vec<String> = validator
            .iter_errors(&instance)
            .map(|e| format!("{}: {e}", e.instance_path))
            .collect();
        if errors.is_empty() {
            println!("ok    {}", path.display());
        } else {
            failures += 1;
            println!("FAIL  {}", path.display());
            for e in errors {
                println!("      {e}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} results files failed validation", files.len());
    }
    Ok(())
}
