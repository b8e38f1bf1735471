//! Workspace-level integration tests spanning several rattest crates.

mod discovery;
mod results_format;
