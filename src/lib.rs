//! rattest workspace-level test support.
//!
//! This crate exists solely to host workspace-level integration tests,
//! particularly the BDD/cucumber tests in `tests/cucumber.rs`.
//!
//! The actual rattest functionality is in the workspace member crates:
//! - `rattest-types`: config, results-document and comparison contracts
//! - `rattest-domain`: KS test, pass policy and fit comparison
//! - `rattest-adapters`: process, filesystem and browser adapters
//! - `rattest-config`: test-case loading and discovery
//! - `rattest-render`: HTML report and overlay plots
//! - `rattest-app`: application use cases
//! - `rattest` (rattest-cli): CLI interface
