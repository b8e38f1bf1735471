//! Shared types for rattest.
//!
//! Design goal: versioned, explicit, boring.
//! These structs describe the per-test config file, the histogram results
//! documents written by post-processors, and the comparison records that
//! feed the HTML report.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RESULTS_SCHEMA_V1: &str = "rattest.results.v1";

/// File name that marks a directory as one test case.
pub const CONFIG_FILE_NAME: &str = "rattest.config";
pub const STANDARD_RESULTS_FILE: &str = "standard.json";
pub const CURRENT_RESULTS_FILE: &str = "current.json";
pub const REPORT_FILE_NAME: &str = "results.html";

pub const DEFAULT_KS_THRESHOLD: f64 = 0.01;
pub const DEFAULT_NUM_MACROS: u32 = 1;

/// Seed value meaning "let the simulation pick its own seed".
pub const UNSET_SEED: i64 = -1;

/// The only attached-function kind whose parameters are compared.
pub const FIT_FUNCTION_CLASS: &str = "TF1";

/// Deviations above this many combined standard deviations are flagged.
pub const SIGMA_FLAG_THRESHOLD: f64 = 2.0;

// ----------------------------
// Config file
// ----------------------------

/// Contents of a `rattest.config` file.
///
/// The key set is closed: unknown keys are a parse error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Simulation macro, relative to the test directory.
    pub rat_macro: String,

    /// Post-processing script, relative to the test directory.
    pub root_macro: String,

    #[serde(default)]
    pub description: String,

    /// `-1` leaves the seed to the simulation.
    #[serde(default = "default_seed")]
    pub seed: i64,

    #[serde(rename = "KS_threshold", default = "default_ks_threshold")]
    pub ks_threshold: f64,

    #[serde(default = "default_num_macros")]
    pub num_macros: u32,

    /// Presence selects the compiled post-processing convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_options: Option<PlotOptions>,
}

fn default_seed() -> i64 {
    UNSET_SEED
}

fn default_ks_threshold() -> f64 {
    DEFAULT_KS_THRESHOLD
}

fn default_num_macros() -> u32 {
    DEFAULT_NUM_MACROS
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlotOptions {
    #[serde(rename = "logX", default)]
    pub log_x: bool,

    #[serde(rename = "logY", default)]
    pub log_y: bool,
}

/// How the post-processing script is handed its arguments.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostProcessKind {
    /// ROOT macro compiled with ACLiC before running.
    CompiledMacro,
    /// ROOT macro run by the interpreter.
    InterpretedMacro,
    /// Any other executable, called with two positional arguments.
    Executable,
}

// ----------------------------
// Results document
// ----------------------------

/// Collection of named histograms written by a post-processing script.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ResultsDocument {
    pub schema: String,
    pub objects: BTreeMap<String, Histogram>,
}

impl ResultsDocument {
    pub fn new(objects: BTreeMap<String, Histogram>) -> Self {
        Self {
            schema: RESULTS_SCHEMA_V1.to_string(),
            objects,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }
}

/// A one-dimensional binned distribution.
///
/// `edges` holds `contents.len() + 1` increasing bin boundaries. Under- and
/// overflow are not stored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct Histogram {
    #[serde(default)]
    pub title: String,

    #[serde(default = "default_histogram_class")]
    pub class: String,

    pub edges: Vec<f64>,
    pub contents: Vec<f64>,

    /// Per-bin uncertainty (sqrt of the summed squared weights).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<f64>>,

    pub entries: f64,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FitFunction>,
}

fn default_histogram_class() -> String {
    "TH1D".to_string()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HistogramError {
    #[error("histogram has {edges} edges for {bins} bins (expected bins + 1)")]
    EdgeCount { edges: usize, bins: usize },

    #[error("bin edges must be finite and strictly increasing")]
    UnorderedEdges,

    #[error("histogram has {errors} bin errors for {bins} bins")]
    ErrorCount { errors: usize, bins: usize },
}

impl Histogram {
    /// Build a histogram with uniform bins over `[low, high)`.
    pub fn uniform(title: &str, bins: usize, low: f64, high: f64) -> Self {
        let width = (high - low) / bins as f64;
        let mut edges: Vec<f64> = (0..=bins).map(|i| low + width * i as f64).collect();
        edges[bins] = high;
        Self {
            title: title.to_string(),
            class: default_histogram_class(),
            edges,
            contents: vec![0.0; bins],
            errors: None,
            entries: 0.0,
            functions: Vec::new(),
        }
    }

    /// Increment the bin containing `x`; values outside the range only count as entries.
    pub fn fill(&mut self, x: f64) {
        self.entries += 1.0;
        if let Some(i) = self.find_bin(x) {
            self.contents[i] += 1.0;
        }
    }

    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if self.edges.len() < 2 || x < self.edges[0] || x >= self.edges[self.edges.len() - 1] {
            return None;
        }
        let idx = self.edges.partition_point(|e| *e <= x);
        Some(idx - 1)
    }

    pub fn validate(&self) -> Result<(), HistogramError> {
        let bins = self.contents.len();
        if self.edges.len() != bins + 1 {
            return Err(HistogramError::EdgeCount {
                edges: self.edges.len(),
                bins,
            });
        }
        let ordered = self
            .edges
            .windows(2)
            .all(|w| w[0].is_finite() && w[1].is_finite() && w[0] < w[1]);
        if !ordered {
            return Err(HistogramError::UnorderedEdges);
        }
        if let Some(errors) = &self.errors
            && errors.len() != bins
        {
            return Err(HistogramError::ErrorCount {
                errors: errors.len(),
                bins,
            });
        }
        Ok(())
    }

    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    /// Sum of bin contents.
    pub fn integral(&self) -> f64 {
        self.contents.iter().sum()
    }

    /// Number of unweighted entries carrying the same statistical power.
    ///
    /// Uses `integral² / Σ errors²` when per-bin errors are known, else the
    /// entry count, else the integral.
    pub fn effective_entries(&self) -> f64 {
        if let Some(errors) = &self.errors {
            let sumw2: f64 = errors.iter().map(|e| e * e).sum();
            if sumw2 > 0.0 {
                let sum = self.integral();
                return sum * sum / sumw2;
            }
        }
        if self.entries > 0.0 {
            self.entries
        } else {
            self.integral()
        }
    }

    /// Running sum of contents normalised to end at 1.
    ///
    /// Returns an empty vector when the integral is zero.
    pub fn cumulative(&self) -> Vec<f64> {
        let total = self.integral();
        if total == 0.0 {
            return Vec::new();
        }
        let mut running = 0.0;
        self.contents
            .iter()
            .map(|c| {
                running += c;
                running / total
            })
            .collect()
    }

    pub fn min_content(&self) -> Option<f64> {
        self.contents.iter().copied().reduce(f64::min)
    }

    pub fn max_content(&self) -> Option<f64> {
        self.contents.iter().copied().reduce(f64::max)
    }

    pub fn first_low_edge(&self) -> Option<f64> {
        self.edges.first().copied()
    }

    /// True when both histograms have the same bin count and edges.
    pub fn same_binning(&self, other: &Histogram) -> bool {
        if self.edges.len() != other.edges.len() {
            return false;
        }
        self.edges.iter().zip(&other.edges).all(|(a, b)| {
            let scale = a.abs().max(b.abs()).max(1.0);
            (a - b).abs() <= 1e-9 * scale
        })
    }
}

/// A function attached to a histogram, usually the result of a fit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct FitFunction {
    pub class: String,
    pub name: String,
    pub parameters: Vec<FunctionParameter>,
}

impl FitFunction {
    pub fn is_fit_kind(&self) -> bool {
        self.class == FIT_FUNCTION_CLASS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct FunctionParameter {
    pub name: String,
    pub value: f64,
    pub error: f64,
}

// ----------------------------
// Comparison records
// ----------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FitParameter {
    pub name: String,
    pub reference_value: f64,
    pub reference_error: f64,
    pub current_value: f64,
    pub current_error: f64,

    /// current - reference
    pub delta: f64,

    /// |delta| in units of the combined uncertainty.
    pub sigma: f64,
}

impl FitParameter {
    pub fn is_flagged(&self) -> bool {
        self.sigma > SIGMA_FLAG_THRESHOLD
    }
}

/// Outcome of comparing one named histogram pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonResult {
    pub name: String,
    pub title: String,

    /// KS compatibility probability in [0, 1].
    pub score: f64,
    pub pass: bool,

    /// Overlay plot file, relative to the report.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit_parameters: Option<Vec<FitParameter>>,
}

// ----------------------------
// Batch outcomes
// ----------------------------

#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Errored,
    Updated,
}

impl TestStatus {
    pub fn is_success(self) -> bool {
        matches!(self, TestStatus::Passed | TestStatus::Updated)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
