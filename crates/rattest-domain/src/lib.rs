//! Domain logic for rattest.
//!
//! This crate is intentionally I/O-free: it does statistics and policy.

mod fit;
mod ks;

pub use fit::{extract_fit_params, sigma_deviation};
pub use ks::{kolmogorov_prob, ks_probability, max_cumulative_distance};

use rattest_types::{ComparisonResult, HistogramError, ResultsDocument};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("invalid histogram: {0}")]
    InvalidHistogram(HistogramError),

    #[error("histograms have incompatible binning ({left} vs {right} bins)")]
    IncompatibleBinning { left: usize, right: usize },

    #[error(
        "fit on {histogram} has {reference} parameters in the standard and {current} in the current results"
    )]
    FitParameterMismatch {
        histogram: String,
        reference: usize,
        current: usize,
    },

    #[error("KS threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
}

/// Pass rule applied to each histogram's KS probability.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum KsPolicy {
    /// Every histogram must score exactly 1.
    ExactMatch,

    /// Bonferroni-corrected: the configured threshold is shared by all
    /// compared histograms.
    Corrected { critical_probability: f64 },
}

impl KsPolicy {
    /// Policy for `n_compared` histograms under a configured threshold.
    ///
    /// A threshold of exactly 1 selects [`KsPolicy::ExactMatch`].
    pub fn new(threshold: f64, n_compared: usize) -> Result<Self, DomainError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(DomainError::InvalidThreshold(threshold));
        }
        if threshold == 1.0 {
            return Ok(KsPolicy::ExactMatch);
        }
        Ok(KsPolicy::Corrected {
            critical_probability: threshold / n_compared.max(1) as f64,
        })
    }

    pub fn passes(&self, score: f64) -> bool {
        match self {
            KsPolicy::ExactMatch => score == 1.0,
            KsPolicy::Corrected {
                critical_probability,
            } => score > *critical_probability,
        }
    }
}

/// Outcome of comparing a current results document against the standard.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub overall_pass: bool,

    /// One record per common histogram, sorted by name.
    pub results: Vec<ComparisonResult>,

    /// Histograms present only in the standard results.
    pub standard_only: Vec<String>,

    /// Histograms present only in the current results.
    pub current_only: Vec<String>,

    /// Non-fatal problems found while scoring (for logs).
    pub warnings: Vec<String>,
}

impl Comparison {
    /// True when the two documents had no histogram name in common.
    pub fn no_common_histograms(&self) -> bool {
        self.results.is_empty()
    }
}

/// Score two histograms; both having zero entries counts as identical.
pub fn compatibility_score(
    reference: &rattest_types::Histogram,
    current: &rattest_types::Histogram,
) -> Result<f64, DomainError> {
    if reference.entries == 0.0 && current.entries == 0.0 {
        return Ok(1.0);
    }
    ks_probability(reference, current)
}

/// Compare every histogram the two documents have in common.
///
/// Histograms that cannot be scored (bad binning) get a score of 0 and a
/// warning. A fit parameter count mismatch aborts the comparison.
pub fn compare_documents(
    standard: &ResultsDocument,
    current: &ResultsDocument,
    ks_threshold: f64,
) -> Result<Comparison, DomainError> {
    let standard_only: Vec<String> = standard
        .objects
        .keys()
        .filter(|k| !current.objects.contains_key(*k))
        .cloned()
        .collect();
    let current_only: Vec<String> = current
        .objects
        .keys()
        .filter(|k| !standard.objects.contains_key(*k))
        .cloned()
        .collect();
    let common: Vec<&String> = standard
        .objects
        .keys()
        .filter(|k| current.objects.contains_key(*k))
        .collect();

    let mut warnings = Vec::new();

    if common.is_empty() {
        return Ok(Comparison {
            overall_pass: false,
            results: Vec::new(),
            standard_only,
            current_only,
            warnings,
        });
    }

    let policy = KsPolicy::new(ks_threshold, common.len())?;
    let mut results = Vec::with_capacity(common.len());

    for name in common {
        let s = &standard.objects[name];
        let c = &current.objects[name];

        let score = match compatibility_score(s, c) {
            Ok(score) => score,
            Err(err) => {
                warnings.push(format!("{name}: {err}"));
                0.0
            }
        };

        if s.functions.len() > 1 || c.functions.len() > 1 {
            warnings.push(format!(
                "{name}: more than one attached function, fit parameters not compared"
            ));
        }
        let fit_parameters = extract_fit_params(name, s, c)?;

        results.push(ComparisonResult {
            name: name.clone(),
            title: c.title.clone(),
            score,
            pass: policy.passes(score),
            plot: None,
            fit_parameters,
        });
    }

    let overall_pass = results.iter().all(|r| r.pass);

    Ok(Comparison {
        overall_pass,
        results,
        standard_only,
        current_only,
        warnings,
    })
}
