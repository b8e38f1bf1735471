//! Comparing current results against the standard ones.

use anyhow::{Context, bail};
use rattest_config::TestCase;
use rattest_domain::compare_documents;
use rattest_render::render_overlay;
use rattest_types::{ComparisonResult, RESULTS_SCHEMA_V1, ResultsDocument};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn load_results(path: &Path) -> anyhow::Result<ResultsDocument> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let doc = ResultsDocument::from_slice(&bytes)
        .with_context(|| format!("parse results {}", path.display()))?;
    if doc.schema != RESULTS_SCHEMA_V1 {
        bail!(
            "{}: unsupported results schema {:?} (expected {RESULTS_SCHEMA_V1})",
            path.display(),
            doc.schema
        );
    }
    Ok(doc)
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Overlay plot file names for `names`, one per name and all distinct.
///
/// Names are reduced to file-safe characters. Names that collide after that
/// get their position appended.
pub fn plot_file_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let stems: Vec<String> = names.iter().map(|n| file_stem(n.as_ref())).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for stem in &stems {
        *counts.entry(stem.as_str()).or_default() += 1;
    }

    let mut taken: HashSet<String> = stems
        .iter()
        .filter(|s| counts[s.as_str()] == 1)
        .map(|s| format!("{s}.svg"))
        .collect();

    stems
        .iter()
        .enumerate()
        .map(|(i, stem)| {
            if counts[stem.as_str()] == 1 {
                return format!("{stem}.svg");
            }
            let mut n = i;
            loop {
                let candidate = format!("{stem}_{n}.svg");
                if taken.insert(candidate.clone()) {
                    return candidate;
                }
                n += stems.len();
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareOutcome {
    pub overall_pass: bool,

    /// Sorted by histogram name, with `plot` set where drawing succeeded.
    pub results: Vec<ComparisonResult>,
}

pub struct CompareUseCase;

impl CompareUseCase {
    /// Compare `tc`'s current results against its standard and draw one
    /// overlay per common histogram into the test directory.
    pub fn execute(tc: &TestCase) -> anyhow::Result<CompareOutcome> {
        if !tc.standard_results.exists() {
            bail!(
                "no standard results at {}; run with -u to create them",
                tc.standard_results.display()
            );
        }
        let standard = load_results(&tc.standard_results)?;
        let current = load_results(&tc.current_results)?;

        let cmp = compare_documents(&standard, &current, tc.ks_threshold)
            .with_context(|| format!("compare histograms of {}", tc.name))?;

        for name in &cmp.standard_only {
            warn!(test = %tc.name, histogram = %name, "histogram only in standard results; skipped");
        }
        for name in &cmp.current_only {
            warn!(test = %tc.name, histogram = %name, "histogram only in current results; skipped");
        }
        for w in &cmp.warnings {
            warn!(test = %tc.name, "{w}");
        }
        if cmp.no_common_histograms() {
            warn!(test = %tc.name, "no common histograms between standard and current results");
        }

        let mut results = cmp.results;
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        let files = plot_file_names(&names);
        for (r, file) in results.iter_mut().zip(files) {
            let title = if r.title.is_empty() { &r.name } else { &r.title };
            let drawn = render_overlay(
                &tc.dir.join(&file),
                title,
                &standard.objects[&r.name],
                &current.objects[&r.name],
                tc.plot_options,
            );
            match drawn {
                Ok(()) => r.plot = Some(file),
                Err(err) => {
                    warn!(test = %tc.name, histogram = %r.name, "overlay plot not drawn: {err:#}")
                }
            }

            info!(
                test = %tc.name,
                histogram = %r.name,
                probability = r.score,
                pass = r.pass,
                "KS test"
            );
        }

        Ok(CompareOutcome {
            overall_pass: cmp.overall_pass,
            results,
        })
    }
}
