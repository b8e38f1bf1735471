//! HTML report for one test case.

use anyhow::Context;
use handlebars::Handlebars;
use rattest_types::{ComparisonResult, FitParameter};
use serde::Serialize;

const REPORT_TEMPLATE: &str = include_str!("../templates/report.html.hbs");

/// Collects comparison records and renders them as one HTML page.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    name: String,
    description: String,
    generated_at: String,
    entries: Vec<ComparisonResult>,
}

#[derive(Serialize)]
struct ReportView<'a> {
    name: &'a str,
    description: &'a str,
    generated_at: &'a str,
    verdict: &'static str,
    verdict_class: &'static str,
    histograms: Vec<HistogramView<'a>>,
}

#[derive(Serialize)]
struct HistogramView<'a> {
    name: &'a str,
    title: &'a str,
    verdict: &'static str,
    verdict_class: &'static str,
    plot: Option<&'a str>,
    probability: String,
    fit_rows: Vec<FitRow<'a>>,
}

#[derive(Serialize)]
struct FitRow<'a> {
    name: &'a str,
    standard: String,
    current: String,
    delta: String,
    sigma: String,
    sigma_class: &'static str,
}

fn verdict(pass: bool) -> (&'static str, &'static str) {
    if pass {
        ("Success", "pass")
    } else {
        ("Failure", "fail")
    }
}

fn value_with_error(value: f64, error: f64) -> String {
    format!("{value:.6} (+/- {error:.3})")
}

impl<'a> From<&'a FitParameter> for FitRow<'a> {
    fn from(p: &'a FitParameter) -> Self {
        FitRow {
            name: &p.name,
            standard: value_with_error(p.reference_value, p.reference_error),
            current: value_with_error(p.current_value, p.current_error),
            delta: format!("{:+.6}", p.delta),
            sigma: format!("{:.1}", p.sigma),
            sigma_class: if p.is_flagged() { "fail" } else { "pass" },
        }
    }
}

impl<'a> From<&'a ComparisonResult> for HistogramView<'a> {
    fn from(r: &'a ComparisonResult) -> Self {
        let (verdict, verdict_class) = verdict(r.pass);
        HistogramView {
            name: &r.name,
            title: &r.title,
            verdict,
            verdict_class,
            plot: r.plot.as_deref(),
            probability: format!("{:.6}", r.score),
            fit_rows: r
                .fit_parameters
                .iter()
                .flatten()
                .map(FitRow::from)
                .collect(),
        }
    }
}

impl ReportBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Timestamp shown in the page header.
    pub fn generated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.generated_at = timestamp.into();
        self
    }

    pub fn append(&mut self, result: ComparisonResult) {
        self.entries.push(result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An empty report never passes.
    pub fn overall_pass(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|r| r.pass)
    }

    /// Render the page with records ordered by histogram name.
    pub fn render(&self) -> anyhow::Result<String> {
        let mut sorted: Vec<&ComparisonResult> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let (verdict, verdict_class) = verdict(self.overall_pass());
        let view = ReportView {
            name: &self.name,
            description: &self.description,
            generated_at: &self.generated_at,
            verdict,
            verdict_class,
            histograms: sorted.into_iter().map(HistogramView::from).collect(),
        };

        let mut hb = Handlebars::new();
        hb.register_template_string("report", REPORT_TEMPLATE)
            .context("register report template")?;
        hb.render("report", &view).context("render report")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, score: f64, pass: bool) -> ComparisonResult {
        ComparisonResult {
            name: name.to_string(),
            title: String::new(),
            score,
            pass,
            plot: Some(format!("{name}.svg")),
            fit_parameters: None,
        }
    }

    fn param(sigma: f64) -> FitParameter {
        FitParameter {
            name: "Mean".into(),
            reference_value: 10.0,
            reference_error: 0.1,
            current_value: 10.2,
            current_error: 0.1,
            delta: 0.2,
            sigma,
        }
    }

    #[test]
    fn records_are_written_sorted_by_name() {
        let mut report = ReportBuilder::new("electron", "Electrons at the center");
        report.append(result("hZ", 0.5, true));
        report.append(result("hA", 0.5, true));
        report.append(result("hM", 0.5, true));
        let html = report.render().unwrap();

        let a = html.find("hA: Success").unwrap();
        let m = html.find("hM: Success").unwrap();
        let z = html.find("hZ: Success").unwrap();
        assert!(a < m && m < z);
    }

    #[test]
    fn header_shows_name_description_and_timestamp() {
        let report = ReportBuilder::new("electron", "Electrons at the center")
            .generated_at("2024-05-01T12:00:00Z");
        let html = report.render().unwrap();
        assert!(html.contains("<title>RAT Test: electron</title>"));
        assert!(html.contains("Electrons at the center"));
        assert!(html.contains("2024-05-01T12:00:00Z"));
        assert!(html.contains("Overall: <span class=\"fail\">Failure</span>"));
    }

    #[test]
    fn histogram_block_shows_plot_probability_and_verdict() {
        let mut report = ReportBuilder::new("t", "");
        report.append(result("hEnergy", 0.123456789, false));
        let html = report.render().unwrap();
        assert!(html.contains("<h3 class=\"fail\">hEnergy: Failure</h3>"));
        assert!(html.contains("<img src=\"hEnergy.svg\""));
        assert!(html.contains("Blue: Standard, Red: Current Code"));
        assert!(html.contains("KS Probability: 0.123457"));
    }

    #[test]
    fn fit_table_colours_sigma() {
        let mut r = result("hFit", 1.0, true);
        r.fit_parameters = Some(vec![param(1.41421356), param(3.5)]);
        let mut report = ReportBuilder::new("t", "");
        report.append(r);
        let html = report.render().unwrap();

        assert!(html.contains("<th>Parameter Name</th>"));
        assert!(html.contains("10.000000 (+/- 0.100)"));
        assert!(html.contains("10.200000 (+/- 0.100)"));
        assert!(html.contains("<td class=\"pass\">1.4&sigma;</td>"));
        assert!(html.contains("<td class=\"fail\">3.5&sigma;</td>"));
    }

    #[test]
    fn fit_table_shows_delta_next_to_sigma() {
        let mut shifted = param(3.5);
        shifted.current_value = 9.5;
        shifted.delta = -0.5;
        let mut r = result("hFit", 1.0, true);
        r.fit_parameters = Some(vec![param(1.41421356), shifted]);
        let mut report = ReportBuilder::new("t", "");
        report.append(r);
        let html = report.render().unwrap();

        assert!(html.contains("<th>Delta</th><th>Diff</th>"));
        assert!(html.contains("<td>+0.200000</td><td class=\"pass\">1.4&sigma;</td>"));
        assert!(html.contains("<td>-0.500000</td><td class=\"fail\">3.5&sigma;</td>"));
    }

    #[test]
    fn no_fit_table_without_parameters() {
        let mut report = ReportBuilder::new("t", "");
        report.append(result("h", 1.0, true));
        assert!(!report.render().unwrap().contains("<table>"));
    }

    #[test]
    fn user_strings_are_escaped() {
        let mut report = ReportBuilder::new("t", "<script>alert(1)</script>");
        report.append(result("h<b>", 1.0, true));
        let html = report.render().unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("h&lt;b&gt;: Success"));
    }

    #[test]
    fn overall_pass_requires_every_record() {
        let mut report = ReportBuilder::new("t", "");
        assert!(!report.overall_pass());
        report.append(result("a", 1.0, true));
        assert!(report.overall_pass());
        report.append(result("b", 0.0, false));
        assert!(!report.overall_pass());
        assert_eq!(report.len(), 2);
    }
}
