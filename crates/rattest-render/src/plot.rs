//! Overlay plots of a reference and a current histogram.

use anyhow::bail;
use plotters::prelude::*;
use rattest_types::{Histogram, PlotOptions};
use std::ops::Range;
use std::path::Path;

const PLOT_SIZE: (u32, u32) = (800, 600);

/// Axis ranges of an overlay, in drawing coordinates.
///
/// When an axis is logarithmic its range holds log10 values.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFrame {
    pub x: Range<f64>,
    pub y: Range<f64>,
    pub log_x: bool,
    pub log_y: bool,
}

impl PlotFrame {
    /// Frame covering both histograms, or `None` if either has no bins or
    /// the ranges do not fit in finite floating point.
    ///
    /// The y range is padded by a tenth of the combined span on both sides.
    /// Log scales are only honoured where every plotted value is positive.
    pub fn new(reference: &Histogram, current: &Histogram, options: PlotOptions) -> Option<Self> {
        if reference.n_bins() == 0 || current.n_bins() == 0 {
            return None;
        }
        let all_finite = |h: &Histogram| h.contents.iter().chain(&h.edges).all(|v| v.is_finite());
        if !all_finite(reference) || !all_finite(current) {
            return None;
        }
        let x_lo = reference.first_low_edge()?.min(current.first_low_edge()?);
        let x_hi = f64::max(*reference.edges.last()?, *current.edges.last()?);

        let y_min = reference.min_content()?.min(current.min_content()?);
        let y_max = reference.max_content()?.max(current.max_content()?);
        let span = y_max - y_min;
        let pad = if span > 0.0 {
            0.1 * span
        } else {
            0.1 * y_max.abs().max(1.0)
        };
        let (y_lo, y_hi) = (y_min - pad, y_max + pad);
        let bounds = [x_lo, x_hi, x_hi - x_lo, y_lo, y_hi, y_hi - y_lo];
        if !bounds.iter().all(|v| v.is_finite()) {
            return None;
        }

        let log_x = options.log_x && x_lo > 0.0;
        let log_y = options.log_y && y_lo > 0.0;

        Some(Self {
            x: if log_x {
                x_lo.log10()..x_hi.log10()
            } else {
                x_lo..x_hi
            },
            y: if log_y {
                y_lo.log10()..y_hi.log10()
            } else {
                y_lo..y_hi
            },
            log_x,
            log_y,
        })
    }

    fn map_x(&self, x: f64) -> f64 {
        if self.log_x { x.log10() } else { x }
    }

    fn map_y(&self, y: f64) -> f64 {
        if self.log_y { y.log10() } else { y }
    }

    /// Outline of `h` as a step line, one horizontal segment per bin.
    pub fn step_points(&self, h: &Histogram) -> Vec<(f64, f64)> {
        h.edges
            .windows(2)
            .zip(&h.contents)
            .flat_map(|(w, c)| {
                let y = self.map_y(*c);
                [(self.map_x(w[0]), y), (self.map_x(w[1]), y)]
            })
            .collect()
    }
}

fn axis_label(value: f64, log: bool) -> String {
    if log {
        format!("{:.2e}", 10f64.powf(value))
    } else {
        format!("{value:.3}")
    }
}

/// Draw `reference` (blue, solid) and `current` (red, dashed) into an SVG file.
pub fn render_overlay(
    path: &Path,
    title: &str,
    reference: &Histogram,
    current: &Histogram,
    options: PlotOptions,
) -> anyhow::Result<()> {
    let Some(frame) = PlotFrame::new(reference, current, options) else {
        bail!("cannot plot {title}: no bins or axis range out of floating point range");
    };

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(frame.x.clone(), frame.y.clone())?;

    let x_fmt = |v: &f64| axis_label(*v, frame.log_x);
    let y_fmt = |v: &f64| axis_label(*v, frame.log_y);
    chart
        .configure_mesh()
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            frame.step_points(reference),
            BLUE.stroke_width(2),
        ))?
        .label("Standard")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .draw_series(DashedLineSeries::new(
            frame.step_points(current),
            6,
            4,
            RED.stroke_width(2),
        ))?
        .label("Current")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hist(low: f64, high: f64, contents: &[f64]) -> Histogram {
        let mut h = Histogram::uniform("h", contents.len(), low, high);
        h.contents = contents.to_vec();
        h.entries = contents.iter().sum();
        h
    }

    const LINEAR: PlotOptions = PlotOptions {
        log_x: false,
        log_y: false,
    };
    const LOG: PlotOptions = PlotOptions {
        log_x: true,
        log_y: true,
    };

    #[test]
    fn y_range_is_padded_by_a_tenth_of_the_span() {
        let r = hist(0.0, 4.0, &[10.0, 20.0, 30.0, 40.0]);
        let c = hist(0.0, 4.0, &[0.0, 20.0, 30.0, 50.0]);
        let f = PlotFrame::new(&r, &c, LINEAR).unwrap();
        assert_eq!(f.x, 0.0..4.0);
        assert!((f.y.start - -5.0).abs() < 1e-12);
        assert!((f.y.end - 55.0).abs() < 1e-12);
    }

    #[test]
    fn log_y_is_dropped_when_padded_minimum_is_not_positive() {
        let r = hist(1.0, 5.0, &[0.0, 20.0, 30.0, 40.0]);
        let f = PlotFrame::new(&r, &r, LOG).unwrap();
        assert!(f.log_x);
        assert!(!f.log_y);
    }

    #[test]
    fn log_x_is_dropped_when_first_edge_is_not_positive() {
        let r = hist(0.0, 4.0, &[100.0, 110.0, 120.0, 130.0]);
        let f = PlotFrame::new(&r, &r, LOG).unwrap();
        assert!(!f.log_x);
        assert!(f.log_y);
        assert!((f.y.start - 97.0f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn empty_histogram_has_no_frame() {
        let r = hist(0.0, 1.0, &[]);
        let c = hist(0.0, 1.0, &[1.0]);
        assert!(PlotFrame::new(&r, &c, LINEAR).is_none());
    }

    #[test]
    fn overflowing_y_span_has_no_frame() {
        let r = hist(0.0, 2.0, &[-1.5e308, 1.5e308]);
        let c = hist(0.0, 2.0, &[0.0, 1.0]);
        assert!(PlotFrame::new(&r, &c, LINEAR).is_none());
        assert!(PlotFrame::new(&c, &r, LINEAR).is_none());
    }

    #[test]
    fn non_finite_content_has_no_frame() {
        let r = hist(0.0, 2.0, &[f64::NAN, 1.0]);
        let c = hist(0.0, 2.0, &[f64::INFINITY, 1.0]);
        assert!(PlotFrame::new(&r, &r, LINEAR).is_none());
        assert!(PlotFrame::new(&c, &c, LINEAR).is_none());
    }

    #[test]
    fn huge_but_finite_range_still_plots() {
        let r = hist(0.0, 2.0, &[0.0, 1e300]);
        assert!(PlotFrame::new(&r, &r, LINEAR).is_some());
    }

    #[test]
    fn overflowing_histogram_is_reported_not_drawn() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.svg");
        let r = hist(0.0, 2.0, &[-1.5e308, 1.5e308]);
        assert!(render_overlay(&path, "h", &r, &r, LINEAR).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn writes_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hEnergy.svg");
        let r = hist(1.0, 11.0, &[1.0, 4.0, 9.0, 4.0, 1.0]);
        let c = hist(1.0, 11.0, &[2.0, 5.0, 8.0, 3.0, 1.0]);
        render_overlay(&path, "Energy", &r, &c, LOG).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"), "{svg}");
        assert!(svg.contains("Energy"));
    }

    #[test]
    fn unplottable_histogram_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.svg");
        let r = hist(0.0, 1.0, &[]);
        assert!(render_overlay(&path, "h", &r, &r, LINEAR).is_err());
        assert!(!path.exists());
    }

    proptest! {
        #[test]
        fn step_points_stay_inside_frame(
            contents in proptest::collection::vec(0.0f64..1000.0, 1..40),
            log_y in any::<bool>(),
        ) {
            let h = hist(1.0, 2.0, &contents);
            let opts = PlotOptions { log_x: true, log_y };
            let f = PlotFrame::new(&h, &h, opts).unwrap();
            let pts = f.step_points(&h);
            prop_assert_eq!(pts.len(), 2 * contents.len());
            for (x, y) in pts {
                prop_assert!(x >= f.x.start - 1e-12 && x <= f.x.end + 1e-12);
                prop_assert!(y >= f.y.start && y <= f.y.end);
            }
        }
    }
}
