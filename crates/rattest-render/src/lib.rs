//! Rendering for rattest: the per-test HTML report and histogram overlay plots.

mod html;
mod plot;

pub use html::ReportBuilder;
pub use plot::{PlotFrame, render_overlay};
