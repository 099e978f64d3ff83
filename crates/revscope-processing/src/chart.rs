//! Bar-chart output for EDA series.
//!
//! Every series is written twice: a CSV with the labels and values, and a PNG
//! rendered with the plotters bitmap backend. The PNG carries bars and axes
//! only; category labels live in the CSV next to it.

use std::path::Path;

use plotters::prelude::*;

use crate::eda::EdaReport;
use crate::error::ProcessingError;
use crate::table::write_csv;

const IMAGE_SIZE: (u32, u32) = (1000, 500);
const BAR_COLOR: RGBColor = RGBColor(66, 110, 180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    /// Categories along x, in series order.
    Vertical,
    /// Categories along y, first point at the top.
    Horizontal,
}

/// Labelled values behind one chart.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Series {
    pub label_header: &'static str,
    pub value_header: &'static str,
    /// Fraction digits used for values in the CSV.
    pub decimals: usize,
    pub points: Vec<(String, f64)>,
}

impl Series {
    pub(crate) fn counts(label_header: &'static str, points: Vec<(String, usize)>) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let points = points.into_iter().map(|(l, n)| (l, n as f64)).collect();
        Self {
            label_header,
            value_header: "count",
            decimals: 0,
            points,
        }
    }

    pub(crate) fn csv_rows(&self) -> Vec<[String; 2]> {
        self.points
            .iter()
            .map(|(label, v)| [label.clone(), format!("{v:.*}", self.decimals)])
            .collect()
    }

    fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, v)| *v).collect()
    }
}

/// Writes `<dir>/<name>.csv` and, for a non-empty series, `<dir>/<name>.png`.
/// Failures are logged and recorded as skipped.
pub(crate) fn emit(
    dir: &Path,
    name: &str,
    series: &Series,
    orientation: Orientation,
    report: &mut EdaReport,
) {
    let csv_path = dir.join(format!("{name}.csv"));
    match write_csv(&csv_path, [series.label_header, series.value_header], series.csv_rows()) {
        Ok(()) => {
            tracing::info!(path = %csv_path.display(), "wrote chart data");
            report.written.push(csv_path);
        }
        Err(e) => {
            tracing::error!(path = %csv_path.display(), error = %e, "failed to write chart data");
            report.skipped.push(format!("{}: {e}", csv_path.display()));
        }
    }

    if series.points.is_empty() {
        report.skipped.push(format!("{name}.png: no data"));
        return;
    }
    let png_path = dir.join(format!("{name}.png"));
    match render_bars(&png_path, &series.values(), orientation) {
        Ok(()) => {
            tracing::info!(path = %png_path.display(), "rendered chart");
            report.written.push(png_path);
        }
        Err(e) => {
            tracing::error!(path = %png_path.display(), error = %e, "failed to render chart");
            report.skipped.push(format!("{}: {e}", png_path.display()));
        }
    }
}

/// Renders `values` as a bar chart PNG.
///
/// # Errors
///
/// Returns [`ProcessingError::Render`] naming `path` if drawing or encoding
/// fails.
pub(crate) fn render_bars(
    path: &Path,
    values: &[f64],
    orientation: Orientation,
) -> Result<(), ProcessingError> {
    draw_bars(path, values, orientation).map_err(|e| ProcessingError::Render {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn draw_bars(
    path: &Path,
    values: &[f64],
    orientation: Orientation,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    #[allow(clippy::cast_precision_loss)]
    let slots = values.len().max(1) as f64;
    let peak = values.iter().copied().fold(0.0_f64, f64::max);
    let extent = if peak > 0.0 { peak * 1.05 } else { 1.0 };

    let (x_range, y_range) = match orientation {
        Orientation::Vertical => (0.0..slots, 0.0..extent),
        Orientation::Horizontal => (0.0..extent, 0.0..slots),
    };
    let mut chart = ChartBuilder::on(&root)
        .margin(30)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        #[allow(clippy::cast_precision_loss)]
        let slot = i as f64;
        let corners = match orientation {
            Orientation::Vertical => [(slot + 0.1, 0.0), (slot + 0.9, v.max(0.0))],
            Orientation::Horizontal => {
                let top = slots - slot;
                [(0.0, top - 0.9), (v.max(0.0), top - 0.1)]
            }
        };
        Rectangle::new(corners, BAR_COLOR.filled())
    }))?;

    let axes = [
        vec![(0.0, 0.0), (x_range.end, 0.0)],
        vec![(0.0, 0.0), (0.0, y_range.end)],
    ];
    chart.draw_series(
        axes.into_iter()
            .map(|points| PathElement::new(points, BLACK.stroke_width(2))),
    )?;

    root.present()?;
    Ok(())
}
