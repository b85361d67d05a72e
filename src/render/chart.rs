//! CDF and timeline charts rendered with plotters.

use std::path::Path;

use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;

use super::backend::TextSafeBackend;
use crate::aggregate::ModeSummary;
use crate::error::{EvalError, Result};
use crate::timeline::TimelineSeries;

/// Output format, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Png,
    Svg,
}

impl ChartKind {
    /// `.svg` selects SVG, everything else PNG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartKind::Svg,
            _ => ChartKind::Png,
        }
    }
}

/// Chart size and axis range.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Image size in pixels
    pub size: (u32, u32),
    /// Upper bound of the x axis; derived from the data when `None`
    pub x_max: Option<f64>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            size: (1280, 760),
            x_max: None,
        }
    }
}

/// Parse `#RRGGBB` into a plotters color.
pub fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

fn render_err(e: impl std::fmt::Display) -> EvalError {
    EvalError::Render(e.to_string())
}

fn axis_max(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value * 1.05
    } else {
        1.0
    }
}

/// Draw the error-distance CDF of every mode that has samples.
///
/// Modes without samples are left out of the chart.
pub fn render_cdf_chart(path: &Path, summaries: &[ModeSummary], opts: &ChartOptions) -> Result<()> {
    let x_max = opts.x_max.unwrap_or_else(|| {
        axis_max(
            summaries
                .iter()
                .filter_map(|s| s.cdf.as_ref())
                .map(|c| c.max_distance())
                .fold(0.0, f64::max),
        )
    });

    match ChartKind::from_path(path) {
        ChartKind::Png => {
            let backend = BitMapBackend::new(path, opts.size);
            let root = TextSafeBackend::new(backend).into_drawing_area();
            draw_cdf_chart(root, summaries, x_max)?;
        }
        ChartKind::Svg => {
            let backend = SVGBackend::new(path, opts.size);
            let root = TextSafeBackend::new(backend).into_drawing_area();
            draw_cdf_chart(root, summaries, x_max)?;
        }
    }

    info!("[Render] CDF chart written to {}", path.display());
    Ok(())
}

fn draw_cdf_chart<DB>(
    root: DrawingArea<DB, Shift>,
    summaries: &[ModeSummary],
    x_max: f64,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(25)
        .caption("Error distance CDF", ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, 0.0..1.05)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Error distance (meters)")
        .y_desc("p")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.1}", v))
        .light_line_style(&RGBColor(230, 230, 230))
        .draw()
        .map_err(render_err)?;

    for summary in summaries {
        let Some(cdf) = summary.cdf.as_ref() else {
            continue;
        };
        let color = parse_hex_color(&summary.mode.color).unwrap_or(BLACK);
        let series: Vec<(f64, f64)> = cdf
            .points()
            .iter()
            .map(|p| (p.distance, p.fraction))
            .collect();

        chart
            .draw_series(LineSeries::new(series.iter().copied(), color.stroke_width(2)))
            .map_err(render_err)?
            .label(summary.mode.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], &color));

        chart
            .draw_series(
                series
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.filled())),
            )
            .map_err(render_err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Draw cumulative GPS-fix counters over elapsed time, one line per strategy.
pub fn render_timeline_chart(
    path: &Path,
    series: &[TimelineSeries],
    opts: &ChartOptions,
) -> Result<()> {
    let x_max = opts.x_max.unwrap_or_else(|| {
        axis_max(
            series
                .iter()
                .filter_map(|s| s.samples.last())
                .map(|s| s.elapsed_secs as f64)
                .fold(0.0, f64::max),
        )
    });
    let y_max = axis_max(
        series
            .iter()
            .flat_map(|s| s.samples.iter())
            .map(|s| s.gps_fixes as f64)
            .fold(0.0, f64::max),
    );

    match ChartKind::from_path(path) {
        ChartKind::Png => {
            let backend = BitMapBackend::new(path, opts.size);
            let root = TextSafeBackend::new(backend).into_drawing_area();
            draw_timeline_chart(root, series, x_max, y_max)?;
        }
        ChartKind::Svg => {
            let backend = SVGBackend::new(path, opts.size);
            let root = TextSafeBackend::new(backend).into_drawing_area();
            draw_timeline_chart(root, series, x_max, y_max)?;
        }
    }

    info!("[Render] Timeline chart written to {}", path.display());
    Ok(())
}

fn draw_timeline_chart<DB>(
    root: DrawingArea<DB, Shift>,
    series: &[TimelineSeries],
    x_max: f64,
    y_max: f64,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(25)
        .caption("GPS fixes over time", ("sans-serif", 24))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 50)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Time (seconds)")
        .y_desc("GPS fixes")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .light_line_style(&RGBColor(230, 230, 230))
        .draw()
        .map_err(render_err)?;

    for s in series.iter().filter(|s| !s.samples.is_empty()) {
        let color = parse_hex_color(&s.strategy.color).unwrap_or(BLACK);
        chart
            .draw_series(LineSeries::new(
                s.samples
                    .iter()
                    .map(|p| (p.elapsed_secs as f64, p.gps_fixes as f64)),
                color.stroke_width(2),
            ))
            .map_err(render_err)?
            .label(s.strategy.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], &color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}
