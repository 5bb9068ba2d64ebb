//! Forecast chart artifacts.
//!
//! Charts are written as standalone SVG documents. The file name depends only
//! on the region and the pollutant, so a re-run overwrites the previous chart.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::error::{ErrorContext, ExternalServiceError};
use crate::models::time::decimal_year;
use crate::models::ForecastResult;

const WIDTH: f64 = 960.0;
const HEIGHT: f64 = 540.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 50.0;
const Y_TICKS: usize = 5;

/// Something that turns a forecast into a file on disk.
pub trait ChartRenderer: Send + Sync {
    /// Write the chart and return its path.
    fn render(&self, result: &ForecastResult) -> Result<PathBuf, ExternalServiceError>;
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<region>_<pollutant>_forecast.svg`, both parts sanitised.
pub fn chart_file_name(region: &str, pollutant_label: &str) -> String {
    format!(
        "{}_{}_forecast.svg",
        sanitize_component(region),
        sanitize_component(pollutant_label)
    )
}

#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    output_dir: PathBuf,
}

impl SvgChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn path_for(&self, result: &ForecastResult) -> PathBuf {
        self.output_dir
            .join(chart_file_name(result.region(), &result.pollutant().label))
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, result: &ForecastResult) -> Result<PathBuf, ExternalServiceError> {
        let path = self.path_for(result);
        let context = || {
            ErrorContext::new("render_chart").with_entity(path.display().to_string())
        };

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            ExternalServiceError::io(format!("Failed to create chart directory: {}", e), context())
        })?;
        let svg = render_svg(result).map_err(|e| {
            ExternalServiceError::io(format!("Failed to format chart: {}", e), context())
        })?;
        fs::write(&path, svg).map_err(|e| {
            ExternalServiceError::io(format!("Failed to write chart: {}", e), context())
        })?;

        info!(path = %path.display(), "chart saved");
        Ok(path)
    }
}

/// Linear map from data coordinates to the plot area.
struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn x(&self, value: f64) -> f64 {
        let plot = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (value - self.x_min) / (self.x_max - self.x_min) * plot
    }

    fn y(&self, value: f64) -> f64 {
        let plot = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        HEIGHT - MARGIN_BOTTOM - (value - self.y_min) / (self.y_max - self.y_min) * plot
    }
}

fn frame_for(result: &ForecastResult) -> Frame {
    let xs = result
        .history
        .timestamps()
        .chain(result.future.iter().map(|p| p.timestamp))
        .map(decimal_year);
    let ys = result
        .history
        .values()
        .chain(result.future.iter().flat_map(|p| [p.lower_bound, p.upper_bound]));

    let (x_min, x_max) = bounds(xs);
    let (y_lo, y_hi) = bounds(ys);
    let pad = ((y_hi - y_lo) * 0.05).max(1.0);

    Frame {
        x_min,
        x_max: if x_max > x_min { x_max } else { x_min + 1.0 },
        y_min: y_lo - pad,
        y_max: y_hi + pad,
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if lo.is_finite() && hi.is_finite() {
        (lo, hi)
    } else {
        (0.0, 1.0)
    }
}

fn polyline(points: impl Iterator<Item = (f64, f64)>) -> String {
    points
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// The complete SVG document for `result`.
pub fn render_svg(result: &ForecastResult) -> Result<String, fmt::Error> {
    let frame = frame_for(result);
    let title = format!(
        "{} Forecast for {} - MAE: {:.2}, R²: {:.2}",
        result.pollutant().label,
        result.region(),
        result.metrics.mean_absolute_error,
        result.metrics.r_squared
    );

    let band_upper = result
        .future
        .iter()
        .map(|p| (frame.x(decimal_year(p.timestamp)), frame.y(p.upper_bound)));
    let band_lower = result
        .future
        .iter()
        .rev()
        .map(|p| (frame.x(decimal_year(p.timestamp)), frame.y(p.lower_bound)));
    let band = polyline(band_upper.chain(band_lower));

    let history = polyline(
        result
            .history
            .points()
            .iter()
            .map(|p| (frame.x(decimal_year(p.timestamp)), frame.y(p.value))),
    );
    let forecast = polyline(
        result
            .future
            .iter()
            .map(|p| (frame.x(decimal_year(p.timestamp)), frame.y(p.point_estimate))),
    );

    let mut svg = String::new();
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = WIDTH,
        h = HEIGHT
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    writeln!(
        svg,
        r#"<text x="{:.1}" y="32" font-family="sans-serif" font-size="18" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(&title)
    )?;

    write_axes(&mut svg, &frame, result)?;

    writeln!(
        svg,
        r#"<polygon class="interval" points="{}" fill="steelblue" fill-opacity="0.2" stroke="none"/>"#,
        band
    )?;
    writeln!(
        svg,
        r#"<polyline class="history" points="{}" fill="none" stroke="black" stroke-width="2"/>"#,
        history
    )?;
    writeln!(
        svg,
        r#"<polyline class="forecast" points="{}" fill="none" stroke="steelblue" stroke-width="2" stroke-dasharray="6 4"/>"#,
        forecast
    )?;
    for p in result.history.points() {
        writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="black"/>"#,
            frame.x(decimal_year(p.timestamp)),
            frame.y(p.value)
        )?;
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}

fn write_axes(svg: &mut String, frame: &Frame, result: &ForecastResult) -> fmt::Result {
    let bottom = HEIGHT - MARGIN_BOTTOM;
    writeln!(
        svg,
        r#"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="gray"/>"#,
        l = MARGIN_LEFT,
        r = WIDTH - MARGIN_RIGHT,
        b = bottom
    )?;
    writeln!(
        svg,
        r#"<line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="gray"/>"#,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = bottom
    )?;

    for i in 0..=Y_TICKS {
        let value = frame.y_min + (frame.y_max - frame.y_min) * i as f64 / Y_TICKS as f64;
        let y = frame.y(value);
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" text-anchor="end">{:.1}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            value
        )?;
    }

    let first = frame.x_min.floor() as i32;
    let last = frame.x_max.ceil() as i32;
    let step = ((last - first) / 10).max(1);
    for year in (first..=last).step_by(step as usize) {
        let x = frame.x(year as f64);
        if x > WIDTH - MARGIN_RIGHT + 0.5 {
            continue;
        }
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="11" text-anchor="middle">{}</text>"#,
            x,
            bottom + 18.0,
            year
        )?;
    }

    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="middle">Anno</text>"#,
        WIDTH / 2.0,
        HEIGHT - 10.0
    )?;
    writeln!(
        svg,
        r#"<text x="16" y="{:.1}" font-family="sans-serif" font-size="12" text-anchor="middle" transform="rotate(-90 16 {:.1})">{}</text>"#,
        HEIGHT / 2.0,
        HEIGHT / 2.0,
        escape(&result.pollutant().label)
    )
}
