// src/chart/mod.rs
use crate::process::date_parser::decimal_year;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Months, NaiveDate};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

pub mod comparisons;

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const TESLA_RED: RGBColor = RGBColor(0xE6, 0x23, 0x2E);
pub const BITCOIN_ORANGE: RGBColor = RGBColor(0xF0, 0x8F, 0x2E);
pub const FRED_PURPLE: RGBColor = RGBColor(128, 0, 128);
/// Thin vertical line at the start of every month.
pub const MONTH_LINE: RGBColor = RGBColor(221, 221, 221);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
    ShortDashed,
}

#[derive(Debug, Clone, Copy)]
pub struct SeriesStyle {
    pub color: RGBColor,
    pub width: u32,
    pub line: LineKind,
    pub markers: bool,
}

impl SeriesStyle {
    pub fn solid(color: RGBColor) -> Self {
        Self {
            color,
            width: 3,
            line: LineKind::Solid,
            markers: false,
        }
    }

    pub fn with_line(mut self, line: LineKind) -> Self {
        self.line = line;
        self
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// A named time series; `None` values are gaps in the line.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
    pub style: SeriesStyle,
}

impl Series {
    /// Runs of consecutive present points as `(decimal year, value)`.
    fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (d, v) in &self.points {
            match v {
                Some(v) if v.is_finite() => current.push((decimal_year(*d), *v)),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    fn value_bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .filter_map(|(_, v)| *v)
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.points.iter().map(|(d, _)| *d).min()?;
        let last = self.points.iter().map(|(d, _)| *d).max()?;
        Some((first, last))
    }
}

/// One y-axis: its label, an optional fixed range, and the series drawn on it.
#[derive(Debug, Clone)]
pub struct Axis {
    pub label: String,
    pub range: Option<(f64, f64)>,
    pub series: Series,
}

impl Axis {
    fn resolved_range(&self) -> Result<(f64, f64)> {
        if let Some(r) = self.range {
            return Ok(r);
        }
        let (lo, hi) = self
            .series
            .value_bounds()
            .ok_or_else(|| anyhow!("series {} has no values to plot", self.series.label))?;
        let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
        Ok((lo - pad, hi + pad))
    }
}

/// Two series over a shared time axis, each on its own y-scale.
#[derive(Debug, Clone)]
pub struct DualAxisChart {
    pub title: String,
    pub primary: Axis,
    pub secondary: Axis,
    /// Fixed x range; defaults to the span of the primary series.
    pub x_range: Option<(NaiveDate, NaiveDate)>,
    pub grid: bool,
}

impl DualAxisChart {
    /// File name derived from the title, e.g. `tesla-web-search-vs-price.svg`.
    pub fn file_name(&self) -> String {
        let mut slug = String::new();
        for ch in self.title.chars() {
            if ch.is_ascii_alphanumeric() {
                slug.push(ch.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        format!("{}.svg", slug.trim_end_matches('-'))
    }

    fn resolved_x_dates(&self) -> Result<(NaiveDate, NaiveDate)> {
        match self.x_range {
            Some(r) => Ok(r),
            None => self
                .primary
                .series
                .date_bounds()
                .or_else(|| self.secondary.series.date_bounds())
                .ok_or_else(|| anyhow!("chart {} has no dates", self.title)),
        }
    }

    fn resolved_x_range(&self) -> Result<(f64, f64)> {
        let (first, last) = self.resolved_x_dates()?;
        let (x0, x1) = (decimal_year(first), decimal_year(last));
        if x1 > x0 {
            Ok((x0, x1))
        } else {
            Ok((x0, x0 + 1.0 / 12.0))
        }
    }
}

/// First day of every month that falls within `first..=last`.
pub fn month_starts(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut d = first.with_day(1).unwrap_or(first);
    if d < first {
        d = match d.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => return Vec::new(),
        };
    }
    let mut starts = Vec::new();
    while d <= last {
        starts.push(d);
        match d.checked_add_months(Months::new(1)) {
            Some(next) => d = next,
            None => break,
        }
    }
    starts
}

/// Pixel size of rendered charts.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        // 14 x 8 inches at 120 dpi
        Self {
            width: 1680,
            height: 960,
        }
    }
}

fn draw_err<E: std::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow!("drawing failed: {:?}", e)
}

/// Draw every segment of `$series` with `$ctx.$draw(...)`, labelling the
/// first segment for the legend.
macro_rules! draw_styled_series {
    ($ctx:expr, $draw:ident, $series:expr) => {{
        let series: &Series = $series;
        let s = series.style;
        let style = s.color.stroke_width(s.width);
        for (i, seg) in series.segments().into_iter().enumerate() {
            let markers = seg.clone();
            let anno = match s.line {
                LineKind::Solid => $ctx.$draw(LineSeries::new(seg, style)),
                LineKind::Dashed => $ctx.$draw(DashedLineSeries::new(seg, 14, 8, style)),
                LineKind::ShortDashed => $ctx.$draw(DashedLineSeries::new(seg, 6, 6, style)),
            }
            .map_err(draw_err)?;
            if i == 0 {
                anno.label(series.label.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 24, y)], style)
                });
            }
            if s.markers {
                $ctx.$draw(markers.into_iter().map(|p| Circle::new(p, 4, style.filled())))
                    .map_err(draw_err)?;
            }
        }
    }};
}

/// Render `chart` as an SVG file in `out_dir` and return its path.
pub fn render(chart: &DualAxisChart, out_dir: &Path, opts: &RenderOptions) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating chart directory {}", out_dir.display()))?;
    let path = out_dir.join(chart.file_name());

    let (x0, x1) = chart.resolved_x_range()?;
    let (y0, y1) = chart.primary.resolved_range()?;
    let (s0, s1) = chart.secondary.resolved_range()?;
    if y1 <= y0 || s1 <= s0 {
        bail!("chart {}: empty y range", chart.title);
    }
    debug!(title = %chart.title, x0, x1, y0, y1, s0, s1, "chart ranges");

    {
        let root = SVGBackend::new(&path, (opts.width, opts.height)).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 36))
            .margin(24)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .right_y_label_area_size(90)
            .build_cartesian_2d(x0..x1, y0..y1)
            .map_err(draw_err)?
            .set_secondary_coord(x0..x1, s0..s1);

        // one label per calendar year
        let years = (x1.floor() - x0.ceil()).max(0.0) as usize + 1;
        let year_label = |x: &f64| format!("{:.0}", x);
        let primary_color = chart.primary.series.style.color;
        let secondary_color = chart.secondary.series.style.color;

        {
            let mut mesh = ctx.configure_mesh();
            mesh.x_labels(years.max(2))
                .x_label_formatter(&year_label)
                .y_desc(chart.primary.label.as_str())
                .axis_desc_style(("sans-serif", 22).into_font().color(&primary_color))
                .label_style(("sans-serif", 16));
            // month lines below stand in for the light grid
            if chart.grid {
                mesh.bold_line_style(RGBColor(128, 128, 128).mix(0.6))
                    .light_line_style(WHITE.mix(0.0));
            } else {
                mesh.disable_mesh();
            }
            mesh.draw().map_err(draw_err)?;
        }

        let (first, last) = chart.resolved_x_dates()?;
        ctx.draw_series(month_starts(first, last).into_iter().map(|d| {
            let x = decimal_year(d);
            PathElement::new(vec![(x, y0), (x, y1)], MONTH_LINE.stroke_width(1))
        }))
        .map_err(draw_err)?;

        ctx.configure_secondary_axes()
            .y_desc(chart.secondary.label.as_str())
            .axis_desc_style(("sans-serif", 22).into_font().color(&secondary_color))
            .label_style(("sans-serif", 16))
            .draw()
            .map_err(draw_err)?;

        draw_styled_series!(ctx, draw_series, &chart.primary.series);
        draw_styled_series!(ctx, draw_secondary_series, &chart.secondary.series);

        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }

    info!(title = %chart.title, path = %path.display(), "chart written");
    Ok(path)
}
