//! Offscreen raster renderer built on plotters
//!
//! Charts are laid out in pixel space on an in-memory RGB buffer, encoded as
//! PNG and returned as a base64 `data:` URL. Nothing touches the filesystem.
//! Text is set in DejaVu Sans, bundled with the crate, unless another font
//! file is configured, so output never depends on fonts installed on the host.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontDesc, FontFamily, FontStyle};
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::path::Path;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::types::{ChartSpec, ChartType, Dataset, IndexAxis, LegendPosition};

use super::colour::{cycle, Rgba};
use super::ChartRenderer;

const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BUNDLED_FAMILY: &str = "chart-sans";
const PADDING: f64 = 10.0;
const TITLE_SIZE: f64 = 16.0;
const LABEL_SIZE: f64 = 12.0;
const SWATCH: f64 = 12.0;
const TICK_COUNT: f64 = 5.0;
/// Widest stroke handed to the rasterizer
const MAX_BORDER_WIDTH: f64 = 64.0;

/// Registered once per process
static BUNDLED_REGISTERED: Lazy<bool> =
    Lazy::new(|| register_font(BUNDLED_FAMILY, FontStyle::Normal, BUNDLED_FONT).is_ok());

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Renders chart specs with plotters' bitmap backend
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    max_dimension: u32,
    /// Registered font family for labels, `None` draws shapes only
    font: Option<String>,
}

impl PlottersRenderer {
    /// Create a renderer using the configured font, or the bundled one
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let font = match &config.font_path {
            Some(path) => {
                let family = load_font(path)?;
                tracing::info!("Chart text set in {}", path.display());
                family
            }
            None => {
                if !*BUNDLED_REGISTERED {
                    return Err(Error::Config("bundled chart font failed to load".to_string()));
                }
                BUNDLED_FAMILY.to_string()
            }
        };

        Ok(Self {
            max_dimension: config.max_dimension,
            font: Some(font),
        })
    }

    /// Renderer that never draws text
    #[cfg(test)]
    pub(crate) fn without_text(max_dimension: u32) -> Self {
        Self {
            max_dimension,
            font: None,
        }
    }

    /// Reject specs the backend cannot draw before allocating the canvas
    fn check_renderable(&self, spec: &ChartSpec) -> Result<()> {
        let (w, h) = (spec.width, spec.height);
        if w == 0 || h == 0 || w > self.max_dimension || h > self.max_dimension {
            return Err(Error::render(format!(
                "canvas {}x{} is outside 1..={} pixels",
                w, h, self.max_dimension
            )));
        }

        if spec.chart_type.needs_point_data() {
            return Err(Error::render(format!(
                "chart type '{}' expects {{x, y}} point data, got plain numbers",
                spec.chart_type
            )));
        }

        match spec.chart_type {
            ChartType::Pie | ChartType::Doughnut | ChartType::PolarArea => {
                let negative = spec
                    .data
                    .datasets
                    .iter()
                    .flat_map(|ds| ds.data.iter())
                    .any(|v| *v < 0.0);
                if negative {
                    return Err(Error::render(format!(
                        "chart type '{}' cannot draw negative values",
                        spec.chart_type
                    )));
                }
            }
            ChartType::Radar if spec.data.labels.len() < 3 => {
                return Err(Error::render(format!(
                    "radar charts need at least 3 labels, got {}",
                    spec.data.labels.len()
                )));
            }
            _ => {}
        }

        Ok(())
    }

    fn draw(&self, spec: &ChartSpec, buffer: &mut [u8]) -> Result<()> {
        let root = BitMapBackend::with_buffer(buffer, (spec.width, spec.height)).into_drawing_area();
        let painter = Painter {
            area: &root,
            font: self.font.as_deref(),
        };

        let background = Rgba::from_hex(&spec.background_colour).unwrap_or(Rgba::WHITE);
        root.fill(&Rgba::WHITE.to_plotters()).map_err(backend)?;
        root.fill(&background.to_plotters()).map_err(backend)?;

        let mut frame = Bounds::new(spec.width as f64, spec.height as f64).shrink(PADDING);

        if let Some(title) = spec.options.plugins.title.as_ref().filter(|t| t.display) {
            if painter.has_text() {
                painter.text(
                    &title.text,
                    (frame.center().0, frame.top + TITLE_SIZE / 2.0),
                    TITLE_SIZE,
                    Rgba::TEXT,
                    Pos::new(HPos::Center, VPos::Center),
                )?;
                frame.top += TITLE_SIZE + 8.0;
            }
        }

        let entries = legend_entries(spec);
        if !entries.is_empty() {
            let position = spec
                .options
                .plugins
                .legend
                .map(|l| l.position)
                .unwrap_or(LegendPosition::Top);
            frame = painter.legend(&entries, position, frame)?;
        }

        match spec.chart_type {
            ChartType::Line | ChartType::Bar => painter.cartesian(spec, frame)?,
            ChartType::Pie | ChartType::Doughnut => painter.rings(spec, frame)?,
            ChartType::PolarArea => painter.polar_area(spec, frame)?,
            ChartType::Radar => painter.radar(spec, frame)?,
            ChartType::Scatter | ChartType::Bubble => {
                return Err(Error::render(format!(
                    "chart type '{}' is not drawable",
                    spec.chart_type
                )))
            }
        }

        root.present().map_err(backend)?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<String> {
        self.check_renderable(spec)?;

        let (w, h) = (spec.width, spec.height);
        let mut buffer = vec![0u8; w as usize * h as usize * 3];
        self.draw(spec, &mut buffer)?;

        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(&buffer, w, h, ExtendedColorType::Rgb8)
            .map_err(|e| Error::render(format!("PNG encoding failed: {}", e)))?;

        tracing::debug!("Rendered {} chart {}x{} ({} bytes)", spec.chart_type, w, h, png.len());

        Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
    }

    fn name(&self) -> &'static str {
        "plotters"
    }
}

/// Register a font file under its own family name and return that name
fn load_font(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Config(format!("font {}: {}", path.display(), e)))?;
    // Registered fonts must live for the rest of the process
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

    let family = format!("chart-font:{}", path.display());
    register_font(&family, FontStyle::Normal, bytes).map_err(|_| {
        Error::Config(format!("font {} is not a valid TrueType/OpenType file", path.display()))
    })?;
    Ok(family)
}

fn backend<E: std::fmt::Display>(e: E) -> Error {
    Error::render(format!("rendering backend rejected the chart: {}", e))
}

/// Axis-aligned pixel rectangle
#[derive(Debug, Clone, Copy)]
struct Bounds {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Bounds {
    fn new(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: height,
        }
    }

    fn shrink(self, by: f64) -> Self {
        Self {
            left: self.left + by,
            top: self.top + by,
            right: (self.right - by).max(self.left + by),
            bottom: (self.bottom - by).max(self.top + by),
        }
    }

    fn width(&self) -> f64 {
        (self.right - self.left).max(0.0)
    }

    fn height(&self) -> f64 {
        (self.bottom - self.top).max(0.0)
    }

    fn center(&self) -> (f64, f64) {
        ((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
    }
}

/// Evenly spaced axis ticks on round numbers
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ticks {
    low: f64,
    high: f64,
    step: f64,
}

impl Ticks {
    fn new(min: f64, max: f64) -> Self {
        let span = if max > min { max - min } else { min.abs().max(1.0) };
        let raw = span / TICK_COUNT;
        let magnitude = 10f64.powf(raw.log10().floor());
        let step = match raw / magnitude {
            n if n <= 1.0 => magnitude,
            n if n <= 2.0 => 2.0 * magnitude,
            n if n <= 5.0 => 5.0 * magnitude,
            _ => 10.0 * magnitude,
        };

        let low = (min / step).floor() * step;
        let mut high = (max / step).ceil() * step;
        if high <= low {
            high = low + step;
        }

        Self { low, high, step }
    }

    fn values(&self) -> Vec<f64> {
        let count = ((self.high - self.low) / self.step).round() as usize;
        (0..=count).map(|i| self.low + i as f64 * self.step).collect()
    }

    /// Position of `v` in `0.0..=1.0`
    fn fraction(&self, v: f64) -> f64 {
        (v - self.low) / (self.high - self.low)
    }
}

struct LegendEntry {
    label: String,
    fill: Rgba,
    border: Rgba,
}

/// Radial charts list labels; the rest list datasets
fn legend_entries(spec: &ChartSpec) -> Vec<LegendEntry> {
    let data = &spec.data;
    match spec.chart_type {
        ChartType::Pie | ChartType::Doughnut | ChartType::PolarArea => {
            let Some(first) = data.datasets.first() else {
                return Vec::new();
            };
            data.labels
                .iter()
                .enumerate()
                .map(|(i, label)| LegendEntry {
                    label: label.clone(),
                    fill: cycle(&first.background_color, i),
                    border: border_colour(first),
                })
                .collect()
        }
        _ => data
            .datasets
            .iter()
            .enumerate()
            .map(|(d, ds)| LegendEntry {
                label: ds.label.clone(),
                fill: dataset_fill(ds, d, 0),
                border: border_colour(ds),
            })
            .collect(),
    }
}

/// Fill of element `i` of dataset `d` on cartesian and radar charts
fn dataset_fill(ds: &Dataset, d: usize, i: usize) -> Rgba {
    if ds.background_color.is_empty() {
        cycle(&[], d)
    } else {
        cycle(&ds.background_color, i)
    }
}

fn border_colour(ds: &Dataset) -> Rgba {
    Rgba::from_hex(&ds.border_color).unwrap_or(Rgba::TEXT)
}

fn border_width(ds: &Dataset) -> u32 {
    ds.border_width.round().clamp(0.0, MAX_BORDER_WIDTH) as u32
}

fn px((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn format_tick(v: f64) -> String {
    if v.fract().abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        let s = format!("{:.2}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

fn estimate_text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.55
}

/// Annular sector from `start` to `end` (radians, clockwise from +x)
fn sector(center: (f64, f64), inner: f64, outer: f64, start: f64, end: f64) -> Vec<(i32, i32)> {
    let steps = ((end - start).abs() / (PI / 90.0)).ceil().max(1.0) as usize;
    let at = |r: f64, a: f64| px((center.0 + r * a.cos(), center.1 + r * a.sin()));

    let mut points: Vec<(i32, i32)> = (0..=steps)
        .map(|s| at(outer, start + (end - start) * s as f64 / steps as f64))
        .collect();

    if inner > 0.5 {
        points.extend((0..=steps).rev().map(|s| at(inner, start + (end - start) * s as f64 / steps as f64)));
    } else {
        points.push(px(center));
    }
    points
}

struct Painter<'p, 'b> {
    area: &'p Area<'b>,
    font: Option<&'p str>,
}

impl Painter<'_, '_> {
    fn has_text(&self) -> bool {
        self.font.is_some()
    }

    fn rect(&self, a: (f64, f64), b: (f64, f64), style: ShapeStyle) -> Result<()> {
        self.area
            .draw(&Rectangle::new([px(a), px(b)], style))
            .map_err(backend)
    }

    fn polygon(&self, points: Vec<(i32, i32)>, style: ShapeStyle) -> Result<()> {
        self.area.draw(&Polygon::new(points, style)).map_err(backend)
    }

    fn path(&self, points: Vec<(i32, i32)>, style: ShapeStyle) -> Result<()> {
        self.area.draw(&PathElement::new(points, style)).map_err(backend)
    }

    fn line(&self, a: (f64, f64), b: (f64, f64), colour: Rgba) -> Result<()> {
        self.path(vec![px(a), px(b)], colour.stroke(1))
    }

    fn circle(&self, c: (f64, f64), radius: i32, style: ShapeStyle) -> Result<()> {
        self.area.draw(&Circle::new(px(c), radius, style)).map_err(backend)
    }

    /// Closed outline; skipped for zero-width borders
    fn outline(&self, mut points: Vec<(i32, i32)>, colour: Rgba, width: u32) -> Result<()> {
        if width == 0 || points.is_empty() {
            return Ok(());
        }
        points.push(points[0]);
        self.path(points, colour.stroke(width))
    }

    fn text(&self, text: &str, at: (f64, f64), size: f64, colour: Rgba, pos: Pos) -> Result<()> {
        let Some(family) = self.font.filter(|_| !text.is_empty()) else {
            return Ok(());
        };
        let style = FontDesc::new(FontFamily::Name(family), size, FontStyle::Normal)
            .color(&colour.to_plotters())
            .pos(pos);
        self.area
            .draw(&Text::new(text.to_string(), px(at), style))
            .map_err(backend)
    }

    /// Draw the legend and return the space left for the chart
    fn legend(&self, entries: &[LegendEntry], position: LegendPosition, frame: Bounds) -> Result<Bounds> {
        let item_width = |e: &LegendEntry| {
            let label = if self.has_text() {
                4.0 + estimate_text_width(&e.label, LABEL_SIZE)
            } else {
                0.0
            };
            SWATCH + label + 10.0
        };
        let row = SWATCH + 8.0;

        let mut remaining = frame;
        let mut items = Vec::with_capacity(entries.len());

        match position {
            LegendPosition::Top | LegendPosition::Bottom => {
                let total: f64 = entries.iter().map(item_width).sum();
                let mut x = (frame.center().0 - total / 2.0).max(frame.left);
                let y = if position == LegendPosition::Top {
                    remaining.top += row;
                    frame.top
                } else {
                    remaining.bottom -= row;
                    frame.bottom - SWATCH
                };
                for entry in entries {
                    items.push((entry, (x, y)));
                    x += item_width(entry);
                }
            }
            LegendPosition::Left | LegendPosition::Right => {
                let column = entries
                    .iter()
                    .map(item_width)
                    .fold(0.0, f64::max)
                    .min(frame.width() / 3.0);
                let x = if position == LegendPosition::Left {
                    remaining.left += column;
                    frame.left
                } else {
                    remaining.right -= column;
                    frame.right - column
                };
                let mut y = frame.top;
                for entry in entries {
                    items.push((entry, (x, y)));
                    y += row;
                }
            }
        }

        for (entry, (x, y)) in items {
            self.rect((x, y), (x + SWATCH, y + SWATCH), entry.fill.fill())?;
            self.rect((x, y), (x + SWATCH, y + SWATCH), entry.border.stroke(1))?;
            self.text(
                &entry.label,
                (x + SWATCH + 4.0, y + SWATCH / 2.0),
                LABEL_SIZE,
                Rgba::TEXT,
                Pos::new(HPos::Left, VPos::Center),
            )?;
        }

        Ok(remaining)
    }

    /// Line and bar charts
    fn cartesian(&self, spec: &ChartSpec, frame: Bounds) -> Result<()> {
        let horizontal = spec.options.index_axis == IndexAxis::Y;
        let scales = spec.options.scales;
        let (category_scale, value_scale) = if horizontal {
            (scales.y, scales.x)
        } else {
            (scales.x, scales.y)
        };
        let bars = spec.chart_type == ChartType::Bar;
        let stack_values = value_scale.stacked;
        let shared_slot = bars && category_scale.stacked;

        let labels = &spec.data.labels;
        let datasets = &spec.data.datasets;
        let n = labels.len().max(1);

        let (min, max) = value_extent(datasets, labels.len(), stack_values);
        let ticks = Ticks::new(min.min(0.0), max.max(0.0));

        let value_gutter = if self.has_text() { 44.0 } else { 4.0 };
        let category_gutter = if self.has_text() { 18.0 } else { 4.0 };
        let plot = if horizontal {
            let longest = labels
                .iter()
                .map(|l| estimate_text_width(l, LABEL_SIZE))
                .fold(0.0, f64::max);
            let label_gutter = if self.has_text() { (longest + 8.0).min(frame.width() / 3.0) } else { 4.0 };
            Bounds {
                left: frame.left + label_gutter,
                bottom: frame.bottom - category_gutter,
                ..frame
            }
        } else {
            Bounds {
                left: frame.left + value_gutter,
                bottom: frame.bottom - category_gutter,
                ..frame
            }
        };

        // Pixel coordinate of a value along the value axis
        let value_at = |v: f64| {
            if horizontal {
                plot.left + ticks.fraction(v) * plot.width()
            } else {
                plot.bottom - ticks.fraction(v) * plot.height()
            }
        };
        let slot = (if horizontal { plot.height() } else { plot.width() }) / n as f64;
        let slot_start = |i: usize| {
            if horizontal {
                plot.top + i as f64 * slot
            } else {
                plot.left + i as f64 * slot
            }
        };
        // (category, value) -> (x, y)
        let point = |c: f64, v: f64| if horizontal { (v, c) } else { (c, v) };

        for tick in ticks.values() {
            let at = value_at(tick);
            let (a, b) = if horizontal {
                ((at, plot.top), (at, plot.bottom))
            } else {
                ((plot.left, at), (plot.right, at))
            };
            self.line(a, b, Rgba::GRID)?;

            let (anchor, pos) = if horizontal {
                ((at, plot.bottom + 4.0), Pos::new(HPos::Center, VPos::Top))
            } else {
                ((plot.left - 4.0, at), Pos::new(HPos::Right, VPos::Center))
            };
            self.text(&format_tick(tick), anchor, LABEL_SIZE, Rgba::TEXT, pos)?;
        }

        let zero = value_at(0.0);
        if horizontal {
            self.line((zero, plot.top), (zero, plot.bottom), Rgba::AXIS)?;
        } else {
            self.line((plot.left, zero), (plot.right, zero), Rgba::AXIS)?;
        }

        for (i, label) in labels.iter().enumerate() {
            let center = slot_start(i) + slot / 2.0;
            let (anchor, pos) = if horizontal {
                ((plot.left - 4.0, center), Pos::new(HPos::Right, VPos::Center))
            } else {
                ((center, plot.bottom + 4.0), Pos::new(HPos::Center, VPos::Top))
            };
            self.text(label, anchor, LABEL_SIZE, Rgba::TEXT, pos)?;
        }

        let mut positive = vec![0.0; labels.len()];
        let mut negative = vec![0.0; labels.len()];
        let group = slot * 0.8;
        let thickness = if shared_slot || datasets.is_empty() {
            group
        } else {
            group / datasets.len() as f64
        };

        for (d, ds) in datasets.iter().enumerate() {
            let border = border_colour(ds);
            let width = border_width(ds);
            let mut line = Vec::with_capacity(ds.data.len());

            for (i, &v) in ds.data.iter().enumerate().take(labels.len()) {
                let (from, to) = if stack_values {
                    let base = if v >= 0.0 { &mut positive[i] } else { &mut negative[i] };
                    let from = *base;
                    *base += v;
                    (from, *base)
                } else {
                    (0.0, v)
                };

                if bars {
                    let offset = slot_start(i)
                        + (slot - group) / 2.0
                        + if shared_slot { 0.0 } else { d as f64 * thickness };
                    let a = point(offset, value_at(from));
                    let b = point(offset + thickness, value_at(to));
                    self.rect(a, b, dataset_fill(ds, d, i).fill())?;
                    if width > 0 {
                        self.rect(a, b, border.stroke(width))?;
                    }
                } else {
                    line.push(point(slot_start(i) + slot / 2.0, value_at(to)));
                }
            }

            if !bars && !line.is_empty() {
                self.path(line.iter().copied().map(px).collect(), border.stroke(width.max(1)))?;
                for (i, &p) in line.iter().enumerate() {
                    self.circle(p, 3, dataset_fill(ds, d, i).fill())?;
                    self.circle(p, 3, border.stroke(1))?;
                }
            }
        }

        Ok(())
    }

    /// Pie and doughnut charts: one concentric ring per dataset
    fn rings(&self, spec: &ChartSpec, frame: Bounds) -> Result<()> {
        let datasets = &spec.data.datasets;
        if datasets.is_empty() {
            return Ok(());
        }

        let center = frame.center();
        let radius = (frame.width().min(frame.height()) / 2.0 - 2.0).max(1.0);
        let cutout = if spec.chart_type == ChartType::Doughnut {
            radius * 0.5
        } else {
            0.0
        };
        let band = (radius - cutout) / datasets.len() as f64;

        for (d, ds) in datasets.iter().enumerate() {
            let outer = radius - d as f64 * band;
            let inner = outer - band;
            let total: f64 = ds.data.iter().sum();
            if total <= 0.0 {
                continue;
            }

            let mut angle = -FRAC_PI_2;
            for (i, v) in ds.data.iter().enumerate() {
                let sweep = v / total * TAU;
                if sweep <= 0.0 {
                    continue;
                }
                let points = sector(center, inner, outer, angle, angle + sweep);
                self.polygon(points.clone(), cycle(&ds.background_color, i).fill())?;
                self.outline(points, border_colour(ds), border_width(ds))?;
                angle += sweep;
            }
        }

        Ok(())
    }

    /// Polar area: equal angles, radius proportional to value
    fn polar_area(&self, spec: &ChartSpec, frame: Bounds) -> Result<()> {
        let n = spec.data.labels.len();
        let center = frame.center();
        let radius = (frame.width().min(frame.height()) / 2.0 - 2.0).max(1.0);

        for ring in 1..=4 {
            let r = (radius * ring as f64 / 4.0).round() as i32;
            self.circle(center, r, Rgba::GRID.stroke(1))?;
        }

        let max = spec
            .data
            .datasets
            .iter()
            .flat_map(|ds| ds.data.iter().copied())
            .fold(0.0, f64::max);
        if n == 0 || max <= 0.0 {
            return Ok(());
        }

        let sweep = TAU / n as f64;
        for ds in &spec.data.datasets {
            for (i, v) in ds.data.iter().enumerate().take(n) {
                if *v <= 0.0 {
                    continue;
                }
                let start = -FRAC_PI_2 + i as f64 * sweep;
                let points = sector(center, 0.0, radius * v / max, start, start + sweep);
                self.polygon(points.clone(), cycle(&ds.background_color, i).fill())?;
                self.outline(points, border_colour(ds), border_width(ds))?;
            }
        }

        Ok(())
    }

    /// Radar: one closed polygon per dataset over a spoke per label
    fn radar(&self, spec: &ChartSpec, frame: Bounds) -> Result<()> {
        let labels = &spec.data.labels;
        let n = labels.len();
        let center = frame.center();
        let label_room = if self.has_text() { 2.0 * LABEL_SIZE } else { 0.0 };
        let radius = (frame.width().min(frame.height()) / 2.0 - 2.0 - label_room).max(1.0);

        let (min, max) = value_extent(&spec.data.datasets, n, false);
        let ticks = Ticks::new(min.min(0.0), max.max(0.0));

        let angle = |i: usize| -FRAC_PI_2 + i as f64 * TAU / n as f64;
        let at = |r: f64, i: usize| (center.0 + r * angle(i).cos(), center.1 + r * angle(i).sin());

        for tick in ticks.values().into_iter().filter(|t| *t > ticks.low) {
            let r = ticks.fraction(tick) * radius;
            let ring: Vec<(i32, i32)> = (0..n).map(|i| px(at(r, i))).collect();
            self.outline(ring, Rgba::GRID, 1)?;
        }

        for (i, label) in labels.iter().enumerate() {
            self.line(center, at(radius, i), Rgba::GRID)?;
            self.text(
                label,
                at(radius + LABEL_SIZE, i),
                LABEL_SIZE,
                Rgba::TEXT,
                Pos::new(HPos::Center, VPos::Center),
            )?;
        }

        for (d, ds) in spec.data.datasets.iter().enumerate() {
            let border = border_colour(ds);
            let points: Vec<(f64, f64)> = ds
                .data
                .iter()
                .enumerate()
                .take(n)
                .map(|(i, v)| at(ticks.fraction(*v) * radius, i))
                .collect();

            let fill = if ds.background_color.is_empty() {
                border.fade(0.2)
            } else {
                dataset_fill(ds, d, 0)
            };
            let outline: Vec<(i32, i32)> = points.iter().copied().map(px).collect();
            self.polygon(outline.clone(), fill.fill())?;
            self.outline(outline, border, border_width(ds).max(1))?;

            for p in points {
                self.circle(p, 2, border.fill())?;
            }
        }

        Ok(())
    }
}

/// Smallest and largest value drawn, summing per label when stacked
fn value_extent(datasets: &[Dataset], labels: usize, stacked: bool) -> (f64, f64) {
    if stacked {
        let mut positive = vec![0.0f64; labels];
        let mut negative = vec![0.0f64; labels];
        for ds in datasets {
            for (i, v) in ds.data.iter().enumerate().take(labels) {
                if *v >= 0.0 {
                    positive[i] += v;
                } else {
                    negative[i] += v;
                }
            }
        }
        let min = negative.iter().copied().fold(0.0, f64::min);
        let max = positive.iter().copied().fold(0.0, f64::max);
        (min, max)
    } else {
        datasets
            .iter()
            .flat_map(|ds| ds.data.iter().copied())
            .fold((0.0, 0.0), |(lo, hi), v| (f64::min(lo, v), f64::max(hi, v)))
    }
}
