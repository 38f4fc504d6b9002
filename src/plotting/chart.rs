use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::fmt::Display;
use tracing::warn;

use super::registry::{ChartHandle, ChartKind, Dataset};
use super::styles::{palette, ChartStyle, StyleAttrs};
use crate::error::PlotError;
use crate::types::MetricKey;

type PlotResult<T> = Result<T, PlotError>;

/// A rasterized chart, tightly packed RGB
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Rasterize a chart with its current style and visible datasets.
///
/// Text needs a system font. When none can be loaded the chart is drawn
/// again without captions and labels rather than not at all.
pub fn render_chart(handle: &ChartHandle, style: &ChartStyle, grayscale: bool) -> PlotResult<ChartImage> {
    match render_into_buffer(handle, style, grayscale, true) {
        Ok(image) => Ok(image),
        Err(err) => {
            warn!(error = %err, "drawing without text");
            render_into_buffer(handle, style, grayscale, false)
        }
    }
}

fn render_into_buffer(handle: &ChartHandle, style: &ChartStyle, grayscale: bool, text: bool) -> PlotResult<ChartImage> {
    let (width, height) = style.size;
    let mut rgb = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        draw_chart(handle, style, grayscale, text, &root)?;
        root.present().map_err(|e| plot_err(&handle.title, e))?;
    }
    Ok(ChartImage { width, height, rgb })
}

fn plot_err(chart: &str, e: impl Display) -> PlotError {
    PlotError {
        chart: chart.to_string(),
        message: e.to_string(),
    }
}

/// Draw the chart onto an existing drawing area
pub fn draw_chart(
    handle: &ChartHandle,
    style: &ChartStyle,
    grayscale: bool,
    text: bool,
    root: &DrawingArea<BitMapBackend, Shift>,
) -> PlotResult<()> {
    let attrs = handle.style();
    root.fill(&attrs.background())
        .map_err(|e| plot_err(&handle.title, e))?;

    match handle.kind {
        ChartKind::Doughnut => draw_doughnut(handle, style, grayscale, text, root),
        ChartKind::Bar | ChartKind::HorizontalBar | ChartKind::Line => {
            draw_cartesian(handle, style, grayscale, text, root)
        }
    }
}

fn draw_cartesian(
    handle: &ChartHandle,
    style: &ChartStyle,
    grayscale: bool,
    text: bool,
    root: &DrawingArea<BitMapBackend, Shift>,
) -> PlotResult<()> {
    let attrs = handle.style();
    let datasets = handle.visible_datasets();
    let labels = category_labels(&datasets);
    let n = labels.len().max(1) as f64;
    let values: Vec<f64> = datasets
        .iter()
        .flat_map(|d| d.series.values.iter().copied())
        .collect();
    let (min_val, max_val) = value_range(&values, handle.value_floor);
    let font = ("sans-serif", style.font_size).into_font().color(&attrs.text_color);

    let horizontal = handle.kind == ChartKind::HorizontalBar;
    let (x_range, y_range) = if horizontal {
        (min_val..max_val, -0.5..(n - 0.5))
    } else {
        (-0.5..(n - 0.5), min_val..max_val)
    };

    let mut builder = ChartBuilder::on(root);
    builder.margin(style.margin);
    if text {
        builder
            .caption(&handle.title, font.clone())
            .x_label_area_size(style.label_area_size)
            .y_label_area_size(style.label_area_size);
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| plot_err(&handle.title, e))?;

    let axis_labels = labels.clone();
    let category_label = move |v: &f64| {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        axis_labels.get(idx as usize).cloned().unwrap_or_default()
    };
    let value_label = |v: &f64| format_axis_value(*v);
    let (category_count, value_count) = if text { (labels.len().max(1), 6) } else { (0, 0) };

    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(TRANSPARENT)
        .bold_line_style(attrs.grid_color)
        .axis_style(attrs.text_color)
        .label_style(font.clone());
    if horizontal {
        mesh.y_labels(category_count)
            .x_labels(value_count)
            .y_label_formatter(&category_label)
            .x_label_formatter(&value_label);
    } else {
        mesh.x_labels(category_count)
            .y_labels(value_count)
            .x_label_formatter(&category_label)
            .y_label_formatter(&value_label);
    }
    mesh.draw().map_err(|e| plot_err(&handle.title, e))?;

    let bars = handle.kind != ChartKind::Line;
    let drawn = if bars {
        draw_bars(&mut chart, &datasets, &labels, grayscale, min_val, horizontal)
    } else {
        draw_lines(&mut chart, &datasets, &labels, style, grayscale)
    };
    drawn.map_err(|e| plot_err(&handle.title, e))?;

    if text {
        draw_value_labels(&mut chart, &datasets, &labels, &attrs, style, horizontal, bars)
            .map_err(|e| plot_err(&handle.title, e))?;
        if datasets.len() > 1 {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(attrs.background().mix(0.8))
                .border_style(attrs.grid_color)
                .label_font(font)
                .draw()
                .map_err(|e| plot_err(&handle.title, e))?;
        }
    }
    Ok(())
}

/// Category axis labels, taken from the longest visible series
fn category_labels(datasets: &[&Dataset]) -> Vec<String> {
    datasets
        .iter()
        .max_by_key(|d| d.series.len())
        .map(|d| d.series.labels.clone())
        .unwrap_or_default()
}

/// (category index, value) for every point whose label is on the axis
pub(super) fn placed(dataset: &Dataset, labels: &[String]) -> Vec<(usize, f64)> {
    dataset
        .series
        .points()
        .filter_map(|(label, value)| labels.iter().position(|l| l.as_str() == label).map(|i| (i, value)))
        .collect()
}

/// Bar width and the offset of group `j` from the category center
fn bar_slot(j: usize, groups: usize) -> (f64, f64) {
    let groups = groups.max(1) as f64;
    let width = 0.7 / groups;
    (width, (j as f64 - (groups - 1.0) / 2.0) * width)
}

fn draw_bars(
    chart: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    datasets: &[&Dataset],
    labels: &[String],
    grayscale: bool,
    baseline: f64,
    horizontal: bool,
) -> Result<(), String> {
    let single = datasets.len() == 1;
    for (j, dataset) in datasets.iter().enumerate() {
        let (width, offset) = bar_slot(j, datasets.len());
        let dataset_color = palette::nth(j, grayscale);
        chart
            .draw_series(placed(dataset, labels).into_iter().map(|(i, value)| {
                let center = i as f64 + offset;
                let value = value.max(baseline);
                // a lone dataset gets one color per bar
                let color = if single { palette::nth(i, grayscale) } else { dataset_color };
                let corners = if horizontal {
                    [(baseline, center - width / 2.0), (value, center + width / 2.0)]
                } else {
                    [(center - width / 2.0, baseline), (center + width / 2.0, value)]
                };
                Rectangle::new(corners, color.filled())
            }))
            .map_err(|e| e.to_string())?
            .label(dataset.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], dataset_color.filled()));
    }
    Ok(())
}

fn draw_lines(
    chart: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    datasets: &[&Dataset],
    labels: &[String],
    style: &ChartStyle,
    grayscale: bool,
) -> Result<(), String> {
    for (j, dataset) in datasets.iter().enumerate() {
        let color = if datasets.len() > 1 {
            palette::SERIES[j % palette::SERIES.len()]
        } else if dataset.key == MetricKey::Mortality {
            palette::RED
        } else {
            palette::GREEN
        };
        let color = if grayscale { palette::grayscale(color) } else { color };
        let points: Vec<(f64, f64)> = placed(dataset, labels)
            .into_iter()
            .map(|(i, v)| (i as f64, v))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(style.line_width)))
            .map_err(|e| e.to_string())?
            .label(dataset.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Numbers on top of each bar or point
fn draw_value_labels(
    chart: &mut ChartContext<BitMapBackend, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    datasets: &[&Dataset],
    labels: &[String],
    attrs: &StyleAttrs,
    style: &ChartStyle,
    horizontal: bool,
    bars: bool,
) -> Result<(), String> {
    let font = ("sans-serif", (style.font_size * 2 / 3).max(8))
        .into_font()
        .color(&attrs.text_color);
    for (j, dataset) in datasets.iter().enumerate() {
        let offset = if bars { bar_slot(j, datasets.len()).1 } else { 0.0 };
        chart
            .draw_series(
                placed(dataset, labels)
                    .into_iter()
                    .filter(|(_, v)| *v > 0.0)
                    .map(|(i, v)| {
                        let at = if horizontal { (v, i as f64 + offset) } else { (i as f64 + offset, v) };
                        Text::new(format_axis_value(v), at, font.clone())
                    }),
            )
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn draw_doughnut(
    handle: &ChartHandle,
    style: &ChartStyle,
    grayscale: bool,
    text: bool,
    root: &DrawingArea<BitMapBackend, Shift>,
) -> PlotResult<()> {
    let attrs = handle.style();
    let (width, height) = root.dim_in_pixel();
    let legend_width = width as i32 / 3;
    let center = ((width as i32 - legend_width) / 2, height as i32 / 2);
    let outer = (center.0.min(center.1) - style.margin as i32).max(10) as f64;
    let inner = outer * 0.65;
    let font = ("sans-serif", style.font_size).into_font().color(&attrs.text_color);

    if text {
        root.draw(&Text::new(
            handle.title.clone(),
            (style.margin as i32, style.margin as i32),
            font.clone(),
        ))
        .map_err(|e| plot_err(&handle.title, e))?;
    }

    let Some(dataset) = handle.primary_dataset() else {
        return Ok(());
    };
    let series = &dataset.series;
    let total: f64 = series.values.iter().filter(|v| **v > 0.0).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let mut start = -PI / 2.0;
    for (i, (label, value)) in series.points().enumerate() {
        if value <= 0.0 {
            continue;
        }
        let sweep = value / total * 2.0 * PI;
        let color = palette::nth(i, grayscale);
        root.draw(&Polygon::new(ring_segment(center, inner, outer, start, sweep), color.filled()))
            .map_err(|e| plot_err(&handle.title, e))?;
        start += sweep;

        let legend_y = style.margin as i32 * 4 + i as i32 * (style.font_size as i32 + 6);
        let legend_x = width as i32 - legend_width;
        root.draw(&Rectangle::new(
            [(legend_x, legend_y), (legend_x + 12, legend_y + 12)],
            color.filled(),
        ))
        .map_err(|e| plot_err(&handle.title, e))?;
        if text {
            root.draw(&Text::new(
                format!("{} ({})", label, format_axis_value(value)),
                (legend_x + 18, legend_y),
                font.clone(),
            ))
            .map_err(|e| plot_err(&handle.title, e))?;
        }
    }
    Ok(())
}

/// Outline of one ring slice in pixel coordinates
fn ring_segment(center: (i32, i32), inner: f64, outer: f64, start: f64, sweep: f64) -> Vec<(i32, i32)> {
    let steps = ((sweep / (2.0 * PI)) * 90.0).ceil().max(2.0) as usize;
    let at = |radius: f64, angle: f64| {
        (
            center.0 + (radius * angle.cos()).round() as i32,
            center.1 + (radius * angle.sin()).round() as i32,
        )
    };
    let mut points: Vec<(i32, i32)> = (0..=steps)
        .map(|s| at(outer, start + sweep * s as f64 / steps as f64))
        .collect();
    points.extend((0..=steps).rev().map(|s| at(inner, start + sweep * s as f64 / steps as f64)));
    points
}

/// Value axis range: starts at zero (or the configured floor) and leaves
/// headroom above the largest value.
pub fn value_range(values: &[f64], floor: Option<f64>) -> (f64, f64) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max <= 0.0 {
        return (0.0, 1.0);
    }
    let min = match floor {
        Some(floor) if floor < max => floor,
        _ => 0.0,
    };
    (min, max * 1.1)
}

/// Compact axis labels: 1.2M, 3.4K, 12
pub fn format_axis_value(v: f64) -> String {
    if v.abs() >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v.abs() >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else if v.fract().abs() > f64::EPSILON {
        format!("{:.1}", v)
    } else {
        format!("{:.0}", v)
    }
}
