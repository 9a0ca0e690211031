use std::collections::HashMap;

use dataconst::data::chart::{ChartKind, ChartSpec, Series};
use dataconst::data::model::ColumnType;
use dataconst::data::summary::quantile;
use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
};

use crate::color::{generate_palette, parse_hex};

const DEFAULT_MARKER: Color32 = Color32::LIGHT_BLUE;

// ---------------------------------------------------------------------------
// Axis encoding
// ---------------------------------------------------------------------------

/// How a series maps onto a plot axis.
enum Axis {
    Numeric,
    /// Milliseconds since the epoch.
    Temporal,
    /// Index into the distinct labels, in first-seen order.
    Categorical(Vec<String>),
}

impl Axis {
    fn label(&self, value: f64) -> String {
        match self {
            Axis::Numeric => format!("{value}"),
            Axis::Temporal => chrono::DateTime::from_timestamp_millis(value as i64)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            Axis::Categorical(labels) => {
                let idx = value.round();
                if (value - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

/// Encode a series as plot coordinates. Nulls become `None`.
fn encode(series: &Series) -> (Vec<Option<f64>>, Axis) {
    match series.column_type {
        ColumnType::Integer | ColumnType::Float | ColumnType::Boolean => (
            series.values.iter().map(|v| v.as_f64()).collect(),
            Axis::Numeric,
        ),
        ColumnType::Temporal => (
            series
                .values
                .iter()
                .map(|v| v.as_timestamp_millis().map(|ms| ms as f64))
                .collect(),
            Axis::Temporal,
        ),
        ColumnType::Text => {
            let mut labels: Vec<String> = Vec::new();
            let mut index: HashMap<String, usize> = HashMap::new();
            let coords = series
                .values
                .iter()
                .map(|v| {
                    if v.is_null() {
                        return None;
                    }
                    let label = v.to_string();
                    let next = labels.len();
                    let idx = *index.entry(label.clone()).or_insert_with(|| {
                        labels.push(label);
                        next
                    });
                    Some(idx as f64)
                })
                .collect();
            (coords, Axis::Categorical(labels))
        }
    }
}

/// Pair up two encoded series, dropping rows where either side is null.
fn paired(xs: &[Option<f64>], ys: &[Option<f64>]) -> Vec<[f64; 2]> {
    xs.iter()
        .zip(ys)
        .filter_map(|(x, y)| Some([(*x)?, (*y)?]))
        .collect()
}

// ---------------------------------------------------------------------------
// Histogram binning
// ---------------------------------------------------------------------------

/// Sturges' rule.
pub fn sturges_bins(n: usize) -> usize {
    if n < 2 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// One histogram bin: `[start, start + width)`, the last bin closed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub width: f64,
    pub count: usize,
}

/// Split `values` into `bins` equal-width bins over their range.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.5,
            width: 1.0,
            count: finite.len(),
        }];
    }

    let width = range / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            width,
            count,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Box plot statistics
// ---------------------------------------------------------------------------

/// Quartiles with whiskers at the furthest points within 1.5 IQR.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub lower: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper: f64,
    pub outliers: Vec<f64>,
}

pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let fence = 1.5 * (q3 - q1);
    let (lo_fence, hi_fence) = (q1 - fence, q3 + fence);

    let inside = sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    let lower = inside.clone().fold(f64::INFINITY, f64::min);
    let upper = inside.fold(f64::NEG_INFINITY, f64::max);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < lo_fence || *v > hi_fence)
        .collect();

    Some(BoxSummary {
        lower,
        q1,
        median,
        q3,
        upper,
        outliers,
    })
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render a chart spec. `bins` overrides Sturges' rule for numeric histograms.
pub fn chart(ui: &mut Ui, spec: &ChartSpec, bins: Option<usize>) {
    ui.heading(&spec.title);

    let marker = spec
        .style
        .marker_color
        .as_deref()
        .and_then(parse_hex)
        .unwrap_or(DEFAULT_MARKER);

    match spec.kind {
        ChartKind::Scatter | ChartKind::TimeSeries => xy_chart(ui, spec, marker),
        ChartKind::Histogram => histogram_chart(ui, spec, marker, bins),
        ChartKind::BoxPlot => box_chart(ui, spec, marker),
    }
}

fn base_plot<'a>(spec: &ChartSpec) -> Plot<'a> {
    Plot::new(format!("chart_{}", spec.kind))
        .height(420.0)
        .legend(Legend::default())
        .x_axis_label(spec.x_title.clone())
        .y_axis_label(spec.y_title.clone())
        .show_grid(spec.style.show_grid)
        .show_background(!spec.style.transparent_background)
}

fn xy_chart(ui: &mut Ui, spec: &ChartSpec, marker: Color32) {
    let (Some(x), Some(y)) = (&spec.x, &spec.y) else {
        return;
    };
    let (xs, x_axis) = encode(x);
    let (ys, y_axis) = encode(y);
    let mut points = paired(&xs, &ys);
    if spec.kind == ChartKind::TimeSeries {
        points.sort_by(|a, b| a[0].total_cmp(&b[0]));
    }
    let name = y.column.clone();
    let kind = spec.kind;

    base_plot(spec)
        .x_axis_formatter(move |mark: GridMark, _range| x_axis.label(mark.value))
        .y_axis_formatter(move |mark: GridMark, _range| y_axis.label(mark.value))
        .show(ui, |plot_ui| {
            let series = PlotPoints::from(points);
            if kind == ChartKind::TimeSeries {
                plot_ui.line(Line::new(series).name(&name).color(marker).width(1.5));
            } else {
                plot_ui.points(Points::new(series).name(&name).color(marker).radius(3.0));
            }
        });
}

fn histogram_chart(ui: &mut Ui, spec: &ChartSpec, marker: Color32, bins: Option<usize>) {
    let Some(series) = &spec.x else {
        return;
    };
    let fill = 1.0 - spec.style.bar_gap.unwrap_or(0.0);
    let (coords, axis) = encode(series);

    let bars: Vec<Bar> = match &axis {
        Axis::Categorical(labels) => {
            let mut counts = vec![0usize; labels.len()];
            for idx in coords.iter().flatten() {
                counts[*idx as usize] += 1;
            }
            let palette = generate_palette(labels.len());
            counts
                .iter()
                .zip(labels)
                .zip(palette)
                .enumerate()
                .map(|(i, ((count, label), colour))| {
                    Bar::new(i as f64, *count as f64)
                        .width(fill)
                        .fill(colour)
                        .name(label)
                })
                .collect()
        }
        Axis::Numeric | Axis::Temporal => {
            let values: Vec<f64> = coords.iter().flatten().copied().collect();
            let bins = bins.unwrap_or_else(|| sturges_bins(values.len()));
            histogram(&values, bins)
                .into_iter()
                .map(|bin| {
                    Bar::new(bin.start + bin.width / 2.0, bin.count as f64)
                        .width(bin.width * fill)
                        .fill(marker)
                })
                .collect()
        }
    };

    let name = series.column.clone();
    base_plot(spec)
        .x_axis_formatter(move |mark: GridMark, _range| axis.label(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(&name).color(marker));
        });
}

fn box_chart(ui: &mut Ui, spec: &ChartSpec, marker: Color32) {
    let Some(series) = &spec.y else {
        return;
    };
    if !series.column_type.is_numeric() {
        ui.label(
            RichText::new(format!(
                "'{}' is a {} column; box plots need numeric data.",
                series.column, series.column_type
            ))
            .color(Color32::YELLOW),
        );
        return;
    }

    let values: Vec<f64> = series.values.iter().filter_map(|v| v.as_f64()).collect();
    let Some(summary) = box_summary(&values) else {
        ui.label("No values to plot.");
        return;
    };

    let elem = BoxElem::new(
        0.0,
        BoxSpread::new(
            summary.lower,
            summary.q1,
            summary.median,
            summary.q3,
            summary.upper,
        ),
    )
    .name(&series.column)
    .box_width(0.5)
    .fill(marker.gamma_multiply(0.4))
    .stroke(Stroke::new(1.5, marker));

    let outliers: PlotPoints = summary.outliers.iter().map(|v| [0.0, *v]).collect();
    let name = series.column.clone();

    base_plot(spec)
        .x_axis_formatter(|_mark: GridMark, _range| String::new())
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&name));
            plot_ui.points(Points::new(outliers).color(marker).radius(2.5));
        });
}
