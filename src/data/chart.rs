use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::model::{parse_timestamp, CellValue, ColumnType, Table};
use crate::error::ChartError;

// ---------------------------------------------------------------------------
// Chart kinds and requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Scatter,
    Histogram,
    BoxPlot,
    TimeSeries,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::Scatter,
        ChartKind::Histogram,
        ChartKind::BoxPlot,
        ChartKind::TimeSeries,
    ];

    /// Number of distinct columns the kind plots.
    pub fn arity(self) -> usize {
        match self {
            ChartKind::Scatter | ChartKind::TimeSeries => 2,
            ChartKind::Histogram | ChartKind::BoxPlot => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Histogram => "Histogram",
            ChartKind::BoxPlot => "Box Plot",
            ChartKind::TimeSeries => "Time Series",
        }
    }

    /// Prompt for each column selection, in request order.
    pub fn selection_prompts(self) -> &'static [&'static str] {
        match self {
            ChartKind::Scatter => &["Column for the X axis", "Column for the Y axis"],
            ChartKind::Histogram => &["Column for distribution analysis"],
            ChartKind::BoxPlot => &["Column for outlier analysis"],
            ChartKind::TimeSeries => &["Time column", "Value column"],
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartKind::Scatter => "scatter",
            ChartKind::Histogram => "histogram",
            ChartKind::BoxPlot => "box plot",
            ChartKind::TimeSeries => "time series",
        })
    }
}

/// A validated chart request: one variant per kind with named column slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRequest {
    Scatter { x: String, y: String },
    Histogram { column: String },
    BoxPlot { column: String },
    TimeSeries { time: String, value: String },
}

impl ChartRequest {
    /// Build a request from ordered column selections (`[x, y]`, `[time, value]`
    /// or `[column]`).
    pub fn new<S: AsRef<str>>(kind: ChartKind, selections: &[S]) -> Result<Self, ChartError> {
        let names: Vec<&str> = selections.iter().map(|s| s.as_ref()).collect();
        check_arity(kind, &names)?;
        let name = |i: usize| names[i].to_string();
        Ok(match kind {
            ChartKind::Scatter => ChartRequest::Scatter {
                x: name(0),
                y: name(1),
            },
            ChartKind::Histogram => ChartRequest::Histogram { column: name(0) },
            ChartKind::BoxPlot => ChartRequest::BoxPlot { column: name(0) },
            ChartKind::TimeSeries => ChartRequest::TimeSeries {
                time: name(0),
                value: name(1),
            },
        })
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartRequest::Scatter { .. } => ChartKind::Scatter,
            ChartRequest::Histogram { .. } => ChartKind::Histogram,
            ChartRequest::BoxPlot { .. } => ChartKind::BoxPlot,
            ChartRequest::TimeSeries { .. } => ChartKind::TimeSeries,
        }
    }

    pub fn columns(&self) -> Vec<&str> {
        match self {
            ChartRequest::Scatter { x, y } => vec![x.as_str(), y.as_str()],
            ChartRequest::Histogram { column } | ChartRequest::BoxPlot { column } => {
                vec![column.as_str()]
            }
            ChartRequest::TimeSeries { time, value } => vec![time.as_str(), value.as_str()],
        }
    }
}

fn check_arity(kind: ChartKind, names: &[&str]) -> Result<(), ChartError> {
    let expected = kind.arity();
    let mut distinct = names.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    if names.len() == expected && distinct.len() == expected {
        return Ok(());
    }
    Err(ChartError::ArityMismatch {
        kind,
        expected,
        received: if names.len() == expected {
            distinct.len()
        } else {
            names.len()
        },
    })
}

// ---------------------------------------------------------------------------
// Chart specification
// ---------------------------------------------------------------------------

/// One column's data handed to the renderer.
///
/// On the wire the values are plain JSON scalars read back through
/// `column_type`, so text that looks like a date stays text and non-finite
/// floats travel as `"inf"`, `"-inf"` or `"NaN"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireSeries", from = "WireSeries")]
pub struct Series {
    pub column: String,
    pub column_type: ColumnType,
    pub values: Vec<CellValue>,
}

#[derive(Serialize, Deserialize)]
struct WireSeries {
    column: String,
    column_type: ColumnType,
    values: Vec<Value>,
}

impl From<Series> for WireSeries {
    fn from(series: Series) -> Self {
        let values = series
            .values
            .into_iter()
            .map(|v| match v {
                CellValue::Null => Value::Null,
                CellValue::Bool(b) => Value::Bool(b),
                CellValue::Integer(i) => Value::from(i),
                CellValue::Float(f) => Number::from_f64(f)
                    .map_or_else(|| Value::String(f.to_string()), Value::Number),
                CellValue::Timestamp(ts) => {
                    Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
                }
                CellValue::Text(s) => Value::String(s),
            })
            .collect();
        WireSeries {
            column: series.column,
            column_type: series.column_type,
            values,
        }
    }
}

impl From<WireSeries> for Series {
    fn from(wire: WireSeries) -> Self {
        let column_type = wire.column_type;
        let values = wire
            .values
            .into_iter()
            .map(|v| match v {
                Value::Null => CellValue::Null,
                Value::Bool(b) => CellValue::Bool(b),
                Value::Number(n) => match (column_type, n.as_i64()) {
                    (ColumnType::Float, _) | (_, None) => {
                        n.as_f64().map_or(CellValue::Null, CellValue::Float)
                    }
                    (_, Some(i)) => CellValue::Integer(i),
                },
                Value::String(s) => match column_type {
                    ColumnType::Temporal => {
                        parse_timestamp(&s).map_or(CellValue::Text(s), CellValue::Timestamp)
                    }
                    ColumnType::Float | ColumnType::Integer => match s.parse::<f64>() {
                        Ok(f) => CellValue::Float(f),
                        Err(_) => CellValue::Text(s),
                    },
                    ColumnType::Text | ColumnType::Boolean => CellValue::Text(s),
                },
                other => CellValue::Text(other.to_string()),
            })
            .collect();
        Series {
            column: wire.column,
            column_type,
            values,
        }
    }
}

/// Presentation hints; renderers may ignore what they cannot express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// `#rrggbb`
    pub marker_color: Option<String>,
    pub bar_gap: Option<f64>,
    pub bar_group_gap: Option<f64>,
    pub show_grid: bool,
    pub transparent_background: bool,
}

impl ChartStyle {
    pub fn for_kind(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Histogram => ChartStyle {
                marker_color: Some("#1f77b4".to_string()),
                bar_gap: Some(0.1),
                bar_group_gap: Some(0.1),
                show_grid: true,
                transparent_background: true,
            },
            ChartKind::BoxPlot => ChartStyle {
                marker_color: Some("#1f77b4".to_string()),
                bar_gap: None,
                bar_group_gap: None,
                show_grid: true,
                transparent_background: true,
            },
            ChartKind::Scatter | ChartKind::TimeSeries => ChartStyle {
                marker_color: None,
                bar_gap: None,
                bar_group_gap: None,
                show_grid: true,
                transparent_background: false,
            },
        }
    }
}

/// Renderer-agnostic description of a chart.
///
/// Histograms carry only `x`, box plots only `y`; scatter and time series carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub x_title: String,
    pub y_title: String,
    pub x: Option<Series>,
    pub y: Option<Series>,
    pub style: ChartStyle,
}

/// Validate `request` against `table` and resolve the selected columns.
///
/// The time column of a time series is not type-checked.
pub fn build_chart_spec(table: &Table, request: &ChartRequest) -> Result<ChartSpec, ChartError> {
    let kind = request.kind();
    check_arity(kind, &request.columns())?;
    for name in request.columns() {
        if table.column(name).is_none() {
            return Err(ChartError::UnknownColumn(name.to_string()));
        }
    }

    let series = |name: &str| -> Result<Series, ChartError> {
        let column = table
            .column(name)
            .ok_or_else(|| ChartError::UnknownColumn(name.to_string()))?;
        Ok(Series {
            column: name.to_string(),
            column_type: column.column_type(),
            values: column.values(),
        })
    };

    let style = ChartStyle::for_kind(kind);
    let spec = match request {
        ChartRequest::Scatter { x, y } => ChartSpec {
            kind,
            title: format!("Relationship between {x} and {y}"),
            x_title: x.clone(),
            y_title: y.clone(),
            x: Some(series(x)?),
            y: Some(series(y)?),
            style,
        },
        ChartRequest::Histogram { column } => ChartSpec {
            kind,
            title: format!("Distribution of {column}"),
            x_title: column.clone(),
            y_title: "Count".to_string(),
            x: Some(series(column)?),
            y: None,
            style,
        },
        ChartRequest::BoxPlot { column } => ChartSpec {
            kind,
            title: format!("Box Plot of {column}"),
            x_title: String::new(),
            y_title: "Values".to_string(),
            x: None,
            y: Some(series(column)?),
            style,
        },
        ChartRequest::TimeSeries { time, value } => ChartSpec {
            kind,
            title: format!("Evolution of {value} over time"),
            x_title: time.clone(),
            y_title: value.clone(),
            x: Some(series(time)?),
            y: Some(series(value)?),
            style,
        },
    };

    log::debug!("Built {kind} chart spec: {}", spec.title);
    Ok(spec)
}
