use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, StringArray,
    TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema, TimeUnit, TimestampMillisecondType};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::TableError;

// ---------------------------------------------------------------------------
// CellValue – a single cell of an uploaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
///
/// Serialized untagged so chart data reads as plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Timestamp(ts) => write!(f, "{ts}"),
            CellValue::Null => write!(f, "NaN"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` (booleans count as 0/1).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Milliseconds since the Unix epoch for timestamp cells.
    pub fn as_timestamp_millis(&self) -> Option<i64> {
        match self {
            CellValue::Timestamp(ts) => Some(ts.and_utc().timestamp_millis()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// Parse the ISO-like date/datetime spellings found in exported spreadsheets.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// ColumnType – the homogeneous type of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Text,
    Temporal,
}

impl ColumnType {
    /// Integer and float columns get numeric profiles; booleans do not.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Boolean => DataType::Boolean,
            ColumnType::Text => DataType::Utf8,
            ColumnType::Temporal => DataType::Timestamp(TimeUnit::Millisecond, None),
        }
    }

    fn from_data_type(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int64 => ColumnType::Integer,
            DataType::Float64 => ColumnType::Float,
            DataType::Boolean => ColumnType::Boolean,
            DataType::Timestamp(_, _) => ColumnType::Temporal,
            _ => ColumnType::Text,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "int64",
            ColumnType::Float => "float64",
            ColumnType::Boolean => "bool",
            ColumnType::Text => "text",
            ColumnType::Temporal => "datetime",
        };
        f.write_str(name)
    }
}

/// Decide the column type from its non-null cells.
///
/// Integers alone stay integers, integers mixed with floats widen to float,
/// any other mix (or any text) falls back to text. An all-null column is float.
pub fn infer_column_type(values: &[CellValue]) -> ColumnType {
    let (mut ints, mut floats, mut bools, mut stamps) = (false, false, false, false);
    for value in values {
        match value {
            CellValue::Null => {}
            CellValue::Integer(_) => ints = true,
            CellValue::Float(_) => floats = true,
            CellValue::Bool(_) => bools = true,
            CellValue::Timestamp(_) => stamps = true,
            CellValue::Text(_) => return ColumnType::Text,
        }
    }

    let numeric = ints || floats;
    match [numeric, bools, stamps].iter().filter(|&&seen| seen).count() {
        0 => ColumnType::Float,
        1 if numeric && floats => ColumnType::Float,
        1 if numeric => ColumnType::Integer,
        1 if bools => ColumnType::Boolean,
        1 => ColumnType::Temporal,
        _ => ColumnType::Text,
    }
}

fn build_array(column_type: ColumnType, values: &[CellValue]) -> ArrayRef {
    match column_type {
        ColumnType::Integer => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    CellValue::Integer(i) => Some(*i),
                    _ => None,
                })
                .collect::<Int64Array>(),
        ),
        ColumnType::Float => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    CellValue::Integer(_) | CellValue::Float(_) => v.as_f64(),
                    _ => None,
                })
                .collect::<Float64Array>(),
        ),
        ColumnType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| match v {
                    CellValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        ColumnType::Temporal => Arc::new(
            values
                .iter()
                .map(CellValue::as_timestamp_millis)
                .collect::<TimestampMillisecondArray>(),
        ),
        ColumnType::Text => Arc::new(
            values
                .iter()
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<StringArray>(),
        ),
    }
}

// ---------------------------------------------------------------------------
// ColumnData – a named column before it is frozen into a Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl ColumnData {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the immutable, request-scoped result of ingestion
// ---------------------------------------------------------------------------

/// Named, equally long, homogeneously typed columns backed by an Arrow batch.
#[derive(Debug, Clone)]
pub struct Table {
    batch: RecordBatch,
    source_bytes: usize,
}

impl Table {
    /// Freeze columns into a table. Names must be unique and lengths equal.
    pub fn from_columns(columns: Vec<ColumnData>) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }

        let mut names = HashSet::with_capacity(columns.len());
        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());

        for column in columns {
            if !names.insert(column.name.clone()) {
                return Err(TableError::DuplicateColumn(column.name));
            }
            let column_type = infer_column_type(&column.values);
            arrays.push(build_array(column_type, &column.values));
            fields.push(Field::new(column.name, column_type.data_type(), true));
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        Ok(Table {
            batch,
            source_bytes: 0,
        })
    }

    /// Record the size of the blob this table was parsed from.
    pub fn with_source_bytes(mut self, bytes: usize) -> Self {
        self.source_bytes = bytes;
        self
    }

    pub fn source_bytes(&self) -> usize {
        self.source_bytes
    }

    pub fn row_count(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn column_count(&self) -> usize {
        self.batch.num_columns()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect()
    }

    /// Look a column up by name.
    pub fn column(&self, name: &str) -> Option<Column<'_>> {
        let index = self.batch.schema_ref().index_of(name).ok()?;
        Some(self.column_at(index))
    }

    /// Columns in their original order.
    pub fn columns(&self) -> impl Iterator<Item = Column<'_>> + '_ {
        (0..self.column_count()).map(move |i| self.column_at(i))
    }

    fn column_at(&self, index: usize) -> Column<'_> {
        let field = self.batch.schema_ref().field(index);
        Column {
            name: field.name(),
            column_type: ColumnType::from_data_type(field.data_type()),
            array: self.batch.column(index),
        }
    }

    /// Sum of the per-column footprint estimates.
    pub fn estimated_memory_bytes(&self) -> usize {
        self.columns().map(|c| c.estimated_memory_bytes()).sum()
    }

    /// The first `n` rows (zero-copy slice).
    pub fn head(&self, n: usize) -> Table {
        Table {
            batch: self.batch.slice(0, n.min(self.row_count())),
            source_bytes: self.source_bytes,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = pretty_format_batches(std::slice::from_ref(&self.batch)).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}

// ---------------------------------------------------------------------------
// Column – a borrowed view of one table column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    name: &'a str,
    column_type: ColumnType,
    array: &'a ArrayRef,
}

impl<'a> Column<'a> {
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.array.null_count()
    }

    /// The cell at `row`; out-of-range rows read as null.
    pub fn value(&self, row: usize) -> CellValue {
        if row >= self.array.len() || self.array.is_null(row) {
            return CellValue::Null;
        }
        let value = match self.column_type {
            ColumnType::Integer => self
                .array
                .as_primitive_opt::<Int64Type>()
                .map(|a| CellValue::Integer(a.value(row))),
            ColumnType::Float => self
                .array
                .as_primitive_opt::<Float64Type>()
                .map(|a| CellValue::Float(a.value(row))),
            ColumnType::Boolean => self
                .array
                .as_boolean_opt()
                .map(|a| CellValue::Bool(a.value(row))),
            ColumnType::Temporal => self
                .array
                .as_primitive_opt::<TimestampMillisecondType>()
                .and_then(|a| DateTime::from_timestamp_millis(a.value(row)))
                .map(|dt| CellValue::Timestamp(dt.naive_utc())),
            ColumnType::Text => self
                .array
                .as_string_opt::<i32>()
                .map(|a| CellValue::Text(a.value(row).to_owned())),
        };
        value.unwrap_or(CellValue::Null)
    }

    pub fn values(&self) -> Vec<CellValue> {
        (0..self.len()).map(|row| self.value(row)).collect()
    }

    /// Non-null values of an integer or float column; empty for other types.
    pub fn numeric_values(&self) -> Vec<f64> {
        match self.column_type {
            ColumnType::Integer => self
                .array
                .as_primitive_opt::<Int64Type>()
                .map(|a| a.iter().flatten().map(|i| i as f64).collect())
                .unwrap_or_default(),
            ColumnType::Float => self
                .array
                .as_primitive_opt::<Float64Type>()
                .map(|a| a.iter().flatten().collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Fixed width per element for scalar types, summed value sizes for text.
    pub fn estimated_memory_bytes(&self) -> usize {
        match self.column_type {
            ColumnType::Integer | ColumnType::Float | ColumnType::Temporal => self.len() * 8,
            ColumnType::Boolean => self.len(),
            ColumnType::Text => self
                .array
                .as_string_opt::<i32>()
                .map(|a| a.iter().flatten().map(str::len).sum())
                .unwrap_or(0),
        }
    }
}
