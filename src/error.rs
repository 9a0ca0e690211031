use thiserror::Error;

use crate::data::chart::ChartKind;
use crate::data::loader::FileFormat;

/// Failure to turn an uploaded blob into a [`Table`](crate::data::model::Table).
#[derive(Debug, Error)]
pub enum IngestError {
    /// The declared extension is not one of csv, xlsx, xls.
    #[error("unsupported file format '.{0}' (expected csv, xlsx or xls)")]
    UnsupportedFormat(String),

    /// The parser rejected the input, or it produced no usable columns.
    #[error("could not parse {format} file: {message}")]
    Parse { format: FileFormat, message: String },
}

impl IngestError {
    pub(crate) fn parse(format: FileFormat, err: impl std::fmt::Display) -> Self {
        IngestError::Parse {
            format,
            message: err.to_string(),
        }
    }
}

/// Structural problems when assembling a table from columns.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("table has no columns")]
    NoColumns,

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Rejected chart request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("{kind} chart needs {expected} distinct column(s), got {received}")]
    ArityMismatch {
        kind: ChartKind,
        expected: usize,
        received: usize,
    },
}
