//! Ingestion, descriptive statistics and chart specifications for uploaded
//! CSV/Excel files. Every entry point is a pure function of its inputs.

pub mod config;
pub mod data;
pub mod error;

pub use data::chart::{build_chart_spec, ChartKind, ChartRequest, ChartSpec};
pub use data::loader::{ingest, ingest_with, IngestOptions};
pub use data::model::Table;
pub use data::summary::{preview, summarize, DatasetProfile};
pub use error::{ChartError, IngestError};
