//! Data layer: table model, ingestion, profiling and chart specs.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx / .xls bytes
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse blob → Table
//!   └──────────┘
//!        │
//!        ├───────────────┐
//!        ▼               ▼
//!   ┌──────────┐   ┌──────────┐
//!   │ summary   │   │  chart    │  ChartRequest → ChartSpec
//!   └──────────┘   └──────────┘
//!   DatasetProfile
//! ```

pub mod chart;
pub mod loader;
pub mod model;
pub mod summary;
