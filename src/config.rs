use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::loader::IngestOptions;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "DATACONST_CONFIG";
/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "dataconst.json";

/// Dashboard settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub ingest: IngestOptions,
    /// Rows shown in the data preview.
    pub preview_rows: usize,
    /// Fixed histogram bin count; Sturges' rule when `None`.
    pub histogram_bins: Option<usize>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            ingest: IngestOptions::default(),
            preview_rows: 5,
            histogram_bins: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        if config.histogram_bins == Some(0) {
            bail!("histogram_bins must be at least 1 in {}", path.display());
        }
        Ok(config)
    }

    /// `$DATACONST_CONFIG`, else `./dataconst.json`, else defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            return Self::from_path(local);
        }
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::loader::SheetSelector;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"preview_rows": 10, "ingest": {{"sheet": 1}}}}"#).unwrap();

        let config = DashboardConfig::from_path(file.path()).unwrap();
        assert_eq!(config.preview_rows, 10);
        assert_eq!(config.histogram_bins, None);
        assert_eq!(config.ingest.sheet, Some(SheetSelector::Index(1)));
        assert_eq!(config.ingest.na_values, IngestOptions::default().na_values);
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "preview_rows = 10").unwrap();

        let err = DashboardConfig::from_path(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config file"));
    }

    #[test]
    fn zero_histogram_bins_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"histogram_bins": 0}}"#).unwrap();

        let err = DashboardConfig::from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("histogram_bins"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DashboardConfig::from_path(&dir.path().join("absent.json")).is_err());
    }
}
