use std::path::Path;

use anyhow::{Context, Result};
use dataconst::config::DashboardConfig;
use dataconst::data::chart::{build_chart_spec, ChartKind, ChartRequest, ChartSpec};
use dataconst::data::loader::{extension_of, ingest_with};
use dataconst::data::model::Table;
use dataconst::data::summary::{preview, summarize, DatasetProfile, TablePreview};

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Descriptive,
    Visualizations,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Home, Page::Descriptive, Page::Visualizations];

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Descriptive => "Descriptive Analysis",
            Page::Visualizations => "Visualizations",
        }
    }
}

// ---------------------------------------------------------------------------
// Uploaded file
// ---------------------------------------------------------------------------

/// A user-picked file, parsed into a table.
pub struct LoadedFile {
    pub name: String,
    pub table: Table,
}

/// Read and ingest a file. The extension of its name selects the parser.
pub fn load_file(path: &Path, config: &DashboardConfig) -> Result<LoadedFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let table = ingest_with(&bytes, extension_of(&name), &config.ingest)?;
    Ok(LoadedFile { name, table })
}

// ---------------------------------------------------------------------------
// Descriptive analysis page
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DescriptiveView {
    pub file: Option<LoadedFile>,
    pub profile: Option<DatasetProfile>,
    pub preview: Option<TablePreview>,
    pub error: Option<String>,
}

impl DescriptiveView {
    pub fn set_file(&mut self, file: LoadedFile, preview_rows: usize) {
        self.profile = Some(summarize(&file.table));
        self.preview = Some(preview(&file.table, preview_rows));
        self.file = Some(file);
        self.error = None;
    }

    pub fn set_error(&mut self, err: &anyhow::Error) {
        *self = Self {
            error: Some(format!("Error processing file: {err:#}")),
            ..Self::default()
        };
    }
}

// ---------------------------------------------------------------------------
// Visualizations page
// ---------------------------------------------------------------------------

pub struct ChartView {
    pub file: Option<LoadedFile>,
    pub kind: ChartKind,
    /// Column picked for each selection slot; only the first `kind.arity()` count.
    pub selections: [String; 2],
    pub spec: Option<ChartSpec>,
    pub error: Option<String>,
}

impl Default for ChartView {
    fn default() -> Self {
        Self {
            file: None,
            kind: ChartKind::Scatter,
            selections: Default::default(),
            spec: None,
            error: None,
        }
    }
}

impl ChartView {
    /// Install a new file; selections default to the first two columns.
    pub fn set_file(&mut self, file: LoadedFile) {
        let names = file.table.column_names();
        let first = names.first().copied().unwrap_or_default().to_string();
        let second = names.get(1).map_or(first.clone(), |n| n.to_string());
        self.selections = [first, second];
        self.file = Some(file);
        self.rebuild();
    }

    pub fn set_error(&mut self, err: &anyhow::Error) {
        *self = Self {
            kind: self.kind,
            error: Some(format!("Error processing file: {err:#}")),
            ..Self::default()
        };
    }

    pub fn set_kind(&mut self, kind: ChartKind) {
        self.kind = kind;
        self.rebuild();
    }

    pub fn select(&mut self, slot: usize, column: String) {
        if let Some(selection) = self.selections.get_mut(slot) {
            *selection = column;
            self.rebuild();
        }
    }

    /// Re-derive the chart spec from the current file and selections.
    pub fn rebuild(&mut self) {
        let Some(file) = &self.file else {
            self.spec = None;
            return;
        };
        let selections = &self.selections[..self.kind.arity()];
        let result = ChartRequest::new(self.kind, selections)
            .and_then(|request| build_chart_spec(&file.table, &request));

        match result {
            Ok(spec) => {
                self.spec = Some(spec);
                self.error = None;
            }
            Err(e) => {
                log::warn!("Chart request rejected: {e}");
                self.spec = None;
                self.error = Some(e.to_string());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Each page keeps its own upload.
pub struct AppState {
    pub config: DashboardConfig,
    pub page: Page,
    pub descriptive: DescriptiveView,
    pub charts: ChartView,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            page: Page::Home,
            descriptive: DescriptiveView::default(),
            charts: ChartView::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataconst::data::loader::ingest;

    fn loaded(csv: &str) -> LoadedFile {
        LoadedFile {
            name: "upload.csv".into(),
            table: ingest(csv.as_bytes(), "csv").unwrap(),
        }
    }

    #[test]
    fn descriptive_view_profiles_the_upload() {
        let mut view = DescriptiveView::default();
        view.set_file(loaded("age,name\n10,a\n20,b\n30,c\n40,d\n"), 2);

        let profile = view.profile.as_ref().unwrap();
        assert_eq!(profile.row_count, 4);
        assert_eq!(profile.column_profiles[0].median, Some(25.0));
        assert_eq!(view.preview.as_ref().unwrap().rows.len(), 2);

        view.set_error(&anyhow::anyhow!("boom"));
        assert!(view.file.is_none());
        assert_eq!(view.error.as_deref(), Some("Error processing file: boom"));
    }

    #[test]
    fn chart_view_defaults_to_first_two_columns() {
        let mut view = ChartView::default();
        view.set_file(loaded("x,y,z\n1,2,3\n4,5,6\n"));
        assert_eq!(view.selections, ["x".to_string(), "y".to_string()]);
        let spec = view.spec.as_ref().unwrap();
        assert_eq!(spec.title, "Relationship between x and y");
    }

    #[test]
    fn chart_view_reports_rejected_requests() {
        let mut view = ChartView::default();
        view.set_file(loaded("only\n1\n2\n"));
        assert!(view.spec.is_none());
        assert!(view.error.as_deref().unwrap().contains("distinct"));

        view.set_kind(ChartKind::Histogram);
        assert!(view.error.is_none());
        assert_eq!(view.spec.as_ref().unwrap().title, "Distribution of only");
    }

    #[test]
    fn chart_view_switches_columns() {
        let mut view = ChartView::default();
        view.set_file(loaded("t,v,w\n2024-01-01,1,4\n2024-01-02,2,5\n"));
        view.set_kind(ChartKind::TimeSeries);
        view.select(1, "w".into());
        assert_eq!(view.spec.as_ref().unwrap().title, "Evolution of w over time");
        view.select(7, "ignored".into());
        assert_eq!(view.selections[0], "t");
    }
}
