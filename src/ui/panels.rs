use dataconst::data::chart::ChartKind;
use dataconst::data::loader::FileFormat;
use dataconst::data::summary::{ColumnProfile, DatasetProfile, TablePreview, TextProfile};
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::{load_file, AppState, LoadedFile, Page};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Navigation and footer
// ---------------------------------------------------------------------------

/// Render the left navigation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(8.0);
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading("Dataconst Jr");
        ui.label("Statistics Dashboard");
    });
    ui.separator();

    for page in Page::ALL {
        if ui
            .selectable_label(state.page == page, page.label())
            .clicked()
        {
            state.page = page;
        }
    }
}

pub fn footer(ui: &mut Ui) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(
            RichText::new("Developed by Dataconst Jr - Statistics Junior Enterprise")
                .small()
                .weak(),
        );
    });
}

pub fn home_page(ui: &mut Ui) {
    ui.heading("Welcome to the Statistics Dashboard");
    ui.add_space(8.0);
    ui.label(
        "Upload a CSV or Excel file to explore it. \
         The Descriptive Analysis page summarizes every column, \
         and the Visualizations page charts the columns you pick.",
    );
    ui.add_space(8.0);
    ui.label(format!(
        "Supported formats: {}",
        FileFormat::EXTENSIONS.join(", ")
    ));
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

/// Ask for a file and ingest it. `None` when the dialog was cancelled.
fn pick_and_load(state: &AppState) -> Option<anyhow::Result<LoadedFile>> {
    let path = rfd::FileDialog::new()
        .set_title("Open data file")
        .add_filter("Supported files", &FileFormat::EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .pick_file()?;

    let result = load_file(&path, &state.config);
    match &result {
        Ok(file) => log::info!(
            "Loaded {} with {} rows and {} columns",
            file.name,
            file.table.row_count(),
            file.table.column_count()
        ),
        Err(e) => log::error!("Failed to load {}: {e:#}", path.display()),
    }
    Some(result)
}

fn file_header(ui: &mut Ui, name: Option<&str>) -> bool {
    let mut clicked = false;
    ui.horizontal(|ui: &mut Ui| {
        clicked = ui.button("Load data…").clicked();
        if let Some(name) = name {
            ui.label(RichText::new(name).monospace());
        }
    });
    clicked
}

fn error_label(ui: &mut Ui, error: Option<&str>) {
    if let Some(msg) = error {
        ui.label(RichText::new(msg).color(Color32::RED));
    }
}

// ---------------------------------------------------------------------------
// Descriptive analysis
// ---------------------------------------------------------------------------

pub fn descriptive_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Descriptive Analysis");
    ui.separator();

    let name = state.descriptive.file.as_ref().map(|f| f.name.clone());
    if file_header(ui, name.as_deref()) {
        match pick_and_load(state) {
            Some(Ok(file)) => state.descriptive.set_file(file, state.config.preview_rows),
            Some(Err(e)) => state.descriptive.set_error(&e),
            None => {}
        }
    }

    let view = &state.descriptive;
    error_label(ui, view.error.as_deref());
    let Some(profile) = &view.profile else {
        if view.error.is_none() {
            ui.label("Upload a file to see its summary.");
        }
        return;
    };

    ui.add_space(8.0);
    metrics(ui, profile);

    if let Some(preview) = &view.preview {
        ui.add_space(12.0);
        ui.strong("Data preview");
        ui.push_id("preview_table", |ui: &mut Ui| preview_table(ui, preview));
    }

    ui.add_space(12.0);
    ui.strong("Descriptive statistics");
    if profile.column_profiles.is_empty() {
        ui.label("No numeric columns.");
    } else {
        ui.push_id("stats_table", |ui: &mut Ui| {
            stats_table(ui, &profile.column_profiles)
        });
    }

    if !profile.text_profiles.is_empty() {
        ui.add_space(12.0);
        ui.strong("Text columns");
        ui.push_id("text_table", |ui: &mut Ui| {
            text_table(ui, &profile.text_profiles)
        });
    }
}

fn metrics(ui: &mut Ui, profile: &DatasetProfile) {
    let metric = |ui: &mut Ui, label: &str, value: String| {
        ui.group(|ui: &mut Ui| {
            ui.vertical(|ui: &mut Ui| {
                ui.label(RichText::new(label).weak());
                ui.label(RichText::new(value).size(22.0).strong());
            });
        });
    };
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Total Records", profile.row_count.to_string());
        metric(ui, "Total Columns", profile.column_count.to_string());
        metric(ui, "Memory Used", format!("{:.2} KB", profile.memory_kib()));
    });
}

fn stat(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{v:.2}"))
}

fn preview_table(ui: &mut Ui, preview: &TablePreview) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .columns(Column::auto().at_least(60.0), preview.columns.len())
        .header(20.0, |mut header| {
            for name in &preview.columns {
                header.col(|ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|mut body| {
            for row in &preview.rows {
                body.row(18.0, |mut table_row| {
                    for cell in row {
                        table_row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

/// Statistics as rows, numeric columns as columns.
fn stats_table(ui: &mut Ui, profiles: &[ColumnProfile]) {
    let rows: [(&str, fn(&ColumnProfile) -> String); 8] = [
        ("count", |p| p.count.to_string()),
        ("mean", |p| stat(p.mean)),
        ("std", |p| stat(p.std)),
        ("min", |p| stat(p.min)),
        ("25%", |p| stat(p.p25)),
        ("50%", |p| stat(p.median)),
        ("75%", |p| stat(p.p75)),
        ("max", |p| stat(p.max)),
    ];

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(50.0))
        .columns(Column::auto().at_least(70.0), profiles.len())
        .header(20.0, |mut header| {
            header.col(|_ui| {});
            for p in profiles {
                header.col(|ui| {
                    ui.strong(&p.column);
                });
            }
        })
        .body(|mut body| {
            for (label, value) in rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.strong(label);
                    });
                    for p in profiles {
                        row.col(|ui| {
                            ui.label(value(p));
                        });
                    }
                });
            }
        });
}

fn text_table(ui: &mut Ui, profiles: &[TextProfile]) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .columns(Column::auto().at_least(70.0), 5)
        .header(20.0, |mut header| {
            for title in ["column", "count", "unique", "top", "freq"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for p in profiles {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(&p.column);
                    });
                    row.col(|ui| {
                        ui.label(p.count.to_string());
                    });
                    row.col(|ui| {
                        ui.label(p.unique.to_string());
                    });
                    row.col(|ui| {
                        ui.label(p.top.as_deref().unwrap_or("NaN"));
                    });
                    row.col(|ui| {
                        ui.label(p.freq.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Visualizations
// ---------------------------------------------------------------------------

pub fn visualizations_page(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Visualizations");
    ui.separator();

    let name = state.charts.file.as_ref().map(|f| f.name.clone());
    if file_header(ui, name.as_deref()) {
        match pick_and_load(state) {
            Some(Ok(file)) => state.charts.set_file(file),
            Some(Err(e)) => state.charts.set_error(&e),
            None => {}
        }
    }

    // Clone what we need so we can mutate state inside the combo boxes.
    let Some(columns) = state.charts.file.as_ref().map(|f| {
        f.table
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
    }) else {
        error_label(ui, state.charts.error.as_deref());
        if state.charts.error.is_none() {
            ui.label("Upload a file to build charts.");
        }
        return;
    };

    ui.add_space(8.0);
    let current = state.charts.kind;
    egui::ComboBox::from_label("Chart type")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for kind in ChartKind::ALL {
                if ui.selectable_label(current == kind, kind.label()).clicked() {
                    state.charts.set_kind(kind);
                }
            }
        });

    for (slot, prompt) in state.charts.kind.selection_prompts().iter().enumerate() {
        let selected = state.charts.selections[slot].clone();
        ui.horizontal(|ui: &mut Ui| {
            ui.label(*prompt);
            egui::ComboBox::from_id_salt(("chart_column", slot))
                .selected_text(&selected)
                .show_ui(ui, |ui: &mut Ui| {
                    for col in &columns {
                        if ui.selectable_label(selected == *col, col).clicked() {
                            state.charts.select(slot, col.clone());
                        }
                    }
                });
        });
    }

    ui.add_space(8.0);
    error_label(ui, state.charts.error.as_deref());
    if let Some(spec) = &state.charts.spec {
        plot::chart(ui, spec, state.config.histogram_bins);
    }
}
