use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use flight_delays::dashboard::ChartControl;
use flight_delays::data::filter::Dimension;
use flight_delays::data::model::{Column, GroupKey};
use flight_delays::state::AppState;

use super::plot;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    ui.checkbox(&mut state.show_data, "Show Data");
    ui.separator();

    let Some(filters) = &state.filters else {
        ui.label("No dataset loaded.");
        return;
    };

    // Collect the change first so state can be mutated after the borrow ends.
    let mut changed: Option<(Dimension, GroupKey)> = None;

    for dim in Dimension::ALL {
        ui.strong(format!("Select {dim}"));
        let current = filters
            .selected(dim)
            .map(ToString::to_string)
            .unwrap_or_default();
        egui::ComboBox::from_id_salt(("filter", dim))
            .selected_text(current)
            .width(ui.available_width())
            .show_ui(ui, |ui: &mut Ui| {
                for value in filters.options(dim) {
                    let is_selected = filters.selected(dim) == Some(value);
                    if ui.selectable_label(is_selected, value.to_string()).clicked() && !is_selected {
                        changed = Some((dim, value.clone()));
                    }
                }
            });
        ui.add_space(6.0);
    }

    if let Some((dim, value)) = changed {
        state.select(dim, value);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.dashboard.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export summary…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            let source = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            ui.label(format!("{source}: {} records", table.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Central panel – data preview and tabs
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Airline Delay Cause Analysis");

    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a flight delay CSV to begin  (File → Open…)");
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if state.show_data {
                data_preview(ui, state);
                ui.separator();
            }
            tabs(ui, state);
        });
}

/// First rows of the raw table.
fn data_preview(ui: &mut Ui, state: &AppState) {
    let Some(table) = &state.table else {
        return;
    };
    ui.strong("Dataset Sample");
    let rows = table.head(state.preview_rows);

    ScrollArea::horizontal()
        .id_salt("preview_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(TableColumn::auto(), Column::ALL.len())
                .header(20.0, |mut header| {
                    for col in Column::ALL {
                        header.col(|ui: &mut Ui| {
                            ui.strong(col.header());
                        });
                    }
                })
                .body(|mut body| {
                    for rec in rows {
                        body.row(18.0, |mut row| {
                            for col in Column::ALL {
                                row.col(|ui: &mut Ui| {
                                    ui.label(rec.display_cell(col));
                                });
                            }
                        });
                    }
                });
        });
}

fn tabs(ui: &mut Ui, state: &mut AppState) {
    let Some(dashboard) = &state.dashboard else {
        ui.label("No charts available.");
        return;
    };

    let titles: Vec<String> = dashboard.tabs.iter().map(|t| t.title.clone()).collect();
    let mut active = state.active_tab.min(titles.len().saturating_sub(1));
    ui.horizontal(|ui: &mut Ui| {
        for (i, title) in titles.iter().enumerate() {
            ui.selectable_value(&mut active, i, format!("📊 {title}"));
        }
    });
    ui.separator();

    let mut new_cause: Option<Column> = None;
    let mut new_histogram: Option<Column> = None;

    if let Some(tab) = dashboard.tabs.get(active) {
        ui.heading(tab.title.as_str());
        for (r, row) in tab.rows.iter().enumerate() {
            // Dropdowns sit directly above the chart they drive.
            for chart in row {
                match chart.control {
                    Some(ChartControl::DelayCause) => {
                        column_picker(
                            ui,
                            "Select Delay Cause",
                            state.options.delay_cause,
                            Column::DELAY_CAUSE_MINUTES.into_iter(),
                            &mut new_cause,
                        );
                    }
                    Some(ChartControl::HistogramColumn) => {
                        column_picker(
                            ui,
                            "Select Numerical Column",
                            state.options.histogram_column,
                            Column::numeric(),
                            &mut new_histogram,
                        );
                    }
                    None => {}
                }
            }

            ui.columns(row.len(), |cols: &mut [Ui]| {
                for (c, (col_ui, chart)) in cols.iter_mut().zip(row).enumerate() {
                    plot::chart(col_ui, chart, ("chart", active, r, c));
                }
            });
            ui.add_space(12.0);
        }
    }

    state.active_tab = active;
    if let Some(col) = new_cause {
        state.set_delay_cause(col);
    }
    if let Some(col) = new_histogram {
        state.set_histogram_column(col);
    }
}

fn column_picker(
    ui: &mut Ui,
    label: &str,
    current: Column,
    choices: impl Iterator<Item = Column>,
    changed: &mut Option<Column>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(label)
            .selected_text(current.header())
            .show_ui(ui, |ui: &mut Ui| {
                for col in choices {
                    if ui.selectable_label(col == current, col.header()).clicked() && col != current {
                        *changed = Some(col);
                    }
                }
            });
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open flight delay data")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        // Failures are already logged and shown in the status bar.
        if state.load(&path).is_ok() {
            state.active_tab = 0;
        }
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export dashboard summary")
        .add_filter("JSON", &["json"])
        .set_file_name("dashboard.json")
        .save_file();

    if let Some(path) = file {
        match state.export(&path) {
            Ok(()) => state.status_message = None,
            Err(e) => {
                log::error!("Export failed: {e}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
