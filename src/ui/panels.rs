use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export::FILTERED_EXPORT_NAME;
use crate::state::{AppState, Dimension};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for dim in Dimension::ALL {
                picker(ui, state, dim);
            }
            ui.separator();
            year_range(ui, state);
            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// Collapsible multi-value picker for one categorical column.
fn picker(ui: &mut Ui, state: &mut AppState, dim: Dimension) {
    // Clone what we need so we can mutate state inside the loop.
    let all_values = dim.options(&state.options).clone();
    let selected = dim.selected(&state.selection).clone();

    let header_text = if selected.is_empty() {
        format!("{}  (any)", dim.label())
    } else {
        format!("{}  ({}/{})", dim.label(), selected.len(), all_values.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(dim.label())
        .default_open(dim == Dimension::Phase)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(dim);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(dim);
                }
            });
            if selected.is_empty() {
                ui.label(RichText::new("Nothing selected: no constraint").weak().small());
            }

            for val in &all_values {
                let mut text = RichText::new(val);
                if dim == Dimension::Status {
                    text = text.color(state.status_colors.color_for(Some(val.as_str())));
                }
                let mut checked = selected.contains(val);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle_filter_value(dim, val);
                }
            }
        });
}

/// Bounded start-year range picker.
fn year_range(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Start year (directional for recent years)");
    let (min, max) = state.options.year_bounds;
    let mut low = state.selection.year_range.low;
    let mut high = state.selection.year_range.high;

    let low_changed = ui
        .add(egui::Slider::new(&mut low, min..=max).text("from"))
        .changed();
    let high_changed = ui
        .add(egui::Slider::new(&mut high, min..=max).text("to"))
        .changed();

    if low_changed || high_changed {
        // Dragging one handle past the other moves both.
        if low_changed && low > high {
            high = low;
        }
        state.set_year_range(low, high);
    }
    ui.label(
        RichText::new("Trials without a start date are always included.")
            .weak()
            .small(),
    );
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            let loaded = state.table.is_some();
            if ui
                .add_enabled(loaded, egui::Button::new("Export filtered dataset…"))
                .clicked()
            {
                export_filtered_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(loaded, egui::Button::new("Reset filters"))
                .clicked()
            {
                state.reset_filters();
                ui.close_menu();
            }
            if ui.button("Reload reports").clicked() {
                state.reload_requested = true;
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} trials loaded, {} visible",
                table.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn save_dialog(title: &str, file_name: &str, ext: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .set_file_name(file_name)
        .add_filter(ext.to_uppercase(), &[ext])
        .save_file()
}

/// Ask for a destination and write the currently filtered trials there.
pub fn export_filtered_dialog(state: &mut AppState) {
    let Some(path) = save_dialog("Download filtered dataset", FILTERED_EXPORT_NAME, "csv") else {
        return;
    };
    match state.save_filtered_csv(&path) {
        Ok(_) => state.status_message = None,
        Err(e) => {
            log::error!("Failed to export filtered dataset: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}

/// Ask for a destination and write `bytes` there unmodified.
pub fn save_bytes_dialog(state: &mut AppState, file_name: &str, bytes: &[u8]) {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv")
        .to_string();
    let Some(path) = save_dialog(&format!("Download {file_name}"), file_name, &ext) else {
        return;
    };
    match std::fs::write(&path, bytes) {
        Ok(()) => {
            log::info!("Saved {file_name} to {}", path.display());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to save {file_name}: {e}");
            state.status_message = Some(format!("Error saving {file_name}: {e}"));
        }
    }
}
