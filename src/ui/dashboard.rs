use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::kpi::KpiSet;
use crate::data::model::COL_STATUS_GROUP;
use crate::reports::{FigureArtifact, FigureContent, FigureKind, ReportTable};
use crate::state::AppState;
use crate::ui::panels::{export_filtered_dialog, save_bytes_dialog};

const ROW_HEIGHT: f32 = 18.0;
const TABLE_HEIGHT: f32 = 320.0;

const LIMITATIONS: &str = "Limitations: Enrollment and discontinuation reasons are not uniformly \
reported in public registries. Recent trials may be right-censored (ongoing), so duration and \
discontinuation trends should be interpreted directionally.";

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the dashboard body in the central panel.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    if let Some(err) = &state.fatal_error {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(RichText::new(err).color(Color32::RED).heading());
        });
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            intro(ui);
            kpi_row(ui, &state.kpis);

            ui.separator();
            ui.heading("Key Visual Insights");
            for figure in state.reports.figures.clone() {
                figure_section(ui, state, &figure);
            }

            ui.separator();
            ui.heading("Reporting Tables & Downloads");
            report_section(ui, state);

            ui.separator();
            filtered_section(ui, state);

            ui.separator();
            ui.label(RichText::new(LIMITATIONS).weak().small());
        });
}

fn intro(ui: &mut Ui) {
    ui.heading(RichText::new("TrialPulse").size(28.0).strong());
    ui.label(RichText::new("Clinical Trial Operations & Risk Analytics (Phase II–III)").size(18.0));
    ui.add_space(4.0);
    ui.label(
        "Analytics-driven insight into clinical trial timelines, enrollment risk and \
         discontinuation patterns, using public ClinicalTrials.gov data.",
    );
    ui.label(
        "These KPIs summarize portfolio-level operational risk and cycle-time expectations \
         for Phase II–III development programs.",
    );
    ui.add_space(8.0);
}

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, kpis: &KpiSet) {
    ui.strong("Portfolio KPIs");
    let cards = [
        ("Trials", kpis.trials_label()),
        ("Median duration (days)", kpis.median_duration_label()),
        ("Discontinuation rate", kpis.discontinuation_label()),
        ("Median enrollment", kpis.median_enrollment_label()),
        ("Completed %", kpis.completed_label()),
    ];
    ui.columns(cards.len(), |cols: &mut [Ui]| {
        for (col, (label, value)) in cols.iter_mut().zip(cards) {
            egui::Frame::group(col.style()).show(col, |ui: &mut Ui| {
                ui.set_min_width(ui.available_width());
                ui.label(RichText::new(label).weak());
                ui.label(RichText::new(value).size(24.0).strong());
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Figures
// ---------------------------------------------------------------------------

fn figure_section(ui: &mut Ui, state: &mut AppState, figure: &FigureArtifact) {
    match &figure.content {
        FigureContent::Present { kind, bytes } => {
            ui.label(RichText::new(figure.title).strong().size(16.0));
            match kind {
                FigureKind::Image => {
                    let uri = format!("bytes://{}", figure.file_name());
                    ui.add(
                        egui::Image::from_bytes(uri, bytes.clone())
                            .max_width(ui.available_width())
                            .max_height(540.0),
                    );
                }
                FigureKind::Html => {
                    ui.horizontal(|ui: &mut Ui| {
                        ui.label(format!(
                            "Interactive figure ({:.1} KB)",
                            bytes.len() as f64 / 1024.0
                        ));
                        if let Some(path) = &figure.path {
                            if ui.button("Open in browser").clicked() {
                                let url = format!("file://{}", path.display());
                                ui.ctx().open_url(egui::OpenUrl::new_tab(url));
                            }
                        }
                        if ui.button("Save…").clicked() {
                            save_bytes_dialog(state, &figure.file_name(), bytes);
                        }
                    });
                }
            }
            ui.add_space(8.0);
        }
        FigureContent::Missing { expected } => {
            ui.label(
                RichText::new(format!(
                    "Figure not found: {} (expected at {})",
                    figure.file_name(),
                    expected.display()
                ))
                .color(Color32::LIGHT_BLUE),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Report tables
// ---------------------------------------------------------------------------

fn report_section(ui: &mut Ui, state: &mut AppState) {
    for msg in &state.reports.warnings {
        ui.label(RichText::new(msg).color(Color32::YELLOW));
    }

    for table in state.reports.tables.clone() {
        ui.label(RichText::new(&table.name).strong());
        ui.push_id(&table.name, |ui: &mut Ui| report_table(ui, &table));
        if ui.button(format!("Download {}", table.name)).clicked() {
            save_bytes_dialog(state, &table.name, &table.raw);
        }
        ui.add_space(8.0);
    }
}

fn report_table(ui: &mut Ui, table: &ReportTable) {
    let rows = table.preview();
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(true)
            .max_scroll_height(TABLE_HEIGHT)
            .columns(Column::auto().at_least(60.0), table.headers.len().max(1))
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for h in &table.headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(h);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for i in 0..table.headers.len() {
                        row.col(|ui: &mut Ui| {
                            ui.label(cells.get(i).map(String::as_str).unwrap_or(""));
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// Filtered dataset
// ---------------------------------------------------------------------------

fn filtered_section(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Download filtered dataset");
    if ui.button("Download filtered dataset (CSV)").clicked() {
        export_filtered_dialog(state);
    }

    let Some(table) = state.table.clone() else {
        return;
    };
    let status_idx = table.columns.iter().position(|c| c == COL_STATUS_GROUP);

    egui::CollapsingHeader::new(format!(
        "Preview filtered trials ({})",
        state.visible_indices.len()
    ))
    .default_open(false)
    .show(ui, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .vscroll(true)
                .max_scroll_height(TABLE_HEIGHT)
                .columns(Column::auto().at_least(60.0), table.columns.len().max(1))
                .header(ROW_HEIGHT + 2.0, |mut header| {
                    for c in &table.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(c);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, state.visible_indices.len(), |mut row| {
                        let rec = &table.records[state.visible_indices[row.index()]];
                        for (i, cell) in rec.cells.iter().enumerate() {
                            row.col(|ui: &mut Ui| {
                                let text = if cell.is_null() {
                                    RichText::new("—").weak()
                                } else {
                                    RichText::new(cell.to_string())
                                };
                                let text = if Some(i) == status_idx {
                                    text.color(
                                        state
                                            .status_colors
                                            .color_for(rec.status_group.as_deref()),
                                    )
                                } else {
                                    text
                                };
                                ui.label(text);
                            });
                        }
                    });
                });
        });
    });
}
