use eframe::egui;

use crate::config::DashboardConfig;
use crate::data::cache::SnapshotCache;
use crate::state::AppState;
use crate::ui::{dashboard, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct TrialPulseApp {
    pub state: AppState,
    /// Process-lifetime handle on the snapshot.
    cache: SnapshotCache,
}

impl TrialPulseApp {
    pub fn new(config: DashboardConfig) -> Self {
        let cache = SnapshotCache::new(&config.data_path);
        let state = AppState::open(config, &cache);
        Self { state, cache }
    }

    /// Re-open the dashboard: the snapshot comes from the cache, figures and
    /// report tables are read again, the current selection is kept.
    fn reload(&mut self) {
        let config = self.state.config.clone();
        let previous = self
            .state
            .table
            .is_some()
            .then(|| self.state.selection.clone());
        self.state = AppState::open(config, &self.cache);
        if let Some(selection) = previous {
            self.state.selection = selection;
            self.state.refilter();
        }
    }
}

impl eframe::App for TrialPulseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if std::mem::take(&mut self.state.reload_requested) {
            self.reload();
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        if self.state.fatal_error.is_none() {
            egui::SidePanel::left("filter_panel")
                .default_width(240.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.state);
                });
        }

        // ---- Central panel: KPIs, figures, reports ----
        egui::CentralPanel::default().show(ctx, |ui| {
            dashboard::central_panel(ui, &mut self.state);
        });
    }
}
