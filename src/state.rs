use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::color::StatusColors;
use crate::config::DashboardConfig;
use crate::data::DashboardError;
use crate::data::cache::SnapshotCache;
use crate::data::export::to_csv_bytes;
use crate::data::filter::{FilterOptions, FilterSelection, YearRange, filter, filtered_indices};
use crate::data::kpi::{KpiSet, aggregate};
use crate::data::model::TrialTable;
use crate::reports::ReportCatalog;

// ---------------------------------------------------------------------------
// Filter dimensions exposed as pickers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Phase,
    Condition,
    Sponsor,
    Status,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Phase,
        Dimension::Condition,
        Dimension::Sponsor,
        Dimension::Status,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Phase => "Phase",
            Dimension::Condition => "Condition area",
            Dimension::Sponsor => "Sponsor type",
            Dimension::Status => "Status group",
        }
    }

    pub fn options(self, opts: &FilterOptions) -> &BTreeSet<String> {
        match self {
            Dimension::Phase => &opts.phases,
            Dimension::Condition => &opts.conditions,
            Dimension::Sponsor => &opts.sponsors,
            Dimension::Status => &opts.statuses,
        }
    }

    pub fn selected(self, sel: &FilterSelection) -> &BTreeSet<String> {
        match self {
            Dimension::Phase => &sel.phases,
            Dimension::Condition => &sel.conditions,
            Dimension::Sponsor => &sel.sponsors,
            Dimension::Status => &sel.statuses,
        }
    }

    fn selected_mut(self, sel: &mut FilterSelection) -> &mut BTreeSet<String> {
        match self {
            Dimension::Phase => &mut sel.phases,
            Dimension::Condition => &mut sel.conditions,
            Dimension::Sponsor => &mut sel.sponsors,
            Dimension::Status => &mut sel.statuses,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded snapshot (None when loading failed).
    pub table: Option<Arc<TrialTable>>,

    /// Fatal load error; the dashboard shows only this when set.
    pub fatal_error: Option<String>,

    /// Values offered by each picker.
    pub options: FilterOptions,

    /// Current picker selections.
    pub selection: FilterSelection,

    /// Indices of trials passing the current selection (cached).
    pub visible_indices: Vec<usize>,

    /// KPI row for the visible trials (cached).
    pub kpis: KpiSet,

    /// Figures, report tables and their warnings.
    pub reports: ReportCatalog,

    pub status_colors: StatusColors,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,

    /// Set by the UI; the app re-opens the dashboard on the next frame.
    pub reload_requested: bool,
}

impl AppState {
    /// Load the snapshot through the cache and gather the report artifacts.
    pub fn open(config: DashboardConfig, cache: &SnapshotCache) -> Self {
        let mut state = Self::empty(config);
        if cache.is_loaded() {
            log::debug!("Reusing cached snapshot");
        }
        match cache.get() {
            Ok(table) => state.set_table(table),
            Err(e) => {
                log::error!("Failed to load dataset: {e:#}");
                state.fatal_error = Some(match e.downcast_ref::<DashboardError>() {
                    Some(missing @ DashboardError::MissingDataset { .. }) => missing.to_string(),
                    _ => format!("{e:#}"),
                });
                return state;
            }
        }
        state.reports =
            ReportCatalog::collect(&state.config.figure_dir, &state.config.table_dir);
        state
    }

    fn empty(config: DashboardConfig) -> Self {
        Self {
            config,
            table: None,
            fatal_error: None,
            options: FilterOptions::default(),
            selection: FilterSelection::default(),
            visible_indices: Vec::new(),
            kpis: KpiSet::default(),
            reports: ReportCatalog::default(),
            status_colors: StatusColors::default(),
            status_message: None,
            reload_requested: false,
        }
    }

    /// Ingest the loaded snapshot and initialise filters.
    pub fn set_table(&mut self, table: Arc<TrialTable>) {
        if table.is_empty() {
            log::warn!("The snapshot contains no trials");
        }
        self.options = FilterOptions::from_table(&table);
        self.selection = self.options.default_selection();
        self.status_colors = StatusColors::new(&self.options.statuses);
        self.table = Some(table);
        self.fatal_error = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the KPI row after a selection change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        self.visible_indices = filtered_indices(table, &self.selection);
        self.kpis = aggregate(self.visible_indices.iter().map(|&i| &table.records[i]));
        log::debug!(
            "Filter matched {}/{} trials",
            self.visible_indices.len(),
            table.len()
        );
    }

    /// Toggle a single value in a picker.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let selected = dim.selected_mut(&mut self.selection);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Select every option of a picker.
    pub fn select_all(&mut self, dim: Dimension) {
        let all = dim.options(&self.options).clone();
        *dim.selected_mut(&mut self.selection) = all;
        self.refilter();
    }

    /// Clear a picker. An empty picker places no constraint on its column.
    pub fn select_none(&mut self, dim: Dimension) {
        dim.selected_mut(&mut self.selection).clear();
        self.refilter();
    }

    /// Set the start-year bounds, clamped to the data and kept ordered.
    pub fn set_year_range(&mut self, low: i32, high: i32) {
        let (min, max) = self.options.year_bounds;
        let low = low.clamp(min, max);
        let high = high.clamp(min, max).max(low);
        self.selection.year_range = YearRange::new(low, high);
        self.refilter();
    }

    /// Back to the selection the dashboard opened with.
    pub fn reset_filters(&mut self) {
        self.selection = self.options.default_selection();
        self.refilter();
    }

    /// Write the trials matching the current selection as CSV to `path`.
    pub fn save_filtered_csv(&self, path: &Path) -> Result<usize> {
        let table = self.table.as_ref().context("no dataset loaded")?;
        let subset = filter(table, &self.selection);
        let bytes = to_csv_bytes(&subset.columns, &subset.records)?;
        std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported {} trials to {}", subset.len(), path.display());
        Ok(subset.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TrialRecord;

    fn trial(phase: &str, status: &str, year: Option<i32>) -> TrialRecord {
        TrialRecord {
            phase: Some(phase.to_string()),
            status_group: Some(status.to_string()),
            start_year: year,
            ..Default::default()
        }
    }

    fn state() -> AppState {
        let table = TrialTable {
            columns: Vec::new(),
            records: vec![
                trial("Phase 1", "Completed", Some(2015)),
                trial("Phase 2", "Completed", Some(2019)),
                trial("Phase 3", "Terminated", Some(2021)),
                trial("Phase 2", "Withdrawn", None),
            ],
        };
        let mut state = AppState::empty(DashboardConfig::with_root("/tmp/trialpulse"));
        state.set_table(Arc::new(table));
        state
    }

    #[test]
    fn opens_with_mid_phase_default() {
        let state = state();
        assert_eq!(state.visible_indices, vec![1, 2, 3]);
        assert_eq!(state.kpis.trial_count, 3);
        assert!((state.kpis.discontinuation_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn select_none_lifts_the_constraint() {
        let mut state = state();
        state.select_none(Dimension::Phase);
        assert_eq!(state.visible_indices, vec![0, 1, 2, 3]);
        state.select_all(Dimension::Phase);
        assert_eq!(state.visible_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn toggling_values_refilters() {
        let mut state = state();
        state.toggle_filter_value(Dimension::Phase, "Phase 3");
        assert_eq!(state.visible_indices, vec![1, 3]);
        state.toggle_filter_value(Dimension::Phase, "Phase 3");
        assert_eq!(state.visible_indices, vec![1, 2, 3]);
    }

    #[test]
    fn year_range_is_clamped_and_keeps_unknown_years() {
        let mut state = state();
        state.set_year_range(2020, 1990);
        assert_eq!(state.selection.year_range, YearRange::new(2020, 2020));
        assert_eq!(state.visible_indices, vec![3]);

        state.reset_filters();
        assert_eq!(state.selection.year_range, YearRange::new(2015, 2021));
    }

    #[test]
    fn missing_dataset_is_fatal_for_the_session() {
        let root = tempfile::tempdir().unwrap();
        let config = DashboardConfig::with_root(root.path());
        let cache = SnapshotCache::new(&config.data_path);
        let state = AppState::open(config.clone(), &cache);

        assert!(state.table.is_none());
        let msg = state.fatal_error.unwrap();
        assert!(msg.contains(&config.data_path.display().to_string()));
    }

    #[test]
    fn saves_the_visible_trials() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig::with_root(dir.path());
        std::fs::create_dir_all(config.data_path.parent().unwrap()).unwrap();
        let csv_path = config.data_path.with_extension("csv");
        std::fs::write(
            &csv_path,
            "nct_id,phase,sponsor_type,condition_area,status_group,start_year,duration_start_to_completion_days,enrollment_count\n\
             NCT1,Phase 1,Industry,Oncology,Completed,2015,100,10\n\
             NCT2,Phase 2,Industry,Oncology,Completed,2019,200,20\n",
        )
        .unwrap();

        let cache = SnapshotCache::new(&csv_path);
        let state = AppState::open(config, &cache);
        assert!(state.fatal_error.is_none());

        let out = dir.path().join("filtered.csv");
        assert_eq!(state.save_filtered_csv(&out).unwrap(), 1);
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().starts_with("NCT2,Phase 2,"));
    }
}
