use std::collections::BTreeSet;

use super::model::{TrialRecord, TrialTable};

// ---------------------------------------------------------------------------
// Filter predicate: which values are selected per dimension
// ---------------------------------------------------------------------------

/// Inclusive bounds on `start_year`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub low: i32,
    pub high: i32,
}

impl YearRange {
    pub fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    /// A range every year falls into.
    pub fn unbounded() -> Self {
        Self {
            low: i32::MIN,
            high: i32::MAX,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.low <= year && year <= self.high
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// The user's current selection.
///
/// An empty set means "no constraint" for that column, never "match nothing".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub phases: BTreeSet<String>,
    pub conditions: BTreeSet<String>,
    pub sponsors: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub year_range: YearRange,
}

impl FilterSelection {
    /// Whether a single trial passes every active predicate.
    ///
    /// * A categorical value passes when the set is empty or contains it;
    ///   an absent value never matches a non-empty set.
    /// * An absent `start_year` always passes the year filter, so
    ///   right-censored trials stay visible.
    pub fn matches(&self, record: &TrialRecord) -> bool {
        allows(&self.phases, record.phase.as_deref())
            && allows(&self.conditions, record.condition_area.as_deref())
            && allows(&self.sponsors, record.sponsor_type.as_deref())
            && allows(&self.statuses, record.status_group.as_deref())
            && record
                .start_year
                .map_or(true, |year| self.year_range.contains(year))
    }
}

fn allows(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.contains(v))
}

/// Return indices of trials that pass the selection, in table order.
pub fn filtered_indices(table: &TrialTable, selection: &FilterSelection) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// The filtered subset as a table with the same columns and row order.
pub fn filter(table: &TrialTable, selection: &FilterSelection) -> TrialTable {
    table.select(&filtered_indices(table, selection))
}

// ---------------------------------------------------------------------------
// Picker options derived from the loaded table
// ---------------------------------------------------------------------------

/// Phases pre-selected when the dashboard opens, if present in the data.
pub const DEFAULT_PHASES: [&str; 3] = ["Phase 2", "Phase 3", "Phase 2/3"];

/// Year bounds used when no trial has a known start year.
pub const FALLBACK_YEAR_BOUNDS: (i32, i32) = (2000, 2026);

/// Sorted distinct values offered by each picker.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    pub phases: BTreeSet<String>,
    pub conditions: BTreeSet<String>,
    pub sponsors: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    /// Min / max of the known start years.
    pub year_bounds: (i32, i32),
}

impl FilterOptions {
    /// Collect the non-absent values of each filter column.
    pub fn from_table(table: &TrialTable) -> Self {
        let mut opts = Self::default();
        let mut years: Option<(i32, i32)> = None;

        for rec in &table.records {
            insert_some(&mut opts.phases, &rec.phase);
            insert_some(&mut opts.conditions, &rec.condition_area);
            insert_some(&mut opts.sponsors, &rec.sponsor_type);
            insert_some(&mut opts.statuses, &rec.status_group);
            if let Some(y) = rec.start_year {
                years = Some(match years {
                    Some((lo, hi)) => (lo.min(y), hi.max(y)),
                    None => (y, y),
                });
            }
        }

        opts.year_bounds = years.unwrap_or(FALLBACK_YEAR_BOUNDS);
        opts
    }

    /// The selection the dashboard opens with: the mid-to-late phases when
    /// available, every other option, and the full year span.
    pub fn default_selection(&self) -> FilterSelection {
        let preferred: BTreeSet<String> = DEFAULT_PHASES
            .iter()
            .filter(|p| self.phases.contains(**p))
            .map(|p| p.to_string())
            .collect();

        FilterSelection {
            phases: if preferred.is_empty() {
                self.phases.clone()
            } else {
                preferred
            },
            conditions: self.conditions.clone(),
            sponsors: self.sponsors.clone(),
            statuses: self.statuses.clone(),
            year_range: YearRange::new(self.year_bounds.0, self.year_bounds.1),
        }
    }
}

fn insert_some(set: &mut BTreeSet<String>, value: &Option<String>) {
    if let Some(v) = value {
        set.insert(v.clone());
    }
}
