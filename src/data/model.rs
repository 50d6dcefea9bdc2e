use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell of the snapshot
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the common Pandas dtypes found in the
/// analysis snapshot. Kept for every column so exports reproduce the source.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Dates and timestamps kept as ISO-8601 text.
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the cell as a number. `NaN` counts as absent; infinities
    /// are kept.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar year. Nullable integer columns come
    /// out of Pandas as float64, so whole floats are accepted.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            CellValue::Integer(i) => i32::try_from(*i).ok(),
            CellValue::Float(v) if v.is_finite() && v.fract() == 0.0 => {
                let y = *v as i64;
                i32::try_from(y).ok()
            }
            _ => None,
        }
    }

    /// Interpret the cell as a category label. Empty strings and `NaN` count
    /// as absent; numeric or boolean categories are stringified.
    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::String(s) | CellValue::Date(s) if !s.is_empty() => Some(s.clone()),
            CellValue::String(_) | CellValue::Date(_) | CellValue::Null => None,
            CellValue::Float(v) if v.is_nan() => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Column names of the typed trial fields
// ---------------------------------------------------------------------------

pub const COL_PHASE: &str = "phase";
pub const COL_SPONSOR_TYPE: &str = "sponsor_type";
pub const COL_CONDITION_AREA: &str = "condition_area";
pub const COL_STATUS_GROUP: &str = "status_group";
pub const COL_START_YEAR: &str = "start_year";
pub const COL_DURATION_DAYS: &str = "duration_start_to_completion_days";
pub const COL_ENROLLMENT: &str = "enrollment_count";

/// Columns every snapshot must carry.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    COL_PHASE,
    COL_SPONSOR_TYPE,
    COL_CONDITION_AREA,
    COL_STATUS_GROUP,
    COL_START_YEAR,
    COL_DURATION_DAYS,
    COL_ENROLLMENT,
];

// ---------------------------------------------------------------------------
// TrialRecord – one row of the snapshot
// ---------------------------------------------------------------------------

/// A single clinical trial (one row of the source DataFrame).
///
/// The typed fields are decoded once at load time; `cells` keeps the raw row
/// aligned with [`TrialTable::columns`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrialRecord {
    pub phase: Option<String>,
    pub sponsor_type: Option<String>,
    pub condition_area: Option<String>,
    pub status_group: Option<String>,
    pub start_year: Option<i32>,
    pub duration_start_to_completion_days: Option<f64>,
    pub enrollment_count: Option<f64>,
    pub cells: Vec<CellValue>,
}

// ---------------------------------------------------------------------------
// TrialTable – the complete loaded snapshot
// ---------------------------------------------------------------------------

/// The full parsed snapshot. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrialTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    /// All trials (rows) in source order.
    pub records: Vec<TrialRecord>,
}

/// Positions of the typed columns within a row.
#[derive(Debug, Clone, Copy)]
pub struct ColumnLayout {
    phase: usize,
    sponsor_type: usize,
    condition_area: usize,
    status_group: usize,
    start_year: usize,
    duration: usize,
    enrollment: usize,
}

impl ColumnLayout {
    /// Locate the required columns, or report the first one missing.
    pub fn resolve(columns: &[String]) -> Result<Self, super::DashboardError> {
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| super::DashboardError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            phase: find(COL_PHASE)?,
            sponsor_type: find(COL_SPONSOR_TYPE)?,
            condition_area: find(COL_CONDITION_AREA)?,
            status_group: find(COL_STATUS_GROUP)?,
            start_year: find(COL_START_YEAR)?,
            duration: find(COL_DURATION_DAYS)?,
            enrollment: find(COL_ENROLLMENT)?,
        })
    }

    /// Decode a raw row into a [`TrialRecord`].
    pub fn decode(&self, cells: Vec<CellValue>) -> TrialRecord {
        let label = |i: usize| cells.get(i).and_then(CellValue::as_label);
        let number = |i: usize| cells.get(i).and_then(CellValue::as_f64);
        TrialRecord {
            phase: label(self.phase),
            sponsor_type: label(self.sponsor_type),
            condition_area: label(self.condition_area),
            status_group: label(self.status_group),
            start_year: cells.get(self.start_year).and_then(CellValue::as_year),
            duration_start_to_completion_days: number(self.duration),
            enrollment_count: number(self.enrollment),
            cells,
        }
    }
}

impl TrialTable {
    /// Build a table from raw rows, decoding the typed trial fields.
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<Self, super::DashboardError> {
        let layout = ColumnLayout::resolve(&columns)?;
        let records = rows.into_iter().map(|cells| layout.decode(cells)).collect();
        Ok(Self { columns, records })
    }

    /// A table with the same columns holding the rows at `indices`, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            records: indices
                .iter()
                .filter_map(|&i| self.records.get(i).cloned())
                .collect(),
        }
    }

    /// Number of trials.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
