/// Data layer: core types, loading, filtering, aggregation and export.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → TrialTable   (cached once by `cache`)
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ TrialTable  │  Vec<TrialRecord>, source column order
///   └────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selection predicates → filtered subset
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │   kpi     │   │  export   │  subset → CSV
///   └──────────┘   └──────────┘
/// ```

pub mod cache;
pub mod export;
pub mod filter;
pub mod kpi;
pub mod loader;
pub mod model;

use std::path::PathBuf;

/// Failures the dashboard distinguishes when reading its inputs.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The analysis snapshot is not where the configuration says it is.
    #[error("Processed dataset not found at: {}", path.display())]
    MissingDataset { path: PathBuf },

    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}
