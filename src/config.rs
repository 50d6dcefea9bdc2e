use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming the project root.
pub const ROOT_ENV: &str = "TRIALPULSE_ROOT";

/// Optional overrides file looked up inside the project root.
pub const CONFIG_FILE: &str = "trialpulse.json";

// ---------------------------------------------------------------------------
// Resolved locations of the dashboard inputs
// ---------------------------------------------------------------------------

/// Where the dashboard reads its snapshot, figures and report tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub root: PathBuf,
    pub data_path: PathBuf,
    pub figure_dir: PathBuf,
    pub table_dir: PathBuf,
}

/// Shape of `trialpulse.json`. Relative paths resolve against the root.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    data_path: Option<PathBuf>,
    figure_dir: Option<PathBuf>,
    table_dir: Option<PathBuf>,
}

impl DashboardConfig {
    /// The standard project layout under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            data_path: root
                .join("data")
                .join("processed")
                .join("trialpulse_analysis.parquet"),
            figure_dir: root.join("reports").join("figures"),
            table_dir: root.join("reports").join("tables"),
            root,
        }
    }

    /// Resolve the root from `TRIALPULSE_ROOT` (or the current directory) and
    /// apply `trialpulse.json` when present.
    pub fn from_env() -> Result<Self> {
        let root = match std::env::var_os(ROOT_ENV) {
            Some(root) => PathBuf::from(root),
            None => std::env::current_dir().context("resolving current directory")?,
        };
        Self::load(&root)
    }

    /// Standard layout under `root`, with overrides from its config file.
    pub fn load(root: &Path) -> Result<Self> {
        let mut config = Self::with_root(root);
        let file = root.join(CONFIG_FILE);
        if !file.exists() {
            return Ok(config);
        }

        let text = std::fs::read_to_string(&file)
            .with_context(|| format!("reading {}", file.display()))?;
        let overrides: ConfigFile = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", file.display()))?;
        log::debug!("Applying overrides from {}", file.display());

        if let Some(p) = overrides.data_path {
            config.data_path = root.join(p);
        }
        if let Some(p) = overrides.figure_dir {
            config.figure_dir = root.join(p);
        }
        if let Some(p) = overrides.table_dir {
            config.table_dir = root.join(p);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout() {
        let config = DashboardConfig::with_root("/srv/trialpulse");
        assert_eq!(
            config.data_path,
            PathBuf::from("/srv/trialpulse/data/processed/trialpulse_analysis.parquet")
        );
        assert_eq!(config.figure_dir, PathBuf::from("/srv/trialpulse/reports/figures"));
        assert_eq!(config.table_dir, PathBuf::from("/srv/trialpulse/reports/tables"));
    }

    #[test]
    fn config_file_overrides_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "data_path": "snapshots/latest.parquet", "table_dir": "/tmp/tables" }"#,
        )
        .unwrap();

        let config = DashboardConfig::load(dir.path()).unwrap();
        assert_eq!(config.data_path, dir.path().join("snapshots/latest.parquet"));
        assert_eq!(config.table_dir, PathBuf::from("/tmp/tables"));
        assert_eq!(config.figure_dir, dir.path().join("reports").join("figures"));
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "figure_directory": "x" }"#).unwrap();
        let err = DashboardConfig::load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(CONFIG_FILE));
    }
}
