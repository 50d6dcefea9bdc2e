use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// Figure catalogue
// ---------------------------------------------------------------------------

/// The pre-rendered key visuals, in display order: file stem and title.
pub const FIGURES: [(&str, &str); 9] = [
    ("fig01_duration_by_phase", "Trial Duration by Phase"),
    (
        "fig02_duration_by_sponsor_phase",
        "Trial Duration by Sponsor Type and Phase",
    ),
    (
        "fig04_outcome_mix_by_phase",
        "Outcome Mix by Phase (Completed vs Discontinued)",
    ),
    (
        "fig05_discontinuation_by_enrollment_bucket",
        "Discontinuation Rate by Enrollment Bucket",
    ),
    (
        "fig06_top_discontinuation_themes",
        "Top Reported Discontinuation Themes",
    ),
    ("fig07_top_countries", "Top Countries by Trial Count"),
    (
        "fig08_duration_by_country_count",
        "Duration vs Number of Countries (Operational Complexity Proxy)",
    ),
    ("fig09a_volume_by_year", "Trial Volume by Start Year"),
    (
        "fig09b_discontinuation_rate_by_year",
        "Discontinuation Rate by Start Year (Known Outcomes Only)",
    ),
];

/// Extensions tried for each figure, most preferred first.
const FIGURE_EXTENSIONS: [&str; 2] = ["png", "html"];

/// How a figure artifact can be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureKind {
    /// Static image shown inline.
    Image,
    /// Interactive HTML page, offered for saving / opening in a browser.
    Html,
}

#[derive(Debug, Clone)]
pub enum FigureContent {
    Present { kind: FigureKind, bytes: Arc<[u8]> },
    /// Not on disk; `expected` is the first location looked at.
    Missing { expected: PathBuf },
}

/// One entry of the key-visuals section.
#[derive(Debug, Clone)]
pub struct FigureArtifact {
    pub stem: &'static str,
    pub title: &'static str,
    pub path: Option<PathBuf>,
    pub content: FigureContent,
}

impl FigureArtifact {
    pub fn file_name(&self) -> String {
        match &self.path {
            Some(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.stem.to_string()),
            None => format!("{}.{}", self.stem, FIGURE_EXTENSIONS[0]),
        }
    }
}

/// Look up a single figure in `dir`. A missing or unreadable file is not an
/// error; it is reported through [`FigureContent::Missing`].
pub fn load_figure(dir: &Path, stem: &'static str, title: &'static str) -> FigureArtifact {
    for ext in FIGURE_EXTENSIONS {
        let path = dir.join(format!("{stem}.{ext}"));
        if !path.is_file() {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                let kind = if ext == "html" {
                    FigureKind::Html
                } else {
                    FigureKind::Image
                };
                return FigureArtifact {
                    stem,
                    title,
                    path: Some(path),
                    content: FigureContent::Present {
                        kind,
                        bytes: bytes.into(),
                    },
                };
            }
            Err(e) => log::warn!("Failed to read figure {}: {e}", path.display()),
        }
    }

    let expected = dir.join(format!("{stem}.{}", FIGURE_EXTENSIONS[0]));
    log::info!("Figure not found: {stem} (expected at {})", expected.display());
    FigureArtifact {
        stem,
        title,
        path: None,
        content: FigureContent::Missing { expected },
    }
}

/// Every catalogued figure, in display order.
pub fn load_figures(dir: &Path) -> Vec<FigureArtifact> {
    FIGURES
        .iter()
        .map(|&(stem, title)| load_figure(dir, stem, title))
        .collect()
}

// ---------------------------------------------------------------------------
// Report tables
// ---------------------------------------------------------------------------

/// Number of rows shown per report table in the dashboard.
pub const PREVIEW_ROWS: usize = 50;

/// A delimited-text report, kept as opaque text cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub name: String,
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// The file exactly as read, offered for download.
    pub raw: Arc<[u8]>,
}

impl ReportTable {
    /// The first rows shown in the dashboard.
    pub fn preview(&self) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(PREVIEW_ROWS)]
    }
}

/// `*.csv` files directly inside `dir`, sorted by path. A missing directory
/// yields an empty list.
pub fn list_report_tables(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut tables: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "csv"))
        .collect();
    tables.sort();
    Ok(tables)
}

/// Read a report table as text. Ragged rows are accepted as-is.
pub fn read_report_table(path: &Path) -> Result<ReportTable> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw.as_slice());
    let headers = reader
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .enumerate()
        .map(|(i, rec)| {
            rec.map(|r| r.iter().map(str::to_string).collect())
                .with_context(|| format!("{} row {i}", path.display()))
        })
        .collect::<Result<_>>()?;

    Ok(ReportTable {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        headers,
        rows,
        raw: raw.into(),
    })
}

// ---------------------------------------------------------------------------
// Reporting section as a whole
// ---------------------------------------------------------------------------

/// Everything the reporting section needs, read once at start-up.
#[derive(Debug, Clone, Default)]
pub struct ReportCatalog {
    pub figures: Vec<FigureArtifact>,
    pub tables: Vec<ReportTable>,
    /// Non-blocking warnings shown above the report tables.
    pub warnings: Vec<String>,
}

impl ReportCatalog {
    /// Gather figures and tables. Nothing here is fatal: problems become
    /// warnings and the remaining artifacts are still returned. Missing
    /// figures are reported through [`FigureContent::Missing`].
    pub fn collect(figure_dir: &Path, table_dir: &Path) -> Self {
        let figures = load_figures(figure_dir);
        let mut warnings = Vec::new();

        let paths = match list_report_tables(table_dir) {
            Ok(paths) => {
                if paths.is_empty() {
                    warnings.push(format!("No CSV tables found in {}.", table_dir.display()));
                }
                paths
            }
            Err(e) => {
                log::warn!("{e:#}");
                warnings.push(format!("{e:#}"));
                Vec::new()
            }
        };

        let mut tables = Vec::with_capacity(paths.len());
        for path in paths {
            match read_report_table(&path) {
                Ok(table) => tables.push(table),
                Err(e) => {
                    log::error!("Failed to read report table: {e:#}");
                    warnings.push(format!("Could not read {}: {e:#}", path.display()));
                }
            }
        }

        log::info!(
            "Found {}/{} figures and {} report tables",
            figures
                .iter()
                .filter(|f| matches!(f.content, FigureContent::Present { .. }))
                .count(),
            figures.len(),
            tables.len()
        );

        Self {
            figures,
            tables,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figure_prefers_png_and_falls_back_to_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fig01_duration_by_phase.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("fig07_top_countries.png"), [0x89, b'P', b'N', b'G']).unwrap();
        std::fs::write(dir.path().join("fig07_top_countries.html"), "<html></html>").unwrap();

        let figures = load_figures(dir.path());
        assert_eq!(figures.len(), FIGURES.len());

        match &figures[0].content {
            FigureContent::Present { kind, bytes } => {
                assert_eq!(*kind, FigureKind::Html);
                assert_eq!(&bytes[..], b"<html></html>");
            }
            other => panic!("expected fig01 present, got {other:?}"),
        }
        assert_eq!(figures[0].file_name(), "fig01_duration_by_phase.html");

        let countries = figures.iter().find(|f| f.stem == "fig07_top_countries").unwrap();
        assert!(matches!(
            countries.content,
            FigureContent::Present {
                kind: FigureKind::Image,
                ..
            }
        ));

        assert!(matches!(figures[1].content, FigureContent::Missing { .. }));
    }

    #[test]
    fn lists_only_csv_tables_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b_sponsor.csv"), "a\n1\n").unwrap();
        std::fs::write(dir.path().join("a_phase.csv"), "a\n1\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let names: Vec<String> = list_report_tables(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_phase.csv", "b_sponsor.csv"]);
    }

    #[test]
    fn missing_table_dir_is_empty_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_report_tables(&dir.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn report_table_download_is_the_file_as_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duration_by_phase.csv");
        let text = "phase,median_days,note\nPhase 2,812.5,\"long, tail\"\nPhase 3,1020,\n";
        std::fs::write(&path, text).unwrap();

        let table = read_report_table(&path).unwrap();
        assert_eq!(table.name, "duration_by_phase.csv");
        assert_eq!(table.headers, vec!["phase", "median_days", "note"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(&table.raw[..], text.as_bytes());
    }

    #[test]
    fn ragged_report_table_loads_and_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        let text = "a,b,c\n1,2\n3,4,5\n";
        std::fs::write(&path, text).unwrap();

        let table = read_report_table(&path).unwrap();
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["3", "4", "5"]]);
        assert_eq!(&table.raw[..], text.as_bytes());
    }

    #[test]
    fn preview_is_capped() {
        let table = ReportTable {
            name: "t.csv".into(),
            path: PathBuf::from("t.csv"),
            headers: vec!["n".into()],
            rows: (0..120).map(|i| vec![i.to_string()]).collect(),
            raw: Arc::from(&b""[..]),
        };
        assert_eq!(table.preview().len(), PREVIEW_ROWS);
        assert_eq!(table.rows.len(), 120);
    }

    #[test]
    fn catalog_warns_once_about_missing_tables() {
        let root = tempfile::tempdir().unwrap();
        let catalog = ReportCatalog::collect(
            &root.path().join("reports/figures"),
            &root.path().join("reports/tables"),
        );

        assert_eq!(catalog.figures.len(), FIGURES.len());
        assert!(catalog
            .figures
            .iter()
            .all(|f| matches!(f.content, FigureContent::Missing { .. })));
        assert!(catalog.tables.is_empty());
        assert_eq!(catalog.warnings.len(), 1);
        assert!(catalog.warnings[0].starts_with("No CSV tables found"));
    }

    #[test]
    fn unreadable_table_is_a_warning_and_the_rest_still_load() {
        let root = tempfile::tempdir().unwrap();
        let tables = root.path().join("tables");
        std::fs::create_dir(&tables).unwrap();
        std::fs::write(tables.join("a_ok.csv"), "x,y\n1,2\n").unwrap();
        std::fs::write(tables.join("b_bad.csv"), b"x\n\xff\xfe\n").unwrap();

        let catalog = ReportCatalog::collect(&root.path().join("figures"), &tables);
        assert_eq!(catalog.tables.len(), 1);
        assert_eq!(catalog.tables[0].name, "a_ok.csv");
        assert_eq!(catalog.warnings.len(), 1);
        assert!(catalog.warnings[0].starts_with("Could not read"));
    }
}
