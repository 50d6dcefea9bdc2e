use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use anyhow::Result;

use super::loader::load_file;
use super::model::TrialTable;

/// Load-once handle on the analysis snapshot at a fixed path.
///
/// The first successful [`SnapshotCache::get`] reads the file; later calls
/// share the same table. A failed load is not cached, so the error is
/// reported again on the next call.
#[derive(Debug)]
pub struct SnapshotCache {
    path: PathBuf,
    table: OnceLock<Arc<TrialTable>>,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: OnceLock::new(),
        }
    }

    /// Shared handle on the snapshot, loading it on first access.
    pub fn get(&self) -> Result<Arc<TrialTable>> {
        if let Some(table) = self.table.get() {
            return Ok(Arc::clone(table));
        }
        let loaded = Arc::new(load_file(&self.path)?);
        Ok(Arc::clone(self.table.get_or_init(|| loaded)))
    }

    pub fn is_loaded(&self) -> bool {
        self.table.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = "phase,sponsor_type,condition_area,status_group,start_year,duration_start_to_completion_days,enrollment_count\n\
                            Phase 2,Industry,Oncology,Completed,2019,400,120\n";

    #[test]
    fn loads_once_and_shares_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let cache = SnapshotCache::new(&path);
        assert!(!cache.is_loaded());
        let first = cache.get().unwrap();

        // The file is static for the process; later edits are not observed.
        std::fs::remove_file(&path).unwrap();
        let second = cache.get().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn missing_snapshot_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        let cache = SnapshotCache::new(&path);

        assert!(cache.get().is_err());
        assert!(!cache.is_loaded());

        std::fs::write(&path, SNAPSHOT).unwrap();
        assert_eq!(cache.get().unwrap().len(), 1);
    }
}
