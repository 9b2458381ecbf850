use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::DatasetError;
use crate::loader;
use crate::models::Dataset;

/// What a cached dataset was loaded from. Any change means a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceIdentity {
    pub fn resolve(path: &Path) -> Result<Self, DatasetError> {
        let not_found = |source| DatasetError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        };
        let canonical = fs::canonicalize(path).map_err(not_found)?;
        let metadata = fs::metadata(&canonical).map_err(not_found)?;

        Ok(Self {
            path: canonical,
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

struct CachedDataset {
    identity: SourceIdentity,
    dataset: Rc<Dataset>,
}

/// Memoizes loaded datasets per source file for the life of the owner.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CachedDataset>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, path: &Path) -> Result<Rc<Dataset>, DatasetError> {
        let identity = SourceIdentity::resolve(path)?;

        if let Some(entry) = self.entries.get(&identity.path) {
            if entry.identity == identity {
                debug!(source = %identity.path.display(), "dataset cache hit");
                return Ok(Rc::clone(&entry.dataset));
            }
            warn!(source = %identity.path.display(), "dataset source changed, reloading");
        } else {
            debug!(source = %identity.path.display(), "dataset cache miss");
        }

        // Drop the stale entry first so a failed reload leaves nothing behind.
        self.entries.remove(&identity.path);
        let dataset = Rc::new(loader::load(&identity.path)?);
        self.entries.insert(
            identity.path.clone(),
            CachedDataset {
                identity,
                dataset: Rc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::loader::fixtures::{six_rows, HEADER};

    fn write_source(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("sleep.csv");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn repeated_loads_share_one_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), &six_rows());
        let mut cache = DatasetCache::new();

        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_source_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), &six_rows());
        let mut cache = DatasetCache::new();
        let before = cache.load(&path).unwrap();

        let shorter = [
            HEADER,
            "1,Male,27,Engineer,6.1,6,42,6,Overweight,126/83,77,4200,Insomnia",
        ]
        .join("\n");
        write_source(dir.path(), &shorter);

        let after = cache.load(&path).unwrap();
        assert!(!Rc::ptr_eq(&before, &after));
        assert_eq!(before.len(), 6);
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), &six_rows());
        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();

        assert!(cache.invalidate(&path));
        assert!(cache.is_empty());
        assert!(!cache.invalidate(&path));

        let second = cache.load(&path).unwrap();
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);

        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn failed_load_leaves_no_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_source(dir.path(), "Person ID,Age\n1,30");
        let mut cache = DatasetCache::new();

        assert!(cache.load(&path).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_source_is_reported() {
        let mut cache = DatasetCache::new();
        let err = cache.load(Path::new("no/such/sleep.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::SourceNotFound { .. }));
    }
}
