//! Persisted baseline snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use allocsync::AllocationSnapshot;
use log::warn;

use crate::error::{Error, Result};

/// Storage for the last committed snapshot.
pub trait BaselineStore {
    /// The committed baseline, or `None` if there is none (or it is unreadable).
    fn load(&self) -> Option<AllocationSnapshot>;
    fn save(&self, snapshot: &AllocationSnapshot) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

impl<S: BaselineStore + ?Sized> BaselineStore for &S {
    fn load(&self) -> Option<AllocationSnapshot> {
        (**self).load()
    }
    fn save(&self, snapshot: &AllocationSnapshot) -> Result<()> {
        (**self).save(snapshot)
    }
    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// A single pretty-printed JSON file, replaced atomically on save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, source: std::io::Error) -> Error {
        Error::Store {
            path: self.path.clone(),
            source,
        }
    }
}

impl BaselineStore for JsonFileStore {
    fn load(&self) -> Option<AllocationSnapshot> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("baseline {} unreadable: {e}", self.path.display());
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(
                    "baseline {} is corrupt, ignoring it: {e}",
                    self.path.display()
                );
                None
            }
        }
    }

    fn save(&self, snapshot: &AllocationSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.store_error(e))?;
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| self.store_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.store_error(e))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.store_error(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use allocsync::{AllocationRecord, MarketCode, Price};

    fn snapshot() -> AllocationSnapshot {
        let mut rec = AllocationRecord::new("AAPL", MarketCode::Us, 10.0)
            .with_name("Apple")
            .with_prices(Price(185_50), Price(150_00));
        rec.extra.insert("sector".into(), serde_json::json!("tech"));
        AllocationSnapshot::new(vec![rec], Some(100.0))
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("baseline.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn save_then_load_keeps_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("baseline.json"));
        let snap = snapshot();
        store.save(&snap).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, snap);
        assert_eq!(loaded.records[0].extra["sector"], "tech");
        assert!(!dir.path().join("nested").join("baseline.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(JsonFileStore::new(&path).load().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("baseline.json"));
        store.save(&snapshot()).unwrap();
        store.clear().unwrap();
        assert!(store.load().is_none());
        store.clear().unwrap();
    }
}
