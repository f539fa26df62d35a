//! Save records and where they are kept.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::adapter::DisplaySnapshot;
use crate::error::StoreError;

/// One autosave: the display plus the VM's own state blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub display: DisplaySnapshot,
    /// Opaque VM state, as produced by [`VmLink::save_state`](super::VmLink::save_state)
    pub vm: serde_json::Value,
    pub saved_at: DateTime<Utc>,
}

impl SaveRecord {
    pub fn new(display: DisplaySnapshot, vm: serde_json::Value) -> Self {
        Self {
            display,
            vm,
            saved_at: Utc::now(),
        }
    }
}

/// Persistence for the single autosave slot.
pub trait SaveStore: Send + Sync {
    fn save(&self, record: &SaveRecord) -> Result<(), StoreError>;
    /// `None` when nothing has been saved.
    fn load(&self) -> Result<Option<SaveRecord>, StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
}

/// Keeps the autosave as `autosave.json` in a directory.
#[derive(Debug, Clone)]
pub struct FileSaveStore {
    dir: PathBuf,
}

impl FileSaveStore {
    pub const FILE_NAME: &'static str = "autosave.json";

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store in `dir`, or fail when no save directory could be determined.
    pub fn locate(dir: Option<PathBuf>) -> Result<Self, StoreError> {
        dir.map(Self::new).ok_or(StoreError::NoSaveDir)
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(Self::FILE_NAME)
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SaveStore for FileSaveStore {
    fn save(&self, record: &SaveRecord) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(Self::io_error(&self.dir))?;
        let json = serde_json::to_string_pretty(record)?;
        // Write then rename so a crash never leaves a truncated save.
        let tmp = self.dir.join(format!("{}.tmp", Self::FILE_NAME));
        fs::write(&tmp, json).map_err(Self::io_error(&tmp))?;
        let path = self.path();
        fs::rename(&tmp, &path).map_err(Self::io_error(&path))?;
        tracing::debug!(path = %path.display(), "autosave written");
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveRecord>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(Self::io_error(&path))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&path)(e)),
        }
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemorySaveStore {
    slot: Mutex<Option<SaveRecord>>,
}

impl MemorySaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemorySaveStore {
    fn save(&self, record: &SaveRecord) -> Result<(), StoreError> {
        *self.slot.lock() = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveRecord>, StoreError> {
        Ok(self.slot.lock().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SaveRecord {
        SaveRecord::new(
            DisplaySnapshot {
                generation: 5,
                input_window_id: Some(2),
                status_bar_html: "<div>Kitchen</div>".into(),
                upper_window_html: String::new(),
                lower_window_html: "<p>A table.</p>".into(),
            },
            serde_json::json!({ "position": 4 }),
        )
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSaveStore::new(dir.path().join("saves"));
        assert!(store.load().unwrap().is_none());

        let saved = record();
        store.save(&saved).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), Some(saved));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn locate_requires_a_directory() {
        assert!(matches!(FileSaveStore::locate(None), Err(StoreError::NoSaveDir)));
        let store = FileSaveStore::locate(Some(PathBuf::from("/tmp/zvox-saves"))).unwrap();
        assert_eq!(store.path(), PathBuf::from("/tmp/zvox-saves/autosave.json"));
    }

    #[test]
    fn corrupt_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSaveStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }

    #[test]
    fn memory_store_holds_one_record() {
        let store = MemorySaveStore::new();
        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap().map(|r| r.display.generation), Some(5));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
