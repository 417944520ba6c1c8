use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::LoaderConfig;
use crate::error::SnapshotError;
use crate::listing::Listing;

const CACHE_DIR: &str = "carousel_terminal";

/// Last successful load, persisted under a single fixed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Unix millis of the load that produced it.
    pub at: i64,
    pub build: String,
    pub games: Vec<Listing>,
    #[serde(default)]
    pub icons: HashMap<String, String>,
}

pub trait SnapshotStore: Send + Sync {
    fn load(&self) -> Result<Option<CacheSnapshot>, SnapshotError>;
    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), SnapshotError>;
}

pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{key}.json")),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Result<Self, SnapshotError> {
        let dir = config
            .cache_dir
            .clone()
            .or_else(default_cache_dir)
            .ok_or(SnapshotError::NoCacheDir)?;
        Ok(Self::new(dir, &config.cache_key))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<CacheSnapshot>, SnapshotError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), SnapshotError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<CacheSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn with_snapshot(snapshot: CacheSnapshot) -> Self {
        Self {
            slot: Mutex::new(Some(snapshot)),
        }
    }

    pub fn current(&self) -> Option<CacheSnapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<CacheSnapshot>, SnapshotError> {
        Ok(self.current())
    }

    fn save(&self, snapshot: &CacheSnapshot) -> Result<(), SnapshotError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(snapshot.clone());
        Ok(())
    }
}

fn default_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
