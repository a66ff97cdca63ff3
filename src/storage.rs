//! Durable key-value storage backing the history log.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Default data directory: `<platform data dir>/area-check`.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .context("could not determine a data directory")?;
    Ok(base.join("area-check"))
}

/// One file per key (`<dir>/<key>.json`).
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create {}", self.dir.display()))?;
        let path = self.path_for(key);
        // Readers only ever see the old or the new value.
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value).with_context(|| format!("write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove {}", path.display())),
        }
    }
}

/// In-process store for tests and `--ephemeral` runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(tag: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        std::env::temp_dir().join(format!("area_check_{tag}_{suffix}"))
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let root = temp_root("storage");
        let mut store = FileStore::new(root.join("nested"));

        assert_eq!(store.get("history").expect("get"), None);
        store.set("history", "[1]").expect("set");
        store.set("history", "[1,2]").expect("overwrite");
        assert_eq!(store.get("history").expect("get").as_deref(), Some("[1,2]"));
        assert!(!store.dir().join(".history.json.tmp").exists());

        store.remove("history").expect("remove");
        store.remove("history").expect("remove twice");
        assert_eq!(store.get("history").expect("get"), None);

        std::fs::remove_dir_all(root).expect("cleanup");
    }

    #[test]
    fn memory_store_is_keyed() {
        let mut store = MemoryStore::default();
        store.set("a", "1").expect("set");
        assert_eq!(store.get("a").expect("get").as_deref(), Some("1"));
        assert_eq!(store.get("b").expect("get"), None);
        store.remove("a").expect("remove");
        assert_eq!(store.get("a").expect("get"), None);
    }
}
