use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;

use crate::Result;
use crate::SessionStoreError;

/// Durable key/value store scoped to one browsing session
#[cfg_attr(test, automock)]
pub trait SessionStore: Send + Sync + 'static {
    /// Returns `Ok(None)` when nothing is stored under `key`
    fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>>;

    fn store(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()>;
}

/// Values live as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn store(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key under `dir`. The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(
        &self,
        key: &str,
    ) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStore for FileSessionStore {
    fn load(
        &self,
        key: &str,
    ) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SessionStoreError::Io { path, source }.into()),
        }
    }

    fn store(
        &self,
        key: &str,
        value: &str,
    ) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|source| SessionStoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| SessionStoreError::Io { path, source })?;
        Ok(())
    }
}
