use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_SESSION_STORAGE_KEY;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Key under which the session id is persisted
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory backing the durable session store.
    /// When unset, the session id only lives as long as the process.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            store_dir: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        let key = self.storage_key.trim();
        if key.is_empty() {
            return Err(Error::InvalidConfig("session.storage_key must not be empty".into()));
        }

        // The key doubles as a file name in the durable store
        if key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(Error::InvalidConfig(format!(
                "session.storage_key {:?} must be a plain name",
                self.storage_key
            )));
        }

        Ok(())
    }
}

fn default_storage_key() -> String {
    DEFAULT_SESSION_STORAGE_KEY.to_string()
}
