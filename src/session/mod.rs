//! Anonymous session identity.
//!
//! The identifier is resolved once per [`SessionIdentityProvider`] and
//! reused for every event. Store failures are never surfaced: the provider
//! keeps an in-memory id for the lifetime of the process instead.

mod store;
pub use store::*;


use std::sync::Arc;
use std::sync::OnceLock;

use nanoid::nanoid;
use tracing::debug;
use tracing::warn;

use crate::constants::SESSION_ID_SUFFIX_LEN;
use crate::utils::time::timestamp_millis;

pub struct SessionIdentityProvider {
    store: Arc<dyn SessionStore>,
    key: String,
    resolved: OnceLock<String>,
}

impl SessionIdentityProvider {
    pub fn new(
        store: Arc<dyn SessionStore>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            resolved: OnceLock::new(),
        }
    }

    /// Returns the session id, creating and persisting one on first use.
    pub fn session_id(&self) -> &str {
        self.resolved.get_or_init(|| self.resolve())
    }

    fn resolve(&self) -> String {
        match self.store.load(&self.key) {
            Ok(Some(id)) if !id.is_empty() => {
                debug!(session_id = %id, "restored session id");
                return id;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("session store read failed, using in-memory session id: {:?}", e);
            }
        }

        let id = generate_session_id();
        if let Err(e) = self.store.store(&self.key, &id) {
            warn!("session store write failed, session id will not survive restart: {:?}", e);
        }
        debug!(session_id = %id, "created session id");
        id
    }
}

/// `<epoch millis>-<random suffix>`: unique enough for anonymous analytics
pub(crate) fn generate_session_id() -> String {
    format!("{}-{}", timestamp_millis(), nanoid!(SESSION_ID_SUFFIX_LEN))
}
