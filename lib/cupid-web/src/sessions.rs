use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{bail, Result};

use cupid_app::UserId;

pub type SessionId = String;

pub const SESSION_ID_COOKIE: &str = "_cupid_sid";

#[derive(Clone, Copy)]
pub struct SessionInfo {
    pub user_id: UserId,
}

/// Server-side session store. Owned by the request handler and handed to
/// routing explicitly; there is no ambient session state.
#[derive(Clone)]
pub struct Sessions {
    inner: Arc<RwLock<HashMap<SessionId, SessionInfo>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Sessions {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Opens a session for an authenticated user and returns the id that
    /// goes into the session cookie.
    pub fn open(&self, user_id: UserId) -> Result<SessionId> {
        let session_id: SessionId = uuid::Uuid::new_v4().into();
        match self.inner.write() {
            Ok(mut sessions_write_lock) => {
                sessions_write_lock.insert(session_id.clone(), SessionInfo { user_id });
                Ok(session_id)
            }
            Err(e) => bail!("Could not lock session store for write: {}", e),
        }
    }

    pub fn get(&self, session_id: &SessionId) -> Result<Option<SessionInfo>> {
        match self.inner.read() {
            Ok(sessions_read_lock) => Ok(sessions_read_lock.get(session_id).copied()),
            Err(e) => bail!("Could not lock session store for read: {}", e),
        }
    }

    /// Removes the session entry entirely; the cookie value becomes useless.
    pub fn close(&self, session_id: &SessionId) -> Result<()> {
        match self.inner.write() {
            Ok(mut sessions_write_lock) => {
                sessions_write_lock.remove(session_id);
                Ok(())
            }
            Err(e) => bail!("Could not lock session store for write: {}", e),
        }
    }
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new()
    }
}
