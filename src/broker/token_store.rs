/// Durable storage for the session token
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::Session;

/// Persists the single `{"enctoken": "..."}` record next to the process.
///
/// A missing or unreadable file is treated as "no session", never a hard
/// failure.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        TokenStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Load the stored session, if any.
    pub async fn load(&self) -> Option<Session> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return None,
        };

        match serde_json::from_str::<Session>(&content) {
            Ok(session) if session.is_authenticated() => Some(session),
            Ok(_) => None,
            Err(e) => {
                warn!("Ignoring malformed token file: {}", e);
                None
            }
        }
    }

    /// Overwrite the stored session.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Session token persisted");
        Ok(())
    }
}
