use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

const CREDENTIALS_FILE: &str = "credentials.json";

/// Advisory lifetime written next to the credentials. Nothing enforces
/// it; the backend record is always the source of truth.
const ADVISORY_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub user_id: String,
    pub auth_token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Durable storage for exactly one `(user_id, auth_token)` pair.
///
/// Written only after the backend has confirmed the user is verified,
/// cleared on logout or on any revalidation failure.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CREDENTIALS_FILE),
        }
    }

    /// Overwrites both fields; no merge semantics.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, user_id: &str, auth_token: &str) -> Result<()> {
        let credentials = StoredCredentials {
            user_id: user_id.to_string(),
            auth_token: auth_token.to_string(),
            expires_at: Some((Utc::now() + Duration::days(ADVISORY_TTL_DAYS)).to_rfc3339()),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        fs::write(&self.path, serde_json::to_vec_pretty(&credentials)?)
            .with_context(|| format!("writing {}", self.path.display()))?;

        debug!("saved credentials for user {}", user_id);

        Ok(())
    }

    /// Returns the stored pair, or `None`. A missing, unreadable or
    /// unparsable file is treated the same as an empty store.
    #[must_use]
    pub fn load(&self) -> Option<StoredCredentials> {
        let raw = fs::read_to_string(&self.path).ok()?;

        let credentials: StoredCredentials = match serde_json::from_str(&raw) {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!("unreadable credential file {}: {}", self.path.display(), e);
                return None;
            }
        };

        if credentials.user_id.is_empty() || credentials.auth_token.is_empty() {
            return None;
        }

        Some(credentials)
    }

    /// Removes both fields. Idempotent; a failure to remove is logged and
    /// otherwise ignored.
    pub fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("cleared credentials"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not clear {}: {}", self.path.display(), e),
        }
    }
}
