pub mod bootstrap;
pub mod store;

pub use self::bootstrap::{bootstrap, Bootstrap};
pub use self::store::CredentialStore;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A row from the backend `users` table, as every operation returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub auth_token: String,
    pub is_verified: bool,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserRecord {
    /// Profile completeness is always derived from the record, never
    /// cached: `nom` and `email` must both be non-empty.
    #[must_use]
    pub fn profile_complete(&self) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());

        filled(&self.nom) && filled(&self.email)
    }
}

/// Where the client goes after a state-changing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Main,
    CompleteProfile,
}

impl Route {
    #[must_use]
    pub fn after_sign_in(record: &UserRecord) -> Self {
        if record.profile_complete() {
            Self::Main
        } else {
            Self::CompleteProfile
        }
    }
}

/// Holds at most one signed-in user. Passed explicitly to whatever needs
/// it; there is no global instance.
#[derive(Debug, Default)]
pub struct AuthSession {
    current: Option<UserRecord>,
    loading: bool,
}

impl AuthSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: None,
            loading: true,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&UserRecord> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// True only while the initial bootstrap pass is running.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn finish_loading(&mut self) {
        self.loading = false;
    }

    /// Replaces the current session unconditionally. Callers must have
    /// persisted credentials already; this never touches the store.
    pub fn sign_in(&mut self, record: UserRecord) {
        debug!("signing in user {}", record.id);
        self.current = Some(record);
    }

    /// Clears the store and the in-memory state unconditionally.
    /// Idempotent.
    pub fn sign_out(&mut self, store: &CredentialStore) {
        debug!("signing out");
        store.clear();
        self.current = None;
    }
}

/// Persist the verified credentials, then publish the session. The store
/// must hold the `(id, token)` pair before the session turns non-null.
///
/// # Errors
/// Returns an error if the credentials cannot be written; the session is
/// left untouched in that case.
pub fn complete_sign_in(
    store: &CredentialStore,
    session: &mut AuthSession,
    record: UserRecord,
) -> Result<Route> {
    store.save(&record.id, &record.auth_token)?;

    let route = Route::after_sign_in(&record);

    session.sign_in(record);

    Ok(route)
}
