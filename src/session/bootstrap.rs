use crate::{
    backend::UserApi,
    session::{CredentialStore, UserRecord},
};
use tracing::{debug, info, instrument, warn};

/// Result of the single boot-time revalidation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// No usable credentials; the user must authenticate.
    Unauthenticated,
    /// Verified, token matches, profile complete.
    Authenticated(UserRecord),
    /// Verified and token matches, but `nom`/`email` are missing. The
    /// stored credentials stay: the backend record exists and is
    /// verified, only the profile step is outstanding.
    ProfileIncomplete(UserRecord),
}

/// Revalidate stored credentials against the backend. Runs exactly once
/// per process start and does not retry: a transient backend error is
/// terminal for this boot attempt and resolves to a clean logged-out
/// state.
#[instrument(skip(api, store))]
pub async fn bootstrap(api: &impl UserApi, store: &CredentialStore) -> Bootstrap {
    let Some(stored) = store.load() else {
        debug!("no stored credentials");
        return Bootstrap::Unauthenticated;
    };

    debug!("found stored credentials for {}, revalidating", stored.user_id);

    let record = match api.fetch_user_by_id(&stored.user_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            warn!("stored user {} no longer exists", stored.user_id);
            store.clear();
            return Bootstrap::Unauthenticated;
        }
        Err(e) => {
            warn!("revalidation failed: {}", e);
            store.clear();
            return Bootstrap::Unauthenticated;
        }
    };

    if !record.is_verified || record.auth_token != stored.auth_token {
        warn!("stored user {} not verified or token rotated", stored.user_id);
        store.clear();
        return Bootstrap::Unauthenticated;
    }

    if !record.profile_complete() {
        info!("session restored for {}, profile incomplete", record.id);
        return Bootstrap::ProfileIncomplete(record);
    }

    info!("session restored for {}", record.id);

    Bootstrap::Authenticated(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::{Reply, ScriptedApi};

    fn verified_record(token: &str, email: Option<&str>) -> UserRecord {
        UserRecord {
            id: "u1".to_string(),
            auth_token: token.to_string(),
            is_verified: true,
            phone_number: Some("+22912345678".to_string()),
            nom: email.map(|_| "Ama".to_string()),
            email: email.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_empty_store_skips_backend() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        let api = ScriptedApi::new(vec![]);

        let result = bootstrap(&api, &store).await;

        assert_eq!(result, Bootstrap::Unauthenticated);
        assert_eq!(api.fetch_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_clears_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save("u1", "TOK1").unwrap();

        let api = ScriptedApi::new(vec![Reply::Fail("connection refused")]);

        let result = bootstrap(&api, &store).await;

        assert_eq!(result, Bootstrap::Unauthenticated);
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_missing_record_clears_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save("u1", "TOK1").unwrap();

        let api = ScriptedApi::new(vec![Reply::NotFound]);

        let result = bootstrap(&api, &store).await;

        assert_eq!(result, Bootstrap::Unauthenticated);
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_rotated_token_never_restores_stale_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save("u1", "TOK1").unwrap();

        let api = ScriptedApi::new(vec![Reply::User(verified_record(
            "TOK2",
            Some("ama@example.com"),
        ))]);

        let result = bootstrap(&api, &store).await;

        assert_eq!(result, Bootstrap::Unauthenticated);
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_unverified_record_clears_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save("u1", "TOK1").unwrap();

        let mut record = verified_record("TOK1", Some("ama@example.com"));
        record.is_verified = false;
        let api = ScriptedApi::new(vec![Reply::User(record)]);

        let result = bootstrap(&api, &store).await;

        assert_eq!(result, Bootstrap::Unauthenticated);
        assert!(store.load().is_none());
    }

    #[tokio::test]
    async fn test_incomplete_profile_is_a_named_state_and_keeps_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save("u1", "TOK1").unwrap();

        let api = ScriptedApi::new(vec![Reply::User(verified_record("TOK1", None))]);

        let result = bootstrap(&api, &store).await;

        match result {
            Bootstrap::ProfileIncomplete(record) => assert_eq!(record.id, "u1"),
            other => panic!("expected ProfileIncomplete, got {other:?}"),
        }
        assert!(store.load().is_some());
    }

    #[tokio::test]
    async fn test_complete_profile_restores_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.save("u1", "TOK1").unwrap();

        let api = ScriptedApi::new(vec![Reply::User(verified_record(
            "TOK1",
            Some("ama@example.com"),
        ))]);

        let result = bootstrap(&api, &store).await;

        match result {
            Bootstrap::Authenticated(record) => {
                assert_eq!(record.id, "u1");
                assert_eq!(record.auth_token, "TOK1");
            }
            other => panic!("expected Authenticated, got {other:?}"),
        }
        assert!(store.load().is_some());
    }
}
