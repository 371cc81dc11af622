use crate::{
    backend::{Backend, ProfileUpdate, UserApi},
    cli::{
        actions::{announce, valid_email},
        globals::GlobalArgs,
    },
    session::{bootstrap, complete_sign_in, AuthSession, Bootstrap, CredentialStore, Route},
};
use anyhow::{bail, Result};

/// Update `nom`/`email` on the current account, then re-derive the route
/// from the returned record.
pub async fn execute(
    nom: Option<String>,
    email: Option<String>,
    globals: &GlobalArgs,
) -> Result<()> {
    if nom.is_none() && email.is_none() {
        bail!("nothing to update, pass --nom and/or --email");
    }

    if let Some(email) = email.as_deref() {
        if !valid_email(email) {
            bail!("invalid email address");
        }
    }

    let backend = Backend::new(&globals.api_url, globals.api_key.clone())?;
    let store = CredentialStore::new(&globals.data_dir);
    let mut session = AuthSession::new();

    let record = match bootstrap(&backend, &store).await {
        Bootstrap::Authenticated(record) | Bootstrap::ProfileIncomplete(record) => record,
        Bootstrap::Unauthenticated => bail!("not signed in, start with `koach login`"),
    };
    session.finish_loading();

    let updated = backend
        .update_user_profile(&record.id, ProfileUpdate { nom, email })
        .await?;

    // Completeness is derived fresh from the updated record.
    let route = complete_sign_in(&store, &mut session, updated)?;

    match route {
        Route::Main => println!("Profile updated. You're all set."),
        Route::CompleteProfile => announce(route),
    }

    Ok(())
}
