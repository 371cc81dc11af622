use crate::{
    backend::Backend,
    cli::globals::GlobalArgs,
    session::{bootstrap, AuthSession, Bootstrap, CredentialStore},
};
use anyhow::Result;

/// Run the boot-time revalidation pass and report the session state.
pub async fn status(globals: &GlobalArgs) -> Result<()> {
    let backend = Backend::new(&globals.api_url, globals.api_key.clone())?;
    let store = CredentialStore::new(&globals.data_dir);
    let mut session = AuthSession::new();

    let boot = bootstrap(&backend, &store).await;
    session.finish_loading();

    match boot {
        Bootstrap::Authenticated(record) => {
            let nom = record.nom.clone().unwrap_or_else(|| record.id.clone());
            let email = record.email.clone().unwrap_or_default();

            session.sign_in(record);
            println!("Signed in as {nom} <{email}>.");
        }
        Bootstrap::ProfileIncomplete(record) => {
            let id = record.id.clone();

            session.sign_in(record);
            println!("Signed in as {id}, profile incomplete.");
            println!("Finish it with: koach profile --nom <NAME> --email <EMAIL>");
        }
        Bootstrap::Unauthenticated => {
            println!("Not signed in. Start with: koach login");
        }
    }

    Ok(())
}

/// Clear stored credentials. A no-op when already signed out.
pub fn logout(globals: &GlobalArgs) -> Result<()> {
    let store = CredentialStore::new(&globals.data_dir);
    let mut session = AuthSession::default();

    session.sign_out(&store);

    println!("Signed out.");

    Ok(())
}
