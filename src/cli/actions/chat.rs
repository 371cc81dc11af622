use crate::{
    backend::Backend,
    chat::ChatClient,
    cli::globals::GlobalArgs,
    session::{bootstrap, AuthSession, Bootstrap, CredentialStore},
};
use anyhow::{anyhow, bail, Result};
use tracing::warn;

/// Send one message to the coach webhook and print the reply.
pub async fn execute(message: &str, globals: &GlobalArgs) -> Result<()> {
    let backend = Backend::new(&globals.api_url, globals.api_key.clone())?;
    let store = CredentialStore::new(&globals.data_dir);
    let mut session = AuthSession::new();

    let record = match bootstrap(&backend, &store).await {
        Bootstrap::Authenticated(record) => record,
        Bootstrap::ProfileIncomplete(_) => {
            bail!("finish your profile first: koach profile --nom <NAME> --email <EMAIL>")
        }
        Bootstrap::Unauthenticated => bail!("not signed in, start with `koach login`"),
    };
    session.finish_loading();
    session.sign_in(record.clone());

    let chat = ChatClient::new(&globals.chat_url)?;

    match chat.send(message, &record).await {
        Ok(reply) => {
            println!("{reply}");
            Ok(())
        }
        Err(e) => {
            // One generic connectivity error for the user, details in the log.
            warn!("chat webhook failed: {}", e);
            Err(anyhow!("could not reach your coach, try again in a moment"))
        }
    }
}
