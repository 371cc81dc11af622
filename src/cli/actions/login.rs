use crate::{
    backend::{Backend, UserApi},
    cli::{
        actions::{announce, valid_email, valid_phone, LoginMethod},
        globals::GlobalArgs,
    },
    session::{complete_sign_in, AuthSession, CredentialStore},
    verify::{
        cancellation, poll_until_verified, request_email_code, whatsapp_confirm_url, PollConfig,
        PollOutcome,
    },
};
use anyhow::{anyhow, bail, Result};

/// Create-or-fetch the account, trigger the out-of-band confirmation and
/// wait for the backend to flip `is_verified`.
pub async fn execute(method: LoginMethod, poll: &PollConfig, globals: &GlobalArgs) -> Result<()> {
    let backend = Backend::new(&globals.api_url, globals.api_key.clone())?;
    let store = CredentialStore::new(&globals.data_dir);
    let mut session = AuthSession::default();

    let record = match &method {
        LoginMethod::Phone(phone_number) => {
            if !valid_phone(phone_number) {
                bail!("invalid phone number, use the international format: +22912345678");
            }
            backend.upsert_user_by_phone(phone_number).await?
        }
        LoginMethod::Email(email) => {
            if !valid_email(email) {
                bail!("invalid email address");
            }
            backend.upsert_user_by_email(email).await?
        }
    };

    // Returning users skip verification entirely.
    if record.is_verified && !record.auth_token.is_empty() {
        let route = complete_sign_in(&store, &mut session, record)?;
        announce(route);
        return Ok(());
    }

    match &method {
        LoginMethod::Phone(phone_number) => {
            println!("Open WhatsApp and send the confirmation message:");
            println!("  {}", whatsapp_confirm_url(phone_number));
        }
        LoginMethod::Email(email) => {
            request_email_code(&globals.code_webhook_url, email).await;
            println!("A verification code is on its way to {email}.");
            println!("You can also finish with: koach verify --email {email} --code <CODE>");
        }
    }

    println!("Waiting for confirmation (Ctrl-C to stop)...");

    let (handle, token) = cancellation();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        handle.cancel();
    });

    match poll_until_verified(&backend, poll, &record.id, token).await {
        PollOutcome::Verified(user) => {
            let route = complete_sign_in(&store, &mut session, user)?;
            announce(route);
            Ok(())
        }
        PollOutcome::TimedOut => Err(anyhow!(
            "still not confirmed, run `koach login` again once you have confirmed"
        )),
        PollOutcome::Cancelled => {
            println!("Stopped. Nothing was saved.");
            Ok(())
        }
    }
}
