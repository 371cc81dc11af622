use crate::{
    backend::{Backend, UserApi},
    cli::{
        actions::{announce, valid_email, valid_phone, LoginMethod},
        globals::GlobalArgs,
    },
    session::{complete_sign_in, AuthSession, CredentialStore},
    verify::{check_code, valid_code, CodeCheck},
};
use anyhow::{bail, Result};

/// Immediate verification with the emailed code instead of waiting for
/// the poller.
pub async fn execute(method: LoginMethod, code: &str, globals: &GlobalArgs) -> Result<()> {
    if !valid_code(code) {
        bail!("the code is 6 letters or digits, exactly as received");
    }

    let backend = Backend::new(&globals.api_url, globals.api_key.clone())?;
    let store = CredentialStore::new(&globals.data_dir);
    let mut session = AuthSession::default();

    // create-or-fetch resolves the account id for the submitted identity
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

    if record.is_verified && !record.auth_token.is_empty() {
        let route = complete_sign_in(&store, &mut session, record)?;
        announce(route);
        return Ok(());
    }

    match check_code(&backend, &record.id, code).await? {
        CodeCheck::Verified(user) => {
            let route = complete_sign_in(&store, &mut session, user)?;
            announce(route);
            Ok(())
        }
        CodeCheck::Mismatch => bail!("wrong code, check it and try again"),
        CodeCheck::UnknownUser => bail!("account not found, start over with `koach login`"),
    }
}
