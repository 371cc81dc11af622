use crate::cli::{
    actions::{chat, login, profile, session, verify, Action},
    globals::GlobalArgs,
};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
// To add a new action, add a new `Action::*` variant and a corresponding `*_::execute` call here.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Login { method, poll } => login::execute(method, &poll, globals).await,
        Action::Verify { method, code } => verify::execute(method, &code, globals).await,
        Action::Status => session::status(globals).await,
        Action::Profile { nom, email } => profile::execute(nom, email, globals).await,
        Action::Chat { message } => chat::execute(&message, globals).await,
        Action::Logout => session::logout(globals),
    }
}
