pub mod chat;
pub mod login;
pub mod profile;
pub mod session;
pub mod verify;

// Internal "interpreter" for `Action`.
// We keep the match in a separate module so `mod.rs` stays small as more actions are added.
mod run;

use crate::{cli::globals::GlobalArgs, session::Route, verify::PollConfig};
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMethod {
    Phone(String),
    Email(String),
}

#[derive(Debug)]
pub enum Action {
    Login { method: LoginMethod, poll: PollConfig },
    Verify { method: LoginMethod, code: String },
    Status,
    Profile { nom: Option<String>, email: Option<String> },
    Chat { message: String },
    Logout,
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> anyhow::Result<()> {
        run::execute(self, globals).await
    }
}

// common functions for the actions

pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

pub fn valid_phone(phone_number: &str) -> bool {
    // international format, digits only after an optional +
    Regex::new(r"^\+?[0-9]{8,15}$").map_or(false, |re| re.is_match(phone_number))
}

pub(crate) fn announce(route: Route) {
    match route {
        Route::Main => println!("Signed in. You're all set."),
        Route::CompleteProfile => println!(
            "Signed in. Your profile is incomplete, finish it with: koach profile --nom <NAME> --email <EMAIL>"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(valid_email("ama@example.com"));
        assert!(valid_email("a.b+c@sub.example.org"));
        assert!(!valid_email("ama@example"));
        assert!(!valid_email("ama example.com"));
        assert!(!valid_email("@example.com"));
    }

    #[test]
    fn test_valid_phone() {
        assert!(valid_phone("+22912345678"));
        assert!(valid_phone("22912345678"));
        assert!(!valid_phone("+229 12 34 56 78"));
        assert!(!valid_phone("+229"));
        assert!(!valid_phone("not-a-number"));
    }
}
