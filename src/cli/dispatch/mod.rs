use crate::{
    cli::{
        actions::{Action, LoginMethod},
        globals::GlobalArgs,
    },
    verify::PollConfig,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use tokio::time::Duration;

fn identity(matches: &clap::ArgMatches) -> Result<LoginMethod> {
    if let Some(phone) = matches.get_one::<String>("phone") {
        return Ok(LoginMethod::Phone(phone.clone()));
    }

    matches
        .get_one::<String>("email")
        .map(|email| LoginMethod::Email(email.clone()))
        .context("missing required argument: --phone or --email")
}

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let api_url = matches
        .get_one::<String>("api-url")
        .cloned()
        .context("missing required argument: --api-url")?;

    let api_key = matches
        .get_one::<String>("api-key")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --api-key")?;

    let data_dir = matches
        .get_one::<String>("data-dir")
        .map(PathBuf::from)
        .context("missing required argument: --data-dir")?;

    let mut globals = GlobalArgs::new(api_url, api_key, data_dir);

    globals.chat_url = matches
        .get_one::<String>("chat-url")
        .cloned()
        .unwrap_or_default();

    globals.code_webhook_url = matches
        .get_one::<String>("code-webhook-url")
        .cloned()
        .unwrap_or_default();

    let action = match matches.subcommand() {
        Some(("login", sub)) => {
            let poll = PollConfig {
                interval: Duration::from_secs(
                    sub.get_one::<u64>("poll-interval").copied().unwrap_or(5),
                ),
                max_attempts: sub.get_one::<u32>("poll-attempts").copied().unwrap_or(60),
            };

            Action::Login {
                method: identity(sub)?,
                poll,
            }
        }
        Some(("verify", sub)) => Action::Verify {
            method: identity(sub)?,
            code: sub
                .get_one::<String>("code")
                .cloned()
                .context("missing required argument: --code")?,
        },
        Some(("status", _)) => Action::Status,
        Some(("profile", sub)) => Action::Profile {
            nom: sub.get_one::<String>("nom").cloned(),
            email: sub.get_one::<String>("email").cloned(),
        },
        Some(("chat", sub)) => Action::Chat {
            message: sub
                .get_one::<String>("message")
                .cloned()
                .context("missing required argument: message")?,
        },
        Some(("logout", _)) => Action::Logout,
        _ => anyhow::bail!("no subcommand provided"),
    };

    Ok((action, globals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    fn matches_for(args: Vec<&str>) -> clap::ArgMatches {
        let mut full = vec![
            "koach",
            "--api-url",
            "https://project.supabase.co",
            "--api-key",
            "anon-key",
        ];
        full.extend(args);
        commands::new().get_matches_from(full)
    }

    #[test]
    fn test_handler_login_phone() {
        let matches = matches_for(vec!["login", "--phone", "+22912345678"]);
        let (action, globals) = handler(&matches).unwrap();

        assert_eq!(globals.api_url, "https://project.supabase.co");
        assert_eq!(globals.api_key.expose_secret(), "anon-key");

        match action {
            Action::Login { method, poll } => {
                assert_eq!(method, LoginMethod::Phone("+22912345678".to_string()));
                assert_eq!(poll.interval, Duration::from_secs(5));
                assert_eq!(poll.max_attempts, 60);
            }
            other => panic!("expected Login, got {other:?}"),
        }
    }

    #[test]
    fn test_handler_verify_code() {
        let matches = matches_for(vec![
            "verify",
            "--email",
            "ama@example.com",
            "--code",
            "23XYZ9",
        ]);
        let (action, _) = handler(&matches).unwrap();

        match action {
            Action::Verify { method, code } => {
                assert_eq!(method, LoginMethod::Email("ama@example.com".to_string()));
                assert_eq!(code, "23XYZ9");
            }
            other => panic!("expected Verify, got {other:?}"),
        }
    }

    #[test]
    fn test_handler_chat_message() {
        let matches = matches_for(vec!["chat", "hello coach"]);
        let (action, globals) = handler(&matches).unwrap();

        assert!(globals.chat_url.starts_with("https://"));
        match action {
            Action::Chat { message } => assert_eq!(message, "hello coach"),
            other => panic!("expected Chat, got {other:?}"),
        }
    }
}
