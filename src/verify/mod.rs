use crate::{backend::UserApi, session::UserRecord};
use anyhow::Result;
use regex::Regex;
use reqwest::Client;
use serde_json::json;
use tokio::{
    sync::watch,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{debug, info, instrument, warn};

/// Number the WhatsApp confirmation message is sent to.
pub const WHATSAPP_RECIPIENT_NUMBER: &str = "22958082628";
pub const WHATSAPP_MESSAGE_KEYWORD: &str = "confirmer";

/// The e-mailed code is the tail of the backend-issued auth token.
pub const VERIFICATION_CODE_LEN: usize = 6;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Bounded polling policy: one backend fetch per tick, at most
/// `max_attempts` ticks. Replaces the open-ended loop the product
/// started with.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The backend confirmed the user with a non-empty token.
    Verified(UserRecord),
    /// Attempts exhausted without confirmation.
    TimedOut,
    /// Stopped through the cancellation token; nothing was persisted.
    Cancelled,
}

/// Cancels an in-flight poll loop. Dropping the handle cancels too, so a
/// poller can never outlive its owner.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }

            // A dropped handle counts as cancellation.
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[must_use]
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);

    (CancelHandle { tx }, CancelToken { rx })
}

/// Poll the backend until the pending user becomes verified.
///
/// Transient fetch errors and still-unverified records are soft
/// failures: logged, one attempt consumed, loop continues. Each attempt
/// awaits its own request before the next tick, so two fetches are never
/// in flight at once.
#[instrument(skip(api, config, cancel))]
pub async fn poll_until_verified(
    api: &impl UserApi,
    config: &PollConfig,
    user_id: &str,
    mut cancel: CancelToken,
) -> PollOutcome {
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for attempt in 1..=config.max_attempts {
        // Cancellation wins over a ready tick or fetch.
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("verification poll cancelled");
                return PollOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("verification poll cancelled");
                return PollOutcome::Cancelled;
            }
            fetched = api.fetch_user_by_id(user_id) => fetched,
        };

        match fetched {
            Ok(Some(record)) if record.is_verified && !record.auth_token.is_empty() => {
                info!("user {} verified after {} attempt(s)", user_id, attempt);
                return PollOutcome::Verified(record);
            }
            Ok(Some(_)) => debug!("attempt {}: not verified yet", attempt),
            Ok(None) => warn!("attempt {}: user {} not found", attempt, user_id),
            Err(e) => warn!("attempt {}: poll failed: {}", attempt, e),
        }
    }

    warn!(
        "user {} not verified after {} attempts",
        user_id, config.max_attempts
    );

    PollOutcome::TimedOut
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeCheck {
    /// Code matched; the record comes back with `is_verified` set.
    Verified(UserRecord),
    /// Wrong code. Retryable, no lockout.
    Mismatch,
    UnknownUser,
}

#[must_use]
pub fn valid_code(code: &str) -> bool {
    Regex::new(r"^[0-9A-Za-z]{6}$").map_or(false, |re| re.is_match(code))
}

/// Immediate verification path: compare the submitted code against the
/// tail of the backend-issued token, then mark the user verified.
///
/// # Errors
/// Returns an error only on backend failure; a wrong code is a
/// `CodeCheck::Mismatch`, not an error.
#[instrument(skip(api, submitted))]
pub async fn check_code(api: &impl UserApi, user_id: &str, submitted: &str) -> Result<CodeCheck> {
    let Some(record) = api.fetch_user_by_id(user_id).await? else {
        return Ok(CodeCheck::UnknownUser);
    };

    let token = &record.auth_token;

    let Some(start) = token.len().checked_sub(VERIFICATION_CODE_LEN) else {
        warn!("token for {} shorter than a verification code", user_id);
        return Ok(CodeCheck::Mismatch);
    };

    if !token.is_char_boundary(start) || submitted != &token[start..] {
        debug!("code mismatch for user {}", user_id);
        return Ok(CodeCheck::Mismatch);
    }

    let updated = api.mark_user_verified(user_id).await?;

    info!("user {} verified by code", user_id);

    Ok(CodeCheck::Verified(updated))
}

/// Deep link the user opens to send the confirmation message.
#[must_use]
pub fn whatsapp_confirm_url(phone_number: &str) -> String {
    let text = format!("{WHATSAPP_MESSAGE_KEYWORD} {phone_number}");

    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    let encoded = encoded.replace('+', "%20");

    format!("https://wa.me/{WHATSAPP_RECIPIENT_NUMBER}?text={encoded}")
}

/// Ask the backend automation to e-mail the verification code.
/// Fire-and-forget: a failure is logged and never surfaced.
#[instrument(skip(webhook_url))]
pub async fn request_email_code(webhook_url: &str, email: &str) {
    let client = match Client::builder().user_agent(crate::APP_USER_AGENT).build() {
        Ok(client) => client,
        Err(e) => {
            warn!("could not build webhook client: {}", e);
            return;
        }
    };

    match client
        .post(webhook_url)
        .json(&json!({ "email": email }))
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => {
            debug!("verification code requested for {}", email);
        }
        Ok(response) => warn!("code webhook answered {}", response.status()),
        Err(e) => warn!("code webhook failed: {}", e),
    }
}
