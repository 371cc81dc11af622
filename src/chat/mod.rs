use crate::session::UserRecord;
use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Client for the coach-chat webhook. One POST per message, no retry;
/// the caller turns any failure into a single generic connectivity
/// error for the user.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    webhook_url: String,
}

impl ChatClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }

    /// Send one message on behalf of the signed-in user and return the
    /// coach's reply.
    ///
    /// # Errors
    /// Returns an error on any transport or protocol failure.
    #[instrument(skip(self, user, message))]
    pub async fn send(&self, message: &str, user: &UserRecord) -> Result<String> {
        let payload = json!({
            "message": message,
            "userId": user.id,
            "email": user.email,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or(Value::Null);

            return Err(anyhow!(
                "{} - {}, {}",
                self.webhook_url,
                status,
                json_response["message"].as_str().unwrap_or("")
            ));
        }

        let json_response: Value = response.json().await?;

        debug!("coach replied");

        json_response["response"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| anyhow!("Error parsing JSON response: no response found"))
    }
}
