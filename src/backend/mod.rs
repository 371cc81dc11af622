#[cfg(test)]
pub(crate) mod scripted;

use crate::session::UserRecord;
use anyhow::{anyhow, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

/// Columns the client reads from the `users` table. Kept as a single
/// projection so every operation returns the same record shape.
const USER_COLUMNS: &str = "id,auth_token,is_verified,phone_number,nom,email";

/// Fields accepted by a profile update. Absent fields are left untouched
/// on the backend.
#[derive(Debug, Default, Clone)]
pub struct ProfileUpdate {
    pub nom: Option<String>,
    pub email: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nom.is_none() && self.email.is_none()
    }
}

/// Backend operations the session flow depends on. The HTTP client
/// implements this; tests drive the state machines with scripted fakes.
pub trait UserApi {
    fn fetch_user_by_id(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>>> + Send;

    fn mark_user_verified(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<UserRecord>> + Send;

    fn upsert_user_by_phone(
        &self,
        phone_number: &str,
    ) -> impl std::future::Future<Output = Result<UserRecord>> + Send;

    fn upsert_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<UserRecord>> + Send;

    fn update_user_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> impl std::future::Future<Output = Result<UserRecord>> + Send;
}

/// REST client for the `users` table.
#[derive(Debug, Clone)]
pub struct Backend {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

/// Normalize the configured base URL down to `scheme://host:port`.
///
/// # Errors
/// Returns an error if the URL has no host or an unsupported scheme.
pub fn base_url(api_url: &str) -> Result<String> {
    let url = Url::parse(api_url)?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {}", scheme)),
        },
    };

    Ok(format!("{scheme}://{host}:{port}"))
}

impl Backend {
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot
    /// be built.
    pub fn new(api_url: &str, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(api_url)?,
            api_key,
        })
    }

    fn users_url(&self) -> String {
        format!("{}/rest/v1/users", self.base_url)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", self.api_key.expose_secret())
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
    }

    async fn rows_or_error(response: reqwest::Response, url: &str) -> Result<Vec<UserRecord>> {
        if !response.status().is_success() {
            let status = response.status();
            let json_response: Value = response.json().await.unwrap_or(Value::Null);

            return Err(anyhow!(
                "{} - {}, {}",
                url,
                status,
                json_response["message"].as_str().unwrap_or("")
            ));
        }

        Ok(response.json().await?)
    }

    async fn select_one(&self, column: &str, value: &str) -> Result<Option<UserRecord>> {
        let url = self.users_url();

        let response = self
            .authed(self.client.get(&url))
            .query(&[
                ("select", USER_COLUMNS),
                (column, &format!("eq.{value}")),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let mut rows = Self::rows_or_error(response, &url).await?;

        debug!("select {}={} returned {} row(s)", column, value, rows.len());

        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn insert(&self, body: Value) -> Result<UserRecord> {
        let url = self.users_url();

        let response = self
            .authed(self.client.post(&url))
            .query(&[("select", USER_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let mut rows = Self::rows_or_error(response, &url).await?;

        if rows.is_empty() {
            return Err(anyhow!("{} - insert returned no record", url));
        }

        Ok(rows.remove(0))
    }

    async fn patch(&self, id: &str, body: Value) -> Result<UserRecord> {
        let url = self.users_url();

        let response = self
            .authed(self.client.patch(&url))
            .query(&[("select", USER_COLUMNS), ("id", &format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let mut rows = Self::rows_or_error(response, &url).await?;

        if rows.is_empty() {
            return Err(anyhow!("{} - no user with id {}", url, id));
        }

        Ok(rows.remove(0))
    }

    async fn upsert_by(&self, column: &str, value: &str) -> Result<UserRecord> {
        if let Some(existing) = self.select_one(column, value).await? {
            return Ok(existing);
        }

        // The backend issues the auth_token on insert; the client never
        // supplies one.
        let mut body = json!({ "is_verified": false });
        body[column] = Value::String(value.to_string());

        self.insert(body).await
    }
}

impl UserApi for Backend {
    #[instrument(skip(self))]
    async fn fetch_user_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        self.select_one("id", id).await
    }

    #[instrument(skip(self))]
    async fn mark_user_verified(&self, id: &str) -> Result<UserRecord> {
        self.patch(
            id,
            json!({
                "is_verified": true,
                "updated_at": chrono::Utc::now().to_rfc3339(),
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn upsert_user_by_phone(&self, phone_number: &str) -> Result<UserRecord> {
        self.upsert_by("phone_number", phone_number).await
    }

    #[instrument(skip(self))]
    async fn upsert_user_by_email(&self, email: &str) -> Result<UserRecord> {
        self.upsert_by("email", email).await
    }

    #[instrument(skip(self))]
    async fn update_user_profile(&self, id: &str, update: ProfileUpdate) -> Result<UserRecord> {
        if update.is_empty() {
            // Nothing to write, fall back to a plain fetch so callers
            // still get the current record.
            return self
                .fetch_user_by_id(id)
                .await?
                .ok_or_else(|| anyhow!("no user with id {}", id));
        }

        let mut body = json!({
            "updated_at": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(nom) = update.nom {
            body["nom"] = Value::String(nom);
        }

        if let Some(email) = update.email {
            body["email"] = Value::String(email);
        }

        self.patch(id, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_default_ports() {
        let url = base_url("https://koach.example.com").unwrap();
        assert_eq!(url, "https://koach.example.com:443");

        let url = base_url("http://localhost").unwrap();
        assert_eq!(url, "http://localhost:80");
    }

    #[test]
    fn test_base_url_explicit_port_and_path_stripped() {
        let url = base_url("http://localhost:54321/rest/v1").unwrap();
        assert_eq!(url, "http://localhost:54321");
    }

    #[test]
    fn test_base_url_rejects_unsupported_scheme() {
        assert!(base_url("ftp://koach.example.com").is_err());
    }

    #[test]
    fn test_profile_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());

        let update = ProfileUpdate {
            nom: Some("Ama".to_string()),
            email: None,
        };
        assert!(!update.is_empty());
    }
}
