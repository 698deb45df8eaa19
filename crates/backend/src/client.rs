//! Thin typed client for the opencode REST API.
//!
//! One client is built per supervised process and shares a single
//! connection pool. Operations are not retried here; the supervisor's
//! health poll is the only retry loop in the crate.

use std::time::Duration;

use {
    reqwest::{Method, RequestBuilder},
    secrecy::{ExposeSecret, Secret},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    process::ServerSettings,
    wire::{Health, MessageResponse, Session},
};

/// Overall request ceiling. Message sends block until the assistant has
/// finished a full turn, which can take minutes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub struct OpencodeClient {
    http: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<Secret<String>>,
}

impl std::fmt::Debug for OpencodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpencodeClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl OpencodeClient {
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: settings.base_url(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    /// Point the client at an arbitrary base URL (mock servers).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            builder = builder.basic_auth(username, Some(password.expose_secret()));
        }
        builder
    }

    /// Consume a response, surfacing non-2xx statuses as [`Error::Backend`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::Backend {
            status: status.as_u16(),
            body,
        })
    }

    /// `GET /global/health`
    pub async fn health(&self) -> Result<Health> {
        let response = self.request(Method::GET, "/global/health").send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /session` — every call creates a fresh session.
    pub async fn create_session(&self, title: Option<&str>) -> Result<Session> {
        let mut body = serde_json::Map::new();
        if let Some(title) = title {
            body.insert("title".into(), title.into());
        }
        let response = self
            .request(Method::POST, "/session")
            .json(&body)
            .send()
            .await?;
        let session: Session = Self::check(response).await?.json().await?;
        debug!(session_id = %session.id, "created session");
        Ok(session)
    }

    /// `GET /session`
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        let response = self.request(Method::GET, "/session").send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /session/{id}`
    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        let response = self
            .request(Method::GET, &format!("/session/{session_id}"))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `DELETE /session/{id}` — an unknown id comes back as [`Error::Backend`].
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &format!("/session/{session_id}"))
            .send()
            .await?;
        Self::check(response).await?;
        debug!(session_id, "deleted session");
        Ok(())
    }

    /// `POST /session/{id}/abort`
    pub async fn abort_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &format!("/session/{session_id}/abort"))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// `POST /session/{id}/message` — send user text and wait for the full
    /// assistant turn. Latency-bound; callers must not serialize unrelated
    /// work behind this.
    pub async fn send_message(
        &self,
        session_id: &str,
        text: &str,
        model: Option<&str>,
        agent: Option<&str>,
    ) -> Result<MessageResponse> {
        let body = message_body(text, model, agent);
        let response = self
            .request(Method::POST, &format!("/session/{session_id}/message"))
            .json(&body)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `POST /session/{id}/prompt_async` — fire-and-forget send. The server
    /// offers no way to correlate the eventual reply, so nothing in the
    /// relay uses this; it exists for callers that poll messages themselves.
    pub async fn send_message_async(
        &self,
        session_id: &str,
        text: &str,
        model: Option<&str>,
        agent: Option<&str>,
    ) -> Result<()> {
        let body = message_body(text, model, agent);
        let response = self
            .request(Method::POST, &format!("/session/{session_id}/prompt_async"))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// `GET /session/{id}/message`
    pub async fn list_messages(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<serde_json::Value>> {
        let mut builder = self.request(Method::GET, &format!("/session/{session_id}/message"));
        if let Some(limit) = limit {
            builder = builder.query(&[("limit", limit)]);
        }
        let response = builder.send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    /// `GET /session/{id}/message/{messageId}`
    pub async fn get_message(
        &self,
        session_id: &str,
        message_id: &str,
    ) -> Result<serde_json::Value> {
        let response = self
            .request(
                Method::GET,
                &format!("/session/{session_id}/message/{message_id}"),
            )
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }
}

/// Request body for both the synchronous and async message endpoints: user
/// text rides in a single text part.
fn message_body(text: &str, model: Option<&str>, agent: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "parts": [{ "type": "text", "text": text }],
    });
    if let Some(model) = model {
        body["model"] = model.into();
    }
    if let Some(agent) = agent {
        body["agent"] = agent.into();
    }
    body
}
