// REST client for the hub's HTTP API.
//
// Only the read-only endpoints the panel needs: a single entity's current
// state and its recorded history over a time window.
// Auth: `Authorization: Bearer <long-lived token>`

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::Error;

// ── Response shapes ──────────────────────────────────────────────────

/// One state record, as returned by `/api/states/{id}` and as a row of
/// `/api/history/period`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Absent on history rows after the first when the hub minimizes the
    /// response.
    #[serde(default)]
    pub entity_id: Option<String>,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the hub's REST API.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl RestClient {
    /// Build a client with its own connection pool.
    pub fn new(base_url: &str, token: SecretString, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("haui/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(base_url, token, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        base_url: &str,
        token: SecretString,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// The hub's base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/states/{entity_id}`
    pub async fn entity_state(&self, entity_id: &str) -> Result<StateRecord, Error> {
        let url = self.url(&["api", "states", entity_id]);
        self.get(url).await
    }

    /// `GET /api/history/period/{start}?end_time=..&filter_entity_id=..`
    ///
    /// Returns the rows for `entity_id` in chronological order, or an empty
    /// list when the hub recorded nothing in the window.
    pub async fn history(
        &self,
        entity_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StateRecord>, Error> {
        let start = start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let end = end.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut url = self.url(&["api", "history", "period", &start]);
        url.query_pairs_mut()
            .append_pair("end_time", &end)
            .append_pair("filter_entity_id", entity_id)
            .append_pair("significant_changes", "true");

        let lists: Vec<Vec<StateRecord>> = self.get(url).await?;
        Ok(lists.into_iter().next().unwrap_or_default())
    }

    // ── Plumbing ─────────────────────────────────────────────────────

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Unauthorized;
        }

        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| if raw.is_empty() { status.to_string() } else { raw });

        Error::Http {
            status: status.as_u16(),
            message,
        }
    }
}
