// ── Runtime connection configuration ──
//
// Describes how to reach one hub. Built by the CLI/panel from the config
// file and handed to `HubClient`; core never reads config files.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Delay between a disconnect and the single reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Quiet period before a slider value is sent.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// HTTP request timeout for the REST endpoints.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to a single hub.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// HTTP base URL (e.g. `http://homeassistant.local:8123`).
    pub url: Url,
    /// WebSocket endpoint, normally derived from `url`.
    pub ws_url: Url,
    /// Long-lived access token.
    pub token: SecretString,
    pub timeout: Duration,
    pub reconnect_delay: Duration,
    pub debounce: Duration,
}

impl HubConfig {
    /// Config with default timings and a WebSocket URL derived from `url`.
    pub fn new(url: Url, token: SecretString) -> Result<Self, CoreError> {
        let ws_url = websocket_url(&url)?;
        Ok(Self {
            url,
            ws_url,
            token,
            timeout: DEFAULT_TIMEOUT,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            debounce: DEFAULT_DEBOUNCE,
        })
    }
}

/// Derive the WebSocket endpoint from the hub's HTTP URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, and the path becomes
/// `<base path>/api/websocket`. A `ws`/`wss` URL that already names the
/// endpoint is returned unchanged.
pub fn websocket_url(base: &Url) -> Result<Url, CoreError> {
    let scheme = match base.scheme() {
        "http" => "ws",
        "https" => "wss",
        "ws" | "wss" if base.path().ends_with("/api/websocket") => return Ok(base.clone()),
        "ws" | "wss" => base.scheme(),
        other => {
            return Err(CoreError::Config {
                message: format!("unsupported URL scheme {other:?} (expected http or https)"),
            });
        }
    };

    let mut url = base.clone();
    url.set_scheme(scheme).map_err(|()| CoreError::Config {
        message: format!("cannot derive WebSocket URL from {base}"),
    })?;
    let path = format!("{}/api/websocket", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
