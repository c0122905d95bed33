// ── Core error types ──
//
// User-facing errors from haui-core. Consumers never see raw HTTP codes
// or JSON parse failures; `From<haui_api::Error>` translates them.

use thiserror::Error;

use crate::model::InvalidEntityId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to hub: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected to hub")]
    Disconnected,

    #[error("Timed out after {timeout_secs}s waiting for the hub")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    #[error(transparent)]
    InvalidEntityId(#[from] InvalidEntityId),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Command rejected by hub: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<haui_api::Error> for CoreError {
    fn from(err: haui_api::Error) -> Self {
        match err {
            haui_api::Error::Unauthorized => CoreError::AuthenticationFailed {
                message: "access token rejected".into(),
            },
            haui_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                CoreError::ConnectionFailed {
                    reason: err.to_string(),
                }
            }
            haui_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed { reason },
            haui_api::Error::WebSocketSend(_) => CoreError::Disconnected,
            haui_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid hub URL: {e}"),
            },
            haui_api::Error::Serialization(e) => CoreError::InvalidValue {
                message: format!("request could not be encoded: {e}"),
            },
            haui_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            other => CoreError::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}
