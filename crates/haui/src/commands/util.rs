//! Shared helpers for command handlers: live connection setup and waiting
//! on hub events with a deadline.

use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use haui_core::{EntityId, HubClient, HubConfig, HubEvent};

use crate::error::CliError;

/// An authenticated hub session plus its event stream.
pub struct Live {
    pub client: HubClient,
    pub events: UnboundedReceiver<HubEvent>,
    timeout: Duration,
}

impl Live {
    /// Open a session and wait until the hub accepts the token.
    pub async fn connect(config: HubConfig, profile: &str) -> Result<Self, CliError> {
        let url = config.ws_url.to_string();
        let timeout = config.timeout;
        let client = HubClient::new(config);
        let events = client.take_events().ok_or_else(|| CliError::ConnectionFailed {
            url: url.clone(),
            reason: "event channel unavailable".into(),
        })?;

        let mut live = Self {
            client,
            events,
            timeout,
        };
        live.client.connect();

        let result = live
            .wait_for(|event| match event {
                HubEvent::Authenticated => Some(Ok(())),
                HubEvent::AuthRejected { message } => Some(Err(CliError::AuthFailed {
                    profile: profile.to_owned(),
                    message,
                })),
                HubEvent::Disconnected => Some(Err(CliError::ConnectionFailed {
                    url: url.clone(),
                    reason: "connection closed before authentication".into(),
                })),
                _ => None,
            })
            .await;

        match result {
            Ok(()) => {
                debug!("authenticated");
                Ok(live)
            }
            Err(e) => {
                live.client.shutdown();
                Err(e)
            }
        }
    }

    /// Wait for the initial snapshot. Returns the number of entities.
    pub async fn wait_for_snapshot(&mut self) -> Result<usize, CliError> {
        self.wait_for(|event| match event {
            HubEvent::SnapshotApplied { count } => Some(Ok(count)),
            HubEvent::Disconnected => Some(Err(CliError::from(haui_core::CoreError::Disconnected))),
            _ => None,
        })
        .await
    }

    /// Wait for the result of service call `id`.
    pub async fn wait_for_call(&mut self, id: u64) -> Result<(), CliError> {
        self.wait_for(|event| match event {
            HubEvent::CommandCompleted { id: done } if done == id => Some(Ok(())),
            HubEvent::CommandFailed {
                id: failed,
                code,
                message,
            } if failed == id => Some(Err(CliError::Rejected {
                code: code.unwrap_or_else(|| "unknown_error".into()),
                message,
            })),
            HubEvent::Disconnected => Some(Err(CliError::from(haui_core::CoreError::Disconnected))),
            _ => None,
        })
        .await
    }

    /// Consume events until `pick` yields a result or the timeout elapses.
    async fn wait_for<T>(
        &mut self,
        mut pick: impl FnMut(HubEvent) -> Option<Result<T, CliError>>,
    ) -> Result<T, CliError> {
        let events = &mut self.events;
        let wait = async {
            while let Some(event) = events.recv().await {
                if let Some(result) = pick(event) {
                    return result;
                }
            }
            Err(CliError::from(haui_core::CoreError::Disconnected))
        };

        tokio::time::timeout(self.timeout, wait)
            .await
            .map_err(|_| CliError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
    }

    pub fn close(&self) {
        self.client.shutdown();
    }
}

/// Parse a user-supplied entity id.
pub fn parse_entity_id(raw: &str) -> Result<EntityId, CliError> {
    raw.parse::<EntityId>().map_err(|e| CliError::Validation {
        field: "entity_id".into(),
        reason: e.to_string(),
    })
}

/// Build service data from `--data` JSON or repeated `--set key=value`.
///
/// Values in `key=value` pairs are parsed as JSON when possible
/// (`brightness=120` is a number), otherwise taken as strings.
pub fn service_data(data: Option<&str>, pairs: &[String]) -> Result<Map<String, Value>, CliError> {
    if let Some(raw) = data {
        return match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(map),
            other => Err(CliError::Validation {
                field: "data".into(),
                reason: format!("expected a JSON object, got {other}"),
            }),
        };
    }

    let mut map = Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| CliError::Validation {
            field: "set".into(),
            reason: format!("expected KEY=VALUE, got '{pair}'"),
        })?;
        let value =
            serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.into()));
        map.insert(key.trim().to_owned(), value);
    }
    Ok(map)
}
