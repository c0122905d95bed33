// ── Sensor history ──
//
// Thin service over the REST client: fetch an entity's current attributes
// (to decide how it is charted) and its recorded history.

use std::time::Duration;

use chrono::{DateTime, Utc};
use haui_api::{RestClient, StateRecord};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::HubConfig;
use crate::error::CoreError;
use crate::model::{EntityId, HistorySeries};

/// How far back the chart looks by default.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(6 * 60 * 60);

/// How often an open chart refreshes.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Reads entity metadata and history over HTTP.
pub struct HistoryClient {
    rest: RestClient,
}

impl HistoryClient {
    pub fn new(config: &HubConfig) -> Result<Self, CoreError> {
        let token = SecretString::from(config.token.expose_secret().to_owned());
        let rest = RestClient::new(config.url.as_str(), token, config.timeout)?;
        Ok(Self { rest })
    }

    /// Current state of one entity.
    pub async fn entity(&self, entity_id: &EntityId) -> Result<StateRecord, CoreError> {
        self.rest.entity_state(entity_id.as_str()).await.map_err(|e| {
            if e.is_not_found() {
                CoreError::EntityNotFound {
                    entity_id: entity_id.to_string(),
                }
            } else {
                e.into()
            }
        })
    }

    /// Series covering `window` up to now.
    pub async fn recent(
        &self,
        entity_id: &EntityId,
        window: Duration,
    ) -> Result<HistorySeries, CoreError> {
        let end = Utc::now();
        let span = chrono::Duration::from_std(window).map_err(|e| CoreError::InvalidValue {
            message: format!("history window out of range: {e}"),
        })?;
        self.between(entity_id, end - span, end).await
    }

    /// Series between two instants.
    pub async fn between(
        &self,
        entity_id: &EntityId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistorySeries, CoreError> {
        let current = self.entity(entity_id).await?;
        let rows = self.rest.history(entity_id.as_str(), start, end).await?;
        debug!(%entity_id, rows = rows.len(), "fetched history");

        Ok(HistorySeries::from_rows(
            entity_id.clone(),
            &current.attributes,
            &rows,
        ))
    }
}
