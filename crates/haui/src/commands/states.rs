//! `states`: list every entity from a live snapshot.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;

use haui_core::{Domain, EntityId, EntityState, HubConfig};

use crate::cli::{GlobalOpts, StatesArgs};
use crate::error::CliError;
use crate::output;

use super::util::Live;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Entity")]
    entity_id: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Last changed")]
    last_changed: String,
}

#[derive(Serialize)]
struct StateView<'a> {
    entity_id: &'a EntityId,
    #[serde(flatten)]
    state: &'a EntityState,
}

fn row(view: &StateView<'_>, color: bool) -> StateRow {
    let s = view.state;
    let value = match s.unit() {
        Some(unit) => format!("{} {unit}", s.state),
        None => s.state.clone(),
    };
    StateRow {
        entity_id: view.entity_id.to_string(),
        state: output::paint_state(&value, color),
        name: s.friendly_name().unwrap_or_default().to_owned(),
        last_changed: s.last_changed.clone().unwrap_or_default(),
    }
}

pub async fn handle(
    config: HubConfig,
    profile: &str,
    args: StatesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut live = Live::connect(config, profile).await?;
    let count = live.wait_for_snapshot().await;
    live.close();
    tracing::debug!(?count, "snapshot received");
    count?;

    let cache = live.client.cache();
    let entries: Vec<(EntityId, Arc<EntityState>)> = match args.domain {
        Some(ref domain) => cache.by_domain(&Domain::from(domain.as_str())),
        None => cache.snapshot().as_ref().clone(),
    };

    let views: Vec<StateView<'_>> = entries
        .iter()
        .map(|(entity_id, state)| StateView {
            entity_id,
            state: state.as_ref(),
        })
        .collect();

    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        &views,
        |v| row(v, color),
        |v| v.entity_id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
