//! `watch`: stream state changes until interrupted.

use std::collections::HashSet;

use chrono::Local;
use serde::Serialize;
use tracing::info;

use haui_core::{Domain, EntityId, EntityState, HubConfig, HubEvent};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, Live};

#[derive(Serialize)]
struct ChangeLine<'a> {
    at: String,
    entity_id: &'a EntityId,
    #[serde(flatten)]
    state: &'a EntityState,
}

/// Which entities the user asked to see.
struct Filter {
    ids: HashSet<EntityId>,
    domain: Option<Domain>,
}

impl Filter {
    fn matches(&self, entity_id: &EntityId) -> bool {
        (self.ids.is_empty() || self.ids.contains(entity_id))
            && self.domain.as_ref().is_none_or(|d| &entity_id.domain() == d)
    }
}

fn render(line: &ChangeLine<'_>, format: &OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(line),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(line)),
        OutputFormat::Plain => format!("{} {}", line.entity_id, line.state.state),
        OutputFormat::Table => {
            let value = match line.state.unit() {
                Some(unit) => format!("{} {unit}", line.state.state),
                None => line.state.state.clone(),
            };
            format!(
                "{}  {}  {}",
                line.at,
                output::accent(line.entity_id.as_str(), color),
                output::paint_state(&value, color)
            )
        }
    }
}

pub async fn handle(
    config: HubConfig,
    profile: &str,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter = Filter {
        ids: args
            .entity_ids
            .iter()
            .map(|raw| util::parse_entity_id(raw))
            .collect::<Result<_, _>>()?,
        domain: args.domain.as_deref().map(Domain::from),
    };
    let color = output::should_color(&global.color);

    let mut live = Live::connect(config, profile).await?;
    // Everything before the snapshot completes is the initial state.
    let mut in_snapshot = !args.initial;

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = live.events.recv() => event,
        };
        let Some(event) = event else { break };

        match event {
            HubEvent::StateChanged { entity_id, state } => {
                if in_snapshot || !filter.matches(&entity_id) {
                    continue;
                }
                let line = ChangeLine {
                    at: Local::now().format("%H:%M:%S").to_string(),
                    entity_id: &entity_id,
                    state: &state,
                };
                output::print_output(&render(&line, &global.output, color), global.quiet);
            }
            HubEvent::SnapshotApplied { count } => {
                info!(count, "watching for changes");
                in_snapshot = false;
            }
            HubEvent::Disconnected => eprintln!("⚠ disconnected, retrying"),
            HubEvent::Authenticated => {
                // Resync after a reconnect; skip the repeated snapshot.
                in_snapshot = !args.initial;
            }
            HubEvent::AuthRejected { message } => {
                live.close();
                return Err(CliError::AuthFailed {
                    profile: profile.to_owned(),
                    message,
                });
            }
            _ => {}
        }
    }

    live.close();
    Ok(())
}
