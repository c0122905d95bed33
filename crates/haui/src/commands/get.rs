//! `get`: one entity's current state over REST.

use haui_core::{HistoryClient, HubConfig, StateRecord};

use crate::cli::{GetArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(record: &StateRecord, color: bool) -> String {
    let mut lines = vec![
        format!(
            "Entity:       {}",
            output::accent(record.entity_id.as_deref().unwrap_or("-"), color)
        ),
        format!("State:        {}", output::paint_state(&record.state, color)),
        format!(
            "Last changed: {}",
            record
                .last_changed
                .map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
        format!(
            "Last updated: {}",
            record
                .last_updated
                .map_or_else(|| "-".into(), |t| t.to_rfc3339())
        ),
    ];

    if !record.attributes.is_empty() {
        lines.push("Attributes:".into());
        let mut attrs: Vec<_> = record.attributes.iter().collect();
        attrs.sort_by_key(|(key, _)| *key);
        for (key, value) in attrs {
            lines.push(format!("  {key}: {value}"));
        }
    }
    lines.join("\n")
}

pub async fn handle(config: HubConfig, args: GetArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let entity_id = util::parse_entity_id(&args.entity_id)?;
    let client = HistoryClient::new(&config)?;
    let record = client.entity(&entity_id).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &record,
        |r| detail(r, color),
        |r| r.state.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
