//! `history`: recorded samples for one sensor.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use haui_core::{HistoryClient, HistoryPoint, HubConfig};

use crate::cli::{GlobalOpts, HistoryArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PointRow {
    #[tabled(rename = "Time")]
    at: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn parse_time(value: &str, field: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| CliError::Validation {
            field: field.into(),
            reason: format!("invalid timestamp '{value}' (use RFC3339)"),
        })
}

pub async fn handle(
    config: HubConfig,
    args: HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity_id = util::parse_entity_id(&args.entity_id)?;
    let client = HistoryClient::new(&config)?;

    let series = match (args.start.as_deref(), args.end.as_deref()) {
        (Some(start), Some(end)) => {
            let start = parse_time(start, "start")?;
            let end = parse_time(end, "end")?;
            if start > end {
                return Err(CliError::Validation {
                    field: "start".into(),
                    reason: "start must be <= end".into(),
                });
            }
            client.between(&entity_id, start, end).await?
        }
        _ => {
            let window = Duration::from_secs(args.hours.saturating_mul(3600));
            client.recent(&entity_id, window).await?
        }
    };

    let unit = series.unit.clone().unwrap_or_default();
    let binary = series.binary;
    let value_text = |p: &HistoryPoint| {
        if binary {
            let label = if p.value > 0.5 { "open/on" } else { "closed/off" };
            label.to_owned()
        } else if unit.is_empty() {
            format!("{}", p.value)
        } else {
            format!("{} {unit}", p.value)
        }
    };

    let out = match global.output {
        // The whole series, with its metadata.
        OutputFormat::Json => output::render_json_pretty(&series),
        OutputFormat::JsonCompact => output::render_json_compact(&series),
        OutputFormat::Yaml => output::render_yaml(&series),
        _ => output::render_list(
            &global.output,
            &series.points,
            |p| PointRow {
                at: p.at.to_rfc3339(),
                value: value_text(p),
            },
            |p| format!("{} {}", p.at.to_rfc3339(), p.value),
        ),
    };
    if series.is_empty() && !global.quiet {
        eprintln!("No history recorded for {entity_id} in this window");
    }
    output::print_output(&out, global.quiet);
    Ok(())
}
