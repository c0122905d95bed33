//! `call`: invoke a service on one entity and wait for the hub's verdict.

use serde::Serialize;

use haui_core::{HubConfig, ServiceCall};

use crate::cli::{CallArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util::{self, Live};

#[derive(Serialize)]
struct CallOutcome {
    id: u64,
    domain: String,
    service: String,
    entity_id: String,
    status: &'static str,
}

pub async fn handle(
    config: HubConfig,
    profile: &str,
    args: CallArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let entity_id = util::parse_entity_id(&args.entity_id)?;
    let data = util::service_data(args.data.as_deref(), &args.set)?;
    let call = ServiceCall {
        domain: args.domain,
        service: args.service,
        entity_id,
        data,
    };

    let mut live = Live::connect(config, profile).await?;
    let Some(id) = live.client.invoke(&call) else {
        live.close();
        return Err(CliError::from(haui_core::CoreError::Disconnected));
    };

    let result = if args.no_wait {
        Ok(())
    } else {
        live.wait_for_call(id).await
    };
    live.close();
    result?;

    let outcome = CallOutcome {
        id,
        domain: call.domain,
        service: call.service,
        entity_id: call.entity_id.to_string(),
        status: if args.no_wait { "sent" } else { "ok" },
    };
    let out = output::render_single(
        &global.output,
        &outcome,
        |o| {
            format!(
                "✓ {}.{} on {} ({})",
                o.domain, o.service, o.entity_id, o.status
            )
        },
        |o| o.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
