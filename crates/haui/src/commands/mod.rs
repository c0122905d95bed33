//! Command dispatch: bridges CLI args -> core client -> output formatting.

pub mod call;
pub mod config_cmd;
pub mod get;
pub mod history;
pub mod states;
pub mod util;
pub mod watch;

use haui_core::HubConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a hub-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: HubConfig,
    profile: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::States(args) => states::handle(config, profile, args, global).await,
        Command::Get(args) => get::handle(config, args, global).await,
        Command::Call(args) => call::handle(config, profile, args, global).await,
        Command::Watch(args) => watch::handle(config, profile, args, global).await,
        Command::History(args) => history::handle(config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
