//! `haui-panel`: touchscreen control panel for a home-automation hub.
//!
//! Renders the widget groups of a layout file with ratatui and keeps them
//! live through `haui-core`'s [`HubClient`]. Mouse capture turns taps and
//! drags on a touchscreen into control input.
//!
//! Logs go to a file (default `/tmp/haui-panel.log`) so they never corrupt
//! the terminal UI.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use haui_config::Layout;
use haui_core::{HistoryClient, HubClient};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

/// Touchscreen control panel for a home-automation hub.
#[derive(Parser, Debug)]
#[command(name = "haui-panel", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "HAUI_PROFILE")]
    profile: Option<String>,

    /// Layout file (overrides the profile's `layout`)
    #[arg(short = 'l', long)]
    layout: Option<PathBuf>,

    /// Hide the status bar (kiosk mode)
    #[arg(long)]
    fullscreen: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/haui-panel.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout belongs to the terminal UI. The returned
/// guard must live until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("haui_panel={log_level},haui_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("haui-panel.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let cfg = haui_config::load_config()
        .wrap_err("could not load config; run `haui config init` first")?;
    let (profile_name, profile) = cfg
        .profile(cli.profile.as_deref())
        .wrap_err("no usable profile; run `haui config init` or pass --profile")?;
    let hub_config = haui_config::profile_to_hub_config(profile, &profile_name, &cfg.defaults)
        .wrap_err_with(|| format!("profile '{profile_name}' is incomplete"))?;

    let layout = match cli.layout.as_deref().or(profile.layout.as_deref()) {
        Some(path) => haui_config::load_layout(path)
            .wrap_err_with(|| format!("could not load layout {}", path.display()))?,
        None => {
            warn!(profile = %profile_name, "no layout configured");
            Layout::default()
        }
    };

    let history = match HistoryClient::new(&hub_config) {
        Ok(history) => Some(history),
        Err(e) => {
            warn!(error = %e, "history charts disabled");
            None
        }
    };

    info!(
        profile = %profile_name,
        url = %hub_config.url,
        groups = layout.groups.len(),
        "starting haui-panel"
    );

    let fullscreen = cli.fullscreen || profile.fullscreen;
    let mut app = App::new(HubClient::new(hub_config), history, layout, fullscreen);
    app.run().await
}
