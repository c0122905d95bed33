//! CLI configuration: thin wrapper around `haui_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--hub, --token, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use haui_core::HubConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use haui_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build a `HubConfig` from the config file, profile, and CLI overrides.
///
/// CLI flags take priority over profile values. Without a profile, `--hub`
/// and `--token` alone are enough.
pub fn resolve_hub_config(global: &GlobalOpts) -> Result<(String, HubConfig), CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(p) => p.clone(),
        None if global.hub.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // 1. Hub URL (flag > env > profile)
    if let Some(ref hub) = global.hub {
        profile.hub.clone_from(hub);
    }

    // 2. Token (flag > profile chain)
    let token = match global.token {
        Some(ref t) => SecretString::from(t.clone()),
        None => haui_config::resolve_token(&profile, &profile_name)?,
    };

    let mut config = haui_config::hub_config_with_token(&profile, &cfg.defaults, token)?;

    // 3. Timeout
    config.timeout = Duration::from_secs(global.timeout);

    Ok((profile_name, config))
}
