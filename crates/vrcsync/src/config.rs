//! CLI-side profile resolution.
//!
//! Loads the shared configuration through `vrcsync-config` and layers
//! command-line flags over the selected profile.

use std::time::Duration;

use vrcsync_config::{Config, Profile};
use vrcsync_core::{BridgeConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use vrcsync_config::{
    config_path, load_config, load_config_or_default, save_config, store_password,
};

/// Determine the active profile name: `--profile`, then the config default.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| cfg.default_profile_name().to_owned())
}

/// Comma-separated, sorted profile names for help text.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}

/// Build a `BridgeConfig` from the config file, active profile, and flags.
pub fn build_bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = cfg
        .profiles
        .get(&profile_name)
        .ok_or_else(|| CliError::ProfileNotFound {
            name: profile_name.clone(),
            available: available_profiles(&cfg),
        })?;

    resolve_profile(profile, &profile_name, &cfg, global)
}

/// Apply flag overrides on top of a resolved profile.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<BridgeConfig, CliError> {
    let mut config =
        vrcsync_config::profile_to_bridge_config(profile, profile_name, &cfg.defaults)?;

    if let Some(ref raw) = global.api_url {
        config.base_url = raw.parse().map_err(|_| CliError::Validation {
            field: "api-url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    }
    if global.insecure {
        config.tls = TlsMode::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }

    Ok(config)
}
