//! Config subcommand handlers.

use secrecy::SecretString;
use tabled::Tabled;

use vrcsync_config::{Config, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "poll_interval = {}", cfg.defaults.poll_interval);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "username = \"{}\"", p.username);
        let _ = writeln!(out, "device_id = \"{}\"", p.device_id);
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if let Some(ref url) = p.api_url {
            let _ = writeln!(out, "api_url = \"{url}\"");
        }
        if let Some(secs) = p.poll_interval {
            let _ = writeln!(out, "poll_interval = {secs}");
        }
        if let Some(ms) = p.stale_after_ms {
            let _ = writeln!(out, "stale_after_ms = {ms}");
        }
        if let Some(ms) = p.debounce_ms {
            let _ = writeln!(out, "debounce_ms = {ms}");
        }
        if let Some(n) = p.max_concurrent_facilities {
            let _ = writeln!(out, "max_concurrent_facilities = {n}");
        }
        if let Some(secs) = p.timeout {
            let _ = writeln!(out, "timeout = {secs}");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
    }

    out.trim_end().to_owned()
}

#[derive(Clone, Tabled, serde::Serialize)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Device")]
    device_id: String,
    #[tabled(rename = "Default")]
    default: bool,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            name,
            username,
            device_id,
            default,
        } => {
            if username.is_empty() || device_id.is_empty() {
                return Err(CliError::Validation {
                    field: "profile".into(),
                    reason: "username and device id cannot be empty".into(),
                });
            }

            let mut cfg = config::load_config_or_default();
            let profile = cfg.profiles.entry(name.clone()).or_insert_with(Profile::default);
            profile.username = username;
            profile.device_id = device_id;
            if default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Profile '{name}' written to {}", path.display());
                eprintln!("Store its password with: vrcsync config set-password --profile {name}");
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(&format_config_redacted(&cfg), global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile_name().to_owned();
            let mut rows: Vec<ProfileRow> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileRow {
                    name: name.clone(),
                    username: p.username.clone(),
                    device_id: p.device_id.clone(),
                    default: *name == default,
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let out = output::render_list(
                &global.output,
                &rows,
                Clone::clone,
                |r| r.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }

            let password = rpassword::prompt_password(format!("Password for '{name}': "))?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&name, &SecretString::from(password))?;
            if !global.quiet {
                eprintln!("Password for '{name}' stored in system keyring");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use vrcsync_config::{Config, Profile};

    use super::format_config_redacted;

    #[test]
    fn show_masks_plaintext_password() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "home".into(),
            Profile {
                username: "alice".into(),
                device_id: "laptop".into(),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );

        let out = format_config_redacted(&cfg);
        assert!(out.contains("[profiles.home]"));
        assert!(out.contains("password = \"****\""));
        assert!(!out.contains("hunter2"));
    }
}
