#![allow(clippy::unwrap_used)]
// Loading, saving and translating configuration profiles.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use vrcsync_config::{
    Config, ConfigError, Defaults, Profile, build_bridge_config, load_config_from, save_config_to,
};
use vrcsync_core::TlsMode;

fn profile() -> Profile {
    Profile {
        username: "alice".into(),
        device_id: "vrcsync-laptop".into(),
        ..Profile::default()
    }
}

fn secret() -> SecretString {
    SecretString::from("s3cret".to_owned())
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.default_profile_name(), "default");
    assert_eq!(cfg.defaults.poll_interval, 300);
    assert_eq!(cfg.defaults.timeout, 30);
    assert!(cfg.profiles.is_empty());
}

#[test]
fn profiles_round_trip_through_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    let mut home = profile();
    home.poll_interval = Some(120);
    home.debounce_ms = Some(750);
    cfg.profiles.insert("home".into(), home);
    cfg.default_profile = Some("home".into());
    save_config_to(&cfg, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (name, home) = loaded.profile(None).unwrap();
    assert_eq!(name, "home");
    assert_eq!(home.username, "alice");
    assert_eq!(home.poll_interval, Some(120));
    assert_eq!(home.debounce_ms, Some(750));
    assert_eq!(home.password, None);
}

#[test]
fn unknown_profile_is_an_error() {
    let cfg = Config::default();
    assert!(matches!(
        cfg.profile(Some("cabin")),
        Err(ConfigError::UnknownProfile { .. })
    ));
}

#[test]
fn bridge_config_clamps_poll_interval() {
    let mut p = profile();
    p.poll_interval = Some(5);

    let cfg = build_bridge_config(&p, &Defaults::default(), secret()).unwrap();
    assert_eq!(cfg.poll_interval, Duration::from_secs(30));
    assert_eq!(cfg.credentials.username, "alice");
    assert_eq!(cfg.credentials.device_id, "vrcsync-laptop");
    assert_eq!(cfg.credentials.password.expose_secret(), "s3cret");
}

#[test]
fn bridge_config_applies_overrides() {
    let mut p = profile();
    p.api_url = Some("http://127.0.0.1:9999/api/".into());
    p.stale_after_ms = Some(60_000);
    p.debounce_ms = Some(100);
    p.timeout = Some(5);
    p.insecure = Some(true);

    let cfg = build_bridge_config(&p, &Defaults::default(), secret()).unwrap();
    assert_eq!(cfg.base_url.as_str(), "http://127.0.0.1:9999/api/");
    assert_eq!(cfg.stale_after, Duration::from_millis(60_000));
    assert_eq!(cfg.write_debounce, Duration::from_millis(100));
    assert_eq!(cfg.timeout, Duration::from_secs(5));
    assert!(matches!(cfg.tls, TlsMode::DangerAcceptInvalid));
    assert_eq!(cfg.poll_interval, Duration::from_secs(300));
}

#[test]
fn bridge_config_rejects_bad_values() {
    let mut p = profile();
    p.api_url = Some("not a url".into());
    assert!(matches!(
        build_bridge_config(&p, &Defaults::default(), secret()),
        Err(ConfigError::Validation { .. })
    ));

    let mut p = profile();
    p.device_id.clear();
    assert!(matches!(
        build_bridge_config(&p, &Defaults::default(), secret()),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn env_overrides_nested_defaults() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                [profiles.default]
                username = "alice"
                device_id = "d1"
            "#,
        )?;
        jail.set_env("VRCSYNC_DEFAULTS__COLOR", "never");

        let cfg = load_config_from(&jail.directory().join("config.toml")).unwrap();
        assert_eq!(cfg.defaults.color, "never");
        assert_eq!(cfg.profile(None).unwrap().1.device_id, "d1");
        Ok(())
    });
}
