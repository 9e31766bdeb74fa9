//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vrcsync_config::ConfigError;
use vrcsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the multiMATIC API")]
    #[diagnostic(
        code(vrcsync::connection_failed),
        help(
            "{reason}\n\
             Check your network connection, or the api_url of your profile."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed")]
    #[diagnostic(
        code(vrcsync::auth_failed),
        help(
            "Verify the username and password of profile '{profile}'.\n\
             Run: vrcsync config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(vrcsync::no_credentials),
        help(
            "Store one with: vrcsync config set-password --profile {profile}\n\
             Or set the VRCSYNC_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(vrcsync::not_found),
        help("Run: vrcsync {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(vrcsync::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vrcsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vrcsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vrcsync config init --username <USER>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(vrcsync::config))]
    Config(ConfigError),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(vrcsync::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(vrcsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::FacilityNotFound { serial } => CliError::NotFound {
                resource_type: "facility".into(),
                identifier: serial,
                list_command: "facilities".into(),
            },

            CoreError::InvalidPath { path } => CliError::Validation {
                field: "path".into(),
                reason: format!("'{path}' is not a valid dot-separated path"),
            },

            err @ CoreError::OutOfRange { .. } => CliError::Validation {
                field: "temperature".into(),
                reason: err.to_string(),
            },

            CoreError::Api {
                message,
                status: Some(404),
            } => CliError::NotFound {
                resource_type: "resource".into(),
                identifier: message,
                list_command: "facilities".into(),
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ (CoreError::Api { .. }
            | CoreError::MalformedPayload { .. }
            | CoreError::ShutDown) => CliError::ApiError {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliError, exit_code};
    use vrcsync_core::CoreError;

    #[test]
    fn out_of_range_is_a_usage_error() {
        let err: CliError = CoreError::OutOfRange {
            field: "zone setpoint",
            value: 40.0,
            min: 5.0,
            max: 30.0,
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert!(err.to_string().contains("zone setpoint"));
    }

    #[test]
    fn rejected_session_maps_to_auth_exit_code() {
        let err: CliError = CoreError::AuthenticationFailed {
            message: "HTTP 401".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn unknown_facility_points_at_listing() {
        let err: CliError = CoreError::FacilityNotFound {
            serial: "SN9".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }
}
