// ── Core error types ──
//
// Errors surfaced by the synchronization engine. Consumers never see raw
// reqwest errors or JSON parse failures; the `From<vrcsync_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the multiMATIC API: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Facility not found: {serial}")]
    FacilityNotFound { serial: String },

    #[error("Malformed {resource} payload: {message}")]
    MalformedPayload { resource: String, message: String },

    #[error("Invalid field path '{path}'")]
    InvalidPath { path: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Bridge is shut down")]
    ShutDown,
}

impl CoreError {
    /// `true` when the failure came from a rejected or expired session.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// `true` for failures that a later poll may not see again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout => true,
            Self::Api { status, .. } => status.is_none_or(|s| s >= 500 || s == 429),
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vrcsync_api::Error> for CoreError {
    fn from(err: vrcsync_api::Error) -> Self {
        match err {
            vrcsync_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vrcsync_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            vrcsync_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vrcsync_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                reason: format!("TLS error: {msg}"),
            },
            vrcsync_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            vrcsync_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedPayload {
                    resource: "response".into(),
                    message,
                }
            }
        }
    }
}
