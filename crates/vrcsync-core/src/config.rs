// ── Runtime engine configuration ──
//
// These types describe *how* the bridge talks to the cloud and how often.
// They carry credential data and tuning, but never touch disk.
// The CLI (via `vrcsync-config`) constructs a `BridgeConfig` and hands it in.

use std::time::Duration;

use url::Url;
use vrcsync_api::{Credentials, TlsMode};

/// Polling is never faster than this; the cloud rate-limits aggressively.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);
/// Data older than this is reported as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(600_000);
/// Write queue debounce window.
pub const DEFAULT_WRITE_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_CONCURRENT_FACILITIES: usize = 4;

/// Configuration for one account.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// API root (defaults to [`vrcsync_api::routes::BASE_URL`]).
    pub base_url: Url,
    pub credentials: Credentials,
    pub tls: TlsMode,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Delay between poll cycles. Use [`BridgeConfig::with_poll_interval`]
    /// to get the lower bound applied.
    pub poll_interval: Duration,
    /// Staleness threshold for [`SnapshotMeta::stale`](crate::SnapshotMeta).
    pub stale_after: Duration,
    pub write_debounce: Duration,
    /// How many facilities are fetched concurrently within one tick.
    pub max_concurrent_facilities: usize,
}

impl BridgeConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            base_url: default_base_url(),
            credentials,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
            write_debounce: DEFAULT_WRITE_DEBOUNCE,
            max_concurrent_facilities: DEFAULT_MAX_CONCURRENT_FACILITIES,
        }
    }

    /// Set the poll interval, clamped to [`MIN_POLL_INTERVAL`].
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = clamp_poll_interval(interval);
        self
    }
}

/// Apply the polling lower bound.
pub fn clamp_poll_interval(interval: Duration) -> Duration {
    interval.max(MIN_POLL_INTERVAL)
}

fn default_base_url() -> Url {
    // Compile-time constant; parsing cannot fail.
    Url::parse(vrcsync_api::routes::BASE_URL).unwrap_or_else(|_| unreachable!())
}
