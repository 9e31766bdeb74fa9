//! State synchronization engine between the multiMATIC cloud and local
//! consumers.
//!
//! Built on top of `vrcsync-api`, this crate turns raw API reads into
//! normalized per-facility snapshots and change notifications:
//!
//! - **[`Bridge`]**: Facade for one account. Owns the request pipeline,
//!   the poller, the write queue and the subscription registry.
//!   [`start()`](Bridge::start) begins background polling;
//!   [`refresh_once()`](Bridge::refresh_once) runs a single cycle for CLI use.
//!
//! - **[`SnapshotAggregator`]**: Fans out the four facility reads, merges
//!   them, indexes zones and DHW units by id and derives the freshness
//!   [`SnapshotMeta`].
//!
//! - **[`Poller`]**: Fixed-interval loop that diffs each new [`Snapshot`]
//!   against the stored baseline and emits [`SyncEvent`]s.
//!
//! - **[`SubscriptionRegistry`]**: Dispatch table keyed by facility serial
//!   and [`FieldPath`]; observers receive a [`FieldChange`].
//!
//! - **[`WriteQueue`]**: Debounced, coalescing queue for [`WriteIntent`]s.
//!   Writes to the same setting within the debounce window collapse into one.

pub mod aggregate;
pub mod bridge;
pub mod command;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod poller;
pub mod queue;
pub mod store;
pub mod subscription;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use aggregate::SnapshotAggregator;
pub use bridge::Bridge;
pub use command::{Command, Verb, WriteIntent};
pub use config::BridgeConfig;
pub use diff::FieldChange;
pub use error::CoreError;
pub use model::{
    DhwMode, Facility, FacilityDescription, FieldPath, Snapshot, SnapshotMeta, ZoneMode,
};
pub use poller::{CycleSummary, Poller, PollerState, SyncEvent};
pub use queue::{DrainReport, WriteQueue};
pub use store::FacilityStore;
pub use subscription::{Observer, SubscriptionHandle, SubscriptionRegistry};

// Consumers configure credentials and TLS without depending on the API crate.
pub use vrcsync_api::{Credentials, SessionState, TlsMode};
