// Domain model: facilities, snapshots and the paths that address them.

pub mod facility;
pub mod mode;
pub mod path;
pub mod snapshot;

pub use facility::{Facility, FacilityDescription};
pub use mode::{DhwMode, ZoneMode};
pub use path::FieldPath;
pub use snapshot::{Snapshot, SnapshotMeta};
