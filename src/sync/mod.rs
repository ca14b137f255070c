pub mod snapshot;
pub mod sync_loop;

pub use snapshot::{EntropyHistory, EntropyPoint, SharedSnapshot, SnapshotSources, SyncSnapshot};
pub use sync_loop::{CycleReport, SyncHandle, SyncLoop};
