//! Data models for containers, content blocks, hosts, and snapshots.

pub mod block;
pub mod container;
pub mod host;
pub mod snapshot;
pub mod snapshot_log;

pub use block::ContentBlock;
pub use container::Container;
pub use host::HostEntity;
pub use snapshot::{BlobRecord, BlockMetadata, Snapshot, SnapshotFields};
pub use snapshot_log::SnapshotLog;
