//! Snapshot subsystem.
//!
//! The normalize/denormalize pipeline turning a host's live children into a
//! portable declarative representation and back, the signed export envelope
//! that moves snapshots across environments, and the restore workflow that
//! applies one onto a live host.

pub mod codec;
pub mod codecs;
pub mod registry;
pub mod restore;
pub mod service;

pub use codec::{Codec, DEFAULT_VERSION, DenormalizedBlock, VERSION_FORMAT, Violation};
pub use codecs::{GalleryCodec, TextCodec};
pub use registry::CodecRegistry;
pub use restore::{RestoreOrchestrator, RestoreOutcome, RestoreRequest};
pub use service::SnapshotService;
