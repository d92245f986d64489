//! Snapshot audit log.
//!
//! Append-only: one row per successful restore, recording the operator's
//! stated reason, their identity, the snapshot, and the host it was applied
//! to. Never mutated or deleted by this subsystem.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot log row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotLog {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// The snapshot that was restored.
    pub snapshot_id: Uuid,

    /// The operator's stated reason for restoring.
    pub comment: String,

    /// The operator, if known.
    pub owner_id: Option<Uuid>,

    /// Entity type of the host the snapshot was applied to.
    pub source_entity_type: String,

    /// Entity id of the host the snapshot was applied to.
    pub source_entity_id: String,

    /// Unix timestamp when the restore happened.
    pub created: i64,
}

impl SnapshotLog {
    /// Display label: the reason text, truncated.
    pub fn label(&self) -> String {
        let mut end = 75.min(self.comment.len());
        while !self.comment.is_char_boundary(end) {
            end -= 1;
        }
        if end < self.comment.len() {
            format!("{}…", &self.comment[..end])
        } else {
            self.comment.clone()
        }
    }
}
