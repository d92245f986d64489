//! Host entity reference.
//!
//! Hosts are not owned by this subsystem. They are arbitrary entities from
//! the surrounding system, referenced by (entity type, entity id, language),
//! with just enough surface here for container matching, cache tagging, and
//! teaser display.

use serde::{Deserialize, Serialize};

/// A host entity as seen by this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntity {
    /// Entity type machine name (e.g. "page").
    pub entity_type: String,

    /// Entity id within that type, as an opaque string.
    pub entity_id: String,

    /// Bundle machine name.
    pub bundle: String,

    /// Language code of this record (a translation carries its own).
    pub langcode: String,

    /// Display label.
    pub label: String,
}

impl HostEntity {
    /// Cache tag bumped whenever this host's content changes.
    ///
    /// Also used as the transaction key for host-scoped batch writes.
    pub fn cache_tag(&self) -> String {
        format!("{}:{}", self.entity_type, self.entity_id)
    }
}
