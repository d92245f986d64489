//! Content block model.
//!
//! A content block is one typed unit of content owned by a host entity. The
//! four structural fields (`parent_id`, `parent_type`, `container`, `weight`)
//! tie it into a container's ordered child list; everything else lives in the
//! JSON field bag, with each snapshot codec owning the explicit list of
//! fields it reads from it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content block record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Child entity type machine name.
    pub entity_type: String,

    /// Bundle machine name.
    pub bundle: String,

    /// Language code.
    pub langcode: String,

    /// Id of the owning host entity, if attached.
    pub parent_id: Option<String>,

    /// Entity type of the owning host entity, if attached.
    pub parent_type: Option<String>,

    /// Id of the container this block lives in, if attached.
    pub container: Option<String>,

    /// Display and restore order; ties resolved by insertion order.
    pub weight: i32,

    /// Unix timestamp when created.
    pub created: i64,

    /// Unix timestamp when last changed.
    pub changed: i64,

    /// Domain field storage.
    pub fields: serde_json::Value,
}

impl ContentBlock {
    /// Create an unattached draft block with empty fields.
    pub fn draft(entity_type: &str, bundle: &str, langcode: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: Uuid::now_v7(),
            entity_type: entity_type.to_string(),
            bundle: bundle.to_string(),
            langcode: langcode.to_string(),
            parent_id: None,
            parent_type: None,
            container: None,
            weight: 0,
            created: now,
            changed: now,
            fields: serde_json::Value::Object(serde_json::Map::new()),
        }
    }

    /// A string field from the field bag, if present.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }

    /// Display label: the block's `title` field when set, otherwise the
    /// bundle name.
    pub fn label(&self) -> String {
        match self.field_str("title") {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.bundle.clone(),
        }
    }
}
