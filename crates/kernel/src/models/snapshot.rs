//! Snapshot model and its canonical declarative shape.
//!
//! A snapshot is a versioned point-in-time capture of one host's ordered
//! child set. The payload (`blob`) is stored as a JSON string column but
//! handled as a structured list of records everywhere else; each record
//! pairs codec metadata with the normalized field data.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KernelError, KernelResult};
use crate::models::{Container, HostEntity};

/// Snapshot record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique identifier (UUIDv7).
    pub id: Uuid,

    /// Language this snapshot record itself lives in. Distinct from
    /// `source_langcode`: importing an "nl" snapshot on an "fr" site keeps
    /// `source_langcode = "nl"` while `langcode` becomes "fr".
    pub langcode: String,

    /// Title, required.
    pub title: String,

    /// Free-text comment.
    pub comment: String,

    /// Environment tag of the site that created it (e.g. "production").
    pub environment: String,

    /// Unix timestamp when created.
    pub created: i64,

    /// Owning user, if any.
    pub owner_id: Option<Uuid>,

    /// Language of the host the snapshot was taken from.
    pub source_langcode: String,

    /// Host entity type; None makes this a host-agnostic template.
    pub source_entity_type: Option<String>,

    /// Host entity id; None makes this a host-agnostic template.
    pub source_entity_id: Option<String>,

    /// Container id; None makes this container-agnostic.
    pub container: Option<String>,

    /// Whether this snapshot is flagged active. Always false right after an
    /// import, whatever the exported record claimed.
    pub active: bool,

    /// JSON-encoded list of [`BlobRecord`]s.
    pub blob: String,
}

/// One normalized child record inside a snapshot blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlobRecord {
    #[serde(default)]
    pub metadata: BlockMetadata,

    /// The codec's normalized field map, minus identity and structural
    /// fields (those are stripped before storage and re-injected on
    /// denormalize).
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Codec metadata wrapped around each blob record.
///
/// Key names are wire format: changing them breaks every existing export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Codec version as a unix timestamp.
    #[serde(rename = "builder_version", default)]
    pub codec_version: i64,

    /// Codec version as its human-readable calendar form.
    #[serde(rename = "builder_version_human", default)]
    pub codec_version_human: String,

    #[serde(rename = "entityTypeId", default)]
    pub entity_type_id: String,

    #[serde(default)]
    pub bundle: String,

    /// Original entity id, informational only.
    #[serde(rename = "entityId", default)]
    pub entity_id: String,

    /// Original entity uuid, informational only.
    #[serde(default)]
    pub uuid: String,

    /// Codec-specific extra metadata.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The canonical declarative shape of a snapshot, as exported and imported.
///
/// Field names and types are wire format. `Snapshot::from_fields` tolerates
/// and defaults every optional key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFields {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub comment: String,

    #[serde(default)]
    pub environment: String,

    #[serde(default)]
    pub created: Option<i64>,

    #[serde(default)]
    pub blob: Vec<BlobRecord>,

    #[serde(default)]
    pub user_id: Option<Uuid>,

    #[serde(default)]
    pub source_langcode: Option<String>,

    #[serde(default)]
    pub source_entity_type: Option<String>,

    #[serde(default)]
    pub source_entity_id: Option<String>,

    #[serde(default)]
    pub container: Option<String>,

    #[serde(default)]
    pub active: bool,
}

impl Snapshot {
    /// The snapshot's display label.
    pub fn label(&self) -> &str {
        &self.title
    }

    /// Decode the blob column. An empty or absent blob is an empty list;
    /// a malformed one is a data-integrity error.
    pub fn blob(&self) -> KernelResult<Vec<BlobRecord>> {
        if self.blob.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.blob)
            .map_err(|e| KernelError::DataIntegrity(format!("malformed snapshot blob: {e}")))
    }

    /// The canonical declarative shape used for export and import.
    pub fn to_fields(&self) -> KernelResult<SnapshotFields> {
        Ok(SnapshotFields {
            title: self.title.clone(),
            comment: self.comment.clone(),
            environment: self.environment.clone(),
            created: Some(self.created),
            blob: self.blob()?,
            user_id: self.owner_id,
            source_langcode: Some(self.source_langcode.clone()),
            source_entity_type: self.source_entity_type.clone(),
            source_entity_id: self.source_entity_id.clone(),
            container: self.container.clone(),
            active: self.active,
        })
    }

    /// Build a snapshot from its declarative shape.
    ///
    /// Every optional key is defaulted: missing `created` becomes now,
    /// missing `source_langcode` becomes the current request language, and
    /// `active` is forced off regardless of the input.
    pub fn from_fields(fields: SnapshotFields, langcode: &str) -> KernelResult<Self> {
        let blob = serde_json::to_string(&fields.blob)?;

        Ok(Self {
            id: Uuid::now_v7(),
            langcode: langcode.to_string(),
            title: fields.title,
            comment: fields.comment,
            environment: fields.environment,
            created: fields.created.unwrap_or_else(|| Utc::now().timestamp()),
            owner_id: fields.user_id,
            source_langcode: fields.source_langcode.unwrap_or_else(|| langcode.to_string()),
            source_entity_type: fields.source_entity_type.filter(|s| !s.is_empty()),
            source_entity_id: fields.source_entity_id.filter(|s| !s.is_empty()),
            container: fields.container.filter(|s| !s.is_empty()),
            active: false,
            blob,
        })
    }

    /// Point this snapshot at a host.
    ///
    /// `source_langcode` is deliberately left alone: it records the language
    /// of the host the snapshot was originally taken from, not the host it
    /// is later assigned to.
    pub fn set_host(&mut self, host: &HostEntity) -> &mut Self {
        self.source_entity_type = Some(host.entity_type.clone());
        self.source_entity_id = Some(host.entity_id.clone());
        self
    }

    /// Point this snapshot at a container.
    pub fn set_container(&mut self, container: &Container) -> &mut Self {
        self.container = Some(container.id.clone());
        self
    }

    /// Flag or unflag this snapshot as active.
    pub fn set_active(&mut self, active: bool) -> &mut Self {
        self.active = active;
        self
    }

    /// Whether this snapshot references a host at all.
    pub fn has_host(&self) -> bool {
        self.source_entity_type.as_deref().is_some_and(|s| !s.is_empty())
            && self.source_entity_id.as_deref().is_some_and(|s| !s.is_empty())
    }
}
