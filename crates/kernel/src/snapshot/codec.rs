//! Snapshot codec contract.
//!
//! A codec converts one content block to and from its declarative record.
//! One codec is registered per (entity type, bundle) pair; a pair without a
//! codec is simply not snapshot-capable.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::models::ContentBlock;

/// Placeholder version every codec starts from. Registration rejects it:
/// authors must bump the version whenever the normalize/denormalize contract
/// changes, so imports can tell which contract wrote a record.
pub const DEFAULT_VERSION: &str = "1970/01/01 00:00";

/// Calendar format codec versions are written in.
pub const VERSION_FORMAT: &str = "%Y/%m/%d %H:%M";

/// One field-level problem found while denormalizing.
///
/// Violations are reporting data, never errors: they are shown to the
/// operator, who may still choose to proceed row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A draft block rebuilt from a declarative record, with whatever problems
/// were found along the way. A partially invalid draft is still returned so
/// the operator can see what is wrong before deciding to save.
#[derive(Debug, Clone)]
pub struct DenormalizedBlock {
    pub block: ContentBlock,
    pub violations: Vec<Violation>,
}

/// Per-(entity type, bundle) snapshot codec.
///
/// Codecs may read related entities to resolve references but never write;
/// persistence is the caller's responsibility. Everything a codec exports
/// must be a deep, JSON-safe plain structure referencing other entities by
/// opaque identifiers only.
#[async_trait]
pub trait Codec: Send + Sync {
    /// Entity type this codec handles.
    fn entity_type_id(&self) -> &str;

    /// Bundle this codec handles.
    fn bundle(&self) -> &str;

    /// Declared version, a [`VERSION_FORMAT`] calendar string.
    fn version_str(&self) -> &str {
        DEFAULT_VERSION
    }

    /// Registry key: `entity_type.bundle`.
    fn key(&self) -> String {
        format!("{}.{}", self.entity_type_id(), self.bundle())
    }

    /// Parsed version. Rejects the placeholder: registering a codec that
    /// never declared its own version is a deployment defect, caught at
    /// startup rather than in someone's import.
    fn version(&self) -> KernelResult<NaiveDateTime> {
        if self.version_str() == DEFAULT_VERSION {
            return Err(KernelError::Configuration(format!(
                "the version of codec `{}` is still the default value, please update it",
                self.key()
            )));
        }
        NaiveDateTime::parse_from_str(self.version_str(), VERSION_FORMAT).map_err(|e| {
            KernelError::Configuration(format!(
                "codec `{}` declares unparseable version `{}`: {e}",
                self.key(),
                self.version_str()
            ))
        })
    }

    /// Turn a live block into its declarative field map. Must carry every
    /// field needed to reconstruct the block.
    async fn normalize(
        &self,
        block: &ContentBlock,
    ) -> KernelResult<serde_json::Map<String, serde_json::Value>>;

    /// Rebuild a draft block from a declarative field map, localized to
    /// `target_langcode`. `source_langcode` is the language the record was
    /// captured in and need not match the target.
    async fn denormalize(
        &self,
        data: &serde_json::Map<String, serde_json::Value>,
        source_langcode: &str,
        target_langcode: &str,
    ) -> KernelResult<DenormalizedBlock>;

    /// Codec-specific extra metadata stored next to each record. Optional.
    fn metadata(&self, _block: &ContentBlock) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }
}

/// Build a draft block from the structural keys the snapshot service
/// re-injects into the data map before denormalization.
pub fn structural_draft(
    entity_type: &str,
    bundle: &str,
    data: &serde_json::Map<String, serde_json::Value>,
    langcode: &str,
) -> ContentBlock {
    let mut block = ContentBlock::draft(entity_type, bundle, langcode);
    block.parent_id = data
        .get("parent_id")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    block.parent_type = data
        .get("parent_type")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    block.container = data
        .get("container")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    block
}
