//! Snapshot service.
//!
//! Orchestrates the normalize/denormalize pipeline and the signed export
//! envelope: capturing a host's children as a snapshot, rehydrating drafts
//! from one, and moving snapshots across environments as tamper-evident
//! base64 strings.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::info;
use uuid::Uuid;

use crate::error::{KernelError, KernelResult};
use crate::models::{
    BlobRecord, BlockMetadata, Container, ContentBlock, HostEntity, Snapshot, SnapshotFields,
};
use crate::snapshot::codec::{Codec, DenormalizedBlock};
use crate::snapshot::registry::CodecRegistry;

type HmacSha256 = Hmac<Sha256>;

/// Identity and structural keys stripped from normalized data before
/// storage. The container reference is deliberately not carried per record:
/// the snapshot itself already carries one.
const STRIPPED_DATA_KEYS: [&str; 5] = ["id", "uuid", "parent_id", "parent_type", "container"];

/// Human-readable form of a codec version in record metadata.
const VERSION_HUMAN_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Snapshot capture, rehydration, and the signed export envelope.
pub struct SnapshotService {
    registry: Arc<CodecRegistry>,
    environment: String,
    secret: String,
}

impl SnapshotService {
    /// `environment` tags snapshots created here; `secret` signs exports.
    /// Both come from configuration. The secret is injected so rotating it
    /// stays an operational change.
    pub fn new(
        registry: Arc<CodecRegistry>,
        environment: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            environment: environment.into(),
            secret: secret.into(),
        }
    }

    /// Whether a block's (entity type, bundle) pair has a registered codec.
    pub fn is_snapshotable(&self, block: &ContentBlock) -> bool {
        self.registry.has(&block.entity_type, &block.bundle)
    }

    /// The snapshot-capable subset of `blocks`, preserving order. Listings
    /// offering blocks for snapshotting must go through this filter.
    pub fn snapshotable<'a>(&self, blocks: &'a [ContentBlock]) -> Vec<&'a ContentBlock> {
        blocks
            .iter()
            .filter(|block| self.is_snapshotable(block))
            .collect()
    }

    fn codec_for(&self, entity_type_id: &str, bundle: &str) -> KernelResult<Arc<dyn Codec>> {
        self.registry.get(entity_type_id, bundle).ok_or_else(|| {
            KernelError::Configuration(format!(
                "no snapshot codec found for `{entity_type_id}.{bundle}`"
            ))
        })
    }

    /// Capture an ordered set of blocks as a new snapshot.
    ///
    /// Callers pre-filter through [`Self::is_snapshotable`]; hitting an
    /// unregistered pair here is a configuration error. The returned
    /// snapshot is not persisted.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_snapshot(
        &self,
        blocks: &[ContentBlock],
        title: &str,
        description: &str,
        owner: Option<Uuid>,
        container: &Container,
        host: Option<&HostEntity>,
        environment: Option<&str>,
        langcode: &str,
    ) -> KernelResult<Snapshot> {
        let mut normalized = Vec::with_capacity(blocks.len());

        for block in blocks {
            let codec = self.codec_for(&block.entity_type, &block.bundle)?;
            let version = codec.version()?;

            let mut data = codec.normalize(block).await?;
            for key in STRIPPED_DATA_KEYS {
                data.remove(key);
            }

            normalized.push(BlobRecord {
                metadata: BlockMetadata {
                    codec_version: version.and_utc().timestamp(),
                    codec_version_human: version.format(VERSION_HUMAN_FORMAT).to_string(),
                    entity_type_id: block.entity_type.clone(),
                    bundle: block.bundle.clone(),
                    entity_id: block.id.to_string(),
                    uuid: block.id.to_string(),
                    extra: codec.metadata(block),
                },
                data,
            });
        }

        let snapshot = Snapshot::from_fields(
            SnapshotFields {
                title: title.to_string(),
                comment: description.to_string(),
                environment: environment
                    .filter(|e| !e.is_empty())
                    .unwrap_or(&self.environment)
                    .to_string(),
                created: None,
                blob: normalized,
                user_id: owner,
                source_langcode: None,
                source_entity_type: host.map(|h| h.entity_type.clone()),
                source_entity_id: host.map(|h| h.entity_id.clone()),
                container: Some(container.id.clone()),
                active: false,
            },
            langcode,
        )?;

        info!(
            snapshot = %snapshot.id,
            container = %container.id,
            blocks = blocks.len(),
            "snapshot created"
        );
        Ok(snapshot)
    }

    /// Rehydrate draft blocks from a snapshot, against a concrete container
    /// and host. Pure over its inputs: nothing is persisted.
    ///
    /// Each record must name its entity type and bundle; anything else is a
    /// data-integrity error. Codec violations are collected per record, in
    /// original blob order, and never abort the operation.
    pub async fn denormalize(
        &self,
        snapshot: &Snapshot,
        container: &Container,
        host: &HostEntity,
        target_langcode: &str,
    ) -> KernelResult<Vec<DenormalizedBlock>> {
        let mut results = Vec::new();

        for record in snapshot.blob()? {
            if record.metadata.entity_type_id.is_empty() || record.metadata.bundle.is_empty() {
                return Err(KernelError::DataIntegrity(
                    "cannot denormalize record: missing `entityTypeId` and/or `bundle` metadata"
                        .to_string(),
                ));
            }

            let codec =
                self.codec_for(&record.metadata.entity_type_id, &record.metadata.bundle)?;

            let mut data = record.data.clone();
            data.insert(
                "container".to_string(),
                serde_json::Value::String(container.id.clone()),
            );
            data.insert(
                "parent_id".to_string(),
                serde_json::Value::String(host.entity_id.clone()),
            );
            data.insert(
                "parent_type".to_string(),
                serde_json::Value::String(host.entity_type.clone()),
            );

            results.push(
                codec
                    .denormalize(&data, &snapshot.source_langcode, target_langcode)
                    .await?,
            );
        }

        Ok(results)
    }

    /// Produce the portable signed export string:
    /// `base64(JSON({ ...fields, hmac }))`.
    ///
    /// The mac is computed over the canonical JSON encoding of the fields,
    /// the same encoding import re-derives, so exactly one canonical byte
    /// representation of the payload exists before the `hmac` key is
    /// attached.
    pub fn export(&self, snapshot: &Snapshot) -> KernelResult<String> {
        let fields = snapshot.to_fields()?;
        let mut envelope = serde_json::to_value(&fields)?;
        let payload = serde_json::to_string(&envelope)?;
        let mac = self.hmac(&payload)?;

        envelope
            .as_object_mut()
            .ok_or_else(|| {
                KernelError::DataIntegrity("snapshot did not serialize to an object".to_string())
            })?
            .insert("hmac".to_string(), serde_json::Value::String(mac));

        Ok(BASE64.encode(serde_json::to_string(&envelope)?))
    }

    /// Validate and parse an export string back into a snapshot.
    ///
    /// This is the one operation that defends against adversarial input:
    /// nothing in the blob is interpreted as more than opaque JSON until the
    /// mac has been verified, in constant time. A corrupted blob and one
    /// signed with another secret fail with the same generic error.
    pub fn import(&self, data: &str, langcode: &str) -> KernelResult<Snapshot> {
        let bytes = BASE64
            .decode(data.trim())
            .map_err(|_| KernelError::InvalidSnapshot)?;

        let mut envelope: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| KernelError::InvalidSnapshot)?;
        let given = envelope
            .as_object_mut()
            .ok_or(KernelError::InvalidSnapshot)?
            .remove("hmac")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        let payload = serde_json::to_string(&envelope)?;
        let expected = self.hmac(&payload)?;

        if !bool::from(given.as_bytes().ct_eq(expected.as_bytes())) {
            return Err(KernelError::InvalidSnapshot);
        }

        let fields: SnapshotFields =
            serde_json::from_value(envelope).map_err(|_| KernelError::InvalidSnapshot)?;

        let snapshot = Snapshot::from_fields(fields, langcode)?;
        info!(snapshot = %snapshot.id, environment = %snapshot.environment, "snapshot imported");
        Ok(snapshot)
    }

    fn hmac(&self, payload: &str) -> KernelResult<String> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| KernelError::Configuration("invalid snapshot secret".to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
