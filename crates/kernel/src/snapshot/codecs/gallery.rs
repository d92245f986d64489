//! Codec for gallery blocks.
//!
//! Galleries reference their images by id. The references are exported as
//! opaque identifier strings, never as live entity data, and validated for
//! shape on the way back in.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::KernelResult;
use crate::models::ContentBlock;
use crate::snapshot::codec::{Codec, DenormalizedBlock, Violation, structural_draft};

const FIELDS: [&str; 3] = ["title", "image_ids", "columns"];

const MAX_COLUMNS: i64 = 6;

/// Snapshot codec for `content_block.gallery`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GalleryCodec;

#[async_trait]
impl Codec for GalleryCodec {
    fn entity_type_id(&self) -> &str {
        "content_block"
    }

    fn bundle(&self) -> &str {
        "gallery"
    }

    fn version_str(&self) -> &str {
        "2025/04/02 16:40"
    }

    async fn normalize(
        &self,
        block: &ContentBlock,
    ) -> KernelResult<serde_json::Map<String, serde_json::Value>> {
        let mut data = serde_json::Map::new();
        for field in FIELDS {
            if let Some(value) = block.fields.get(field) {
                data.insert(field.to_string(), value.clone());
            }
        }
        Ok(data)
    }

    async fn denormalize(
        &self,
        data: &serde_json::Map<String, serde_json::Value>,
        _source_langcode: &str,
        target_langcode: &str,
    ) -> KernelResult<DenormalizedBlock> {
        let mut block = structural_draft(self.entity_type_id(), self.bundle(), data, target_langcode);
        let mut violations = Vec::new();
        let mut fields = serde_json::Map::new();

        if let Some(title) = data.get("title").and_then(|v| v.as_str()) {
            fields.insert("title".to_string(), serde_json::json!(title));
        }

        let mut image_ids = Vec::new();
        match data.get("image_ids") {
            Some(serde_json::Value::Array(ids)) => {
                for (i, id) in ids.iter().enumerate() {
                    match id.as_str().map(Uuid::parse_str) {
                        Some(Ok(_)) => image_ids.push(id.clone()),
                        _ => violations.push(Violation::new(
                            "image_ids",
                            format!("Image reference {i} is not a valid id."),
                        )),
                    }
                }
            }
            Some(_) => violations.push(Violation::new("image_ids", "Image list is malformed.")),
            None => {}
        }
        fields.insert("image_ids".to_string(), serde_json::Value::Array(image_ids));

        let columns = data.get("columns").and_then(|v| v.as_i64()).unwrap_or(3);
        if (1..=MAX_COLUMNS).contains(&columns) {
            fields.insert("columns".to_string(), serde_json::json!(columns));
        } else {
            violations.push(Violation::new(
                "columns",
                format!("Column count {columns} is out of range."),
            ));
            fields.insert("columns".to_string(), serde_json::json!(3));
        }

        block.fields = serde_json::Value::Object(fields);
        Ok(DenormalizedBlock { block, violations })
    }

    fn metadata(&self, block: &ContentBlock) -> serde_json::Map<String, serde_json::Value> {
        // Image count travels with the record so operators can sanity-check
        // an import preview without resolving the references.
        let count = block
            .fields
            .get("image_ids")
            .and_then(|v| v.as_array())
            .map(Vec::len)
            .unwrap_or(0);

        let mut extra = serde_json::Map::new();
        extra.insert("image_count".to_string(), serde_json::json!(count));
        extra
    }
}
