//! Codec for rich-text blocks.

use async_trait::async_trait;

use crate::error::KernelResult;
use crate::models::ContentBlock;
use crate::snapshot::codec::{Codec, DenormalizedBlock, Violation, structural_draft};

/// Text formats a text block may declare.
const FORMATS: [&str; 3] = ["plain", "filtered_html", "markdown"];

/// Fields this codec carries. Anything else in the block's field bag is not
/// part of the snapshot contract and is dropped.
const FIELDS: [&str; 3] = ["title", "body", "format"];

/// Snapshot codec for `content_block.text`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCodec;

#[async_trait]
impl Codec for TextCodec {
    fn entity_type_id(&self) -> &str {
        "content_block"
    }

    fn bundle(&self) -> &str {
        "text"
    }

    fn version_str(&self) -> &str {
        "2025/02/11 10:15"
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

        match data.get("title").and_then(|v| v.as_str()) {
            Some(title) if !title.is_empty() => {
                fields.insert("title".to_string(), serde_json::json!(title));
            }
            _ => violations.push(Violation::new("title", "Title is missing or empty.")),
        }

        match data.get("body") {
            Some(serde_json::Value::String(body)) => {
                fields.insert("body".to_string(), serde_json::json!(body));
            }
            Some(_) => violations.push(Violation::new("body", "Body is not text.")),
            None => {
                fields.insert("body".to_string(), serde_json::json!(""));
            }
        }

        let format = data
            .get("format")
            .and_then(|v| v.as_str())
            .unwrap_or("plain");
        if FORMATS.contains(&format) {
            fields.insert("format".to_string(), serde_json::json!(format));
        } else {
            violations.push(Violation::new(
                "format",
                format!("Unknown text format `{format}`."),
            ));
            fields.insert("format".to_string(), serde_json::json!("plain"));
        }

        block.fields = serde_json::Value::Object(fields);
        Ok(DenormalizedBlock { block, violations })
    }
}
