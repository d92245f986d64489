//! Tessera test utilities.
//!
//! Fixture builders for integration testing: hosts, containers, and content
//! blocks with sensible defaults that individual tests override as needed.

use serde_json::json;
use uuid::Uuid;

use tessera_kernel::models::{Container, ContentBlock, HostEntity};

/// Create a test host with default values.
pub fn test_host(entity_type: &str, entity_id: &str) -> HostEntity {
    HostEntity {
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        bundle: "article".to_string(),
        langcode: "en".to_string(),
        label: format!("{entity_type} {entity_id}"),
    }
}

/// Create a test container binding `page` hosts to `content_block` children.
///
/// Bundle allow-lists are left empty ("all bundles") so tests opt into
/// restrictions explicitly.
pub fn test_container(id: &str) -> Container {
    Container {
        id: id.to_string(),
        label: format!("Container {id}"),
        host_entity_type: "page".to_string(),
        host_bundles: Vec::new(),
        child_entity_type: "content_block".to_string(),
        child_bundles: Vec::new(),
        child_bundles_default: Some("text".to_string()),
        show_size_column: false,
        show_alignment_column: false,
    }
}

/// A content block builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestBlock {
    block: ContentBlock,
}

/// Create a text block fixture.
pub fn text_block(title: &str) -> TestBlock {
    let mut block = ContentBlock::draft("content_block", "text", "en");
    block.fields = json!({
        "title": title,
        "body": format!("Body of {title}"),
        "format": "plain",
    });
    TestBlock { block }
}

/// Create a gallery block fixture with `images` generated references.
pub fn gallery_block(title: &str, images: usize) -> TestBlock {
    let ids: Vec<String> = (0..images).map(|_| Uuid::now_v7().to_string()).collect();
    let mut block = ContentBlock::draft("content_block", "gallery", "en");
    block.fields = json!({
        "title": title,
        "image_ids": ids,
        "columns": 3,
    });
    TestBlock { block }
}

/// Create a block of an arbitrary bundle with empty fields.
pub fn bare_block(bundle: &str) -> TestBlock {
    TestBlock {
        block: ContentBlock::draft("content_block", bundle, "en"),
    }
}

impl TestBlock {
    /// Attach the block to a host within a container.
    pub fn attached(mut self, host: &HostEntity, container: &Container) -> Self {
        self.block.parent_id = Some(host.entity_id.clone());
        self.block.parent_type = Some(host.entity_type.clone());
        self.block.container = Some(container.id.clone());
        self.block.langcode = host.langcode.clone();
        self
    }

    /// Set the weight.
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.block.weight = weight;
        self
    }

    /// Set the language code.
    pub fn with_langcode(mut self, langcode: &str) -> Self {
        self.block.langcode = langcode.to_string();
        self
    }

    /// Set a single field in the field bag.
    pub fn with_field(mut self, name: &str, value: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = &mut self.block.fields {
            map.insert(name.to_string(), value);
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> ContentBlock {
        self.block
    }
}
