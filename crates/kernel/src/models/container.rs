//! Container configuration entity.
//!
//! A container binds one host entity type (plus bundle allow-list) to one
//! child entity type (plus bundle allow-list). Containers are admin-managed
//! configuration: few in number, rarely changed, referenced by id from
//! everywhere else.

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::models::{ContentBlock, HostEntity};

/// Container configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Machine name, unique.
    pub id: String,

    /// Display label.
    pub label: String,

    /// Host entity type this container attaches to.
    pub host_entity_type: String,

    /// Host bundle allow-list; empty means every bundle of the host type.
    #[serde(default)]
    pub host_bundles: Vec<String>,

    /// Child entity type this container holds.
    pub child_entity_type: String,

    /// Child bundle allow-list; empty means every bundle of the child type.
    #[serde(default)]
    pub child_bundles: Vec<String>,

    /// Bundle preselected in the add-child flow.
    #[serde(default)]
    pub child_bundles_default: Option<String>,

    /// Show the size column in the child overview table.
    #[serde(default)]
    pub show_size_column: bool,

    /// Show the alignment column in the child overview table.
    #[serde(default)]
    pub show_alignment_column: bool,
}

impl Container {
    /// Whether this host entity matches the container's host filter.
    pub fn is_host(&self, host: &HostEntity) -> bool {
        host.entity_type == self.host_entity_type
            && (self.host_bundles.is_empty() || self.host_bundles.contains(&host.bundle))
    }

    /// Whether this block matches the container's child filter.
    pub fn has_child(&self, child: &ContentBlock) -> bool {
        child.entity_type == self.child_entity_type
            && (self.child_bundles.is_empty() || self.child_bundles.contains(&child.bundle))
    }

    /// Whether a bundle name passes the child filter.
    pub fn allows_child_bundle(&self, bundle: &str) -> bool {
        self.child_bundles.is_empty() || self.child_bundles.iter().any(|b| b == bundle)
    }

    /// Validate the configuration. Called before persisting a container.
    pub fn validate(&self) -> KernelResult<()> {
        if self.id.is_empty() {
            return Err(KernelError::Configuration(
                "container id must not be empty".to_string(),
            ));
        }
        if self.host_entity_type.is_empty() {
            return Err(KernelError::Configuration(format!(
                "container `{}` declares no host entity type",
                self.id
            )));
        }
        if self.child_entity_type.is_empty() {
            return Err(KernelError::Configuration(format!(
                "container `{}` declares no child entity type",
                self.id
            )));
        }
        if let Some(default) = &self.child_bundles_default
            && !self.allows_child_bundle(default)
        {
            return Err(KernelError::Configuration(format!(
                "container `{}` defaults to child bundle `{default}` which its allow-list excludes",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn container() -> Container {
        Container {
            id: "main".to_string(),
            label: "Main content".to_string(),
            host_entity_type: "page".to_string(),
            host_bundles: vec!["article".to_string()],
            child_entity_type: "content_block".to_string(),
            child_bundles: vec!["text".to_string(), "gallery".to_string()],
            child_bundles_default: Some("text".to_string()),
            show_size_column: false,
            show_alignment_column: false,
        }
    }

    fn host(entity_type: &str, bundle: &str) -> HostEntity {
        HostEntity {
            entity_type: entity_type.to_string(),
            entity_id: "1".to_string(),
            bundle: bundle.to_string(),
            langcode: "en".to_string(),
            label: "Host".to_string(),
        }
    }

    #[test]
    fn host_filter_checks_type_and_bundle() {
        let c = container();
        assert!(c.is_host(&host("page", "article")));
        assert!(!c.is_host(&host("page", "landing")));
        assert!(!c.is_host(&host("event", "article")));
    }

    #[test]
    fn empty_host_bundles_means_all() {
        let mut c = container();
        c.host_bundles.clear();
        assert!(c.is_host(&host("page", "anything")));
    }

    #[test]
    fn child_filter_checks_type_and_bundle() {
        let c = container();
        let mut child = ContentBlock::draft("content_block", "text", "en");
        assert!(c.has_child(&child));

        child.bundle = "video".to_string();
        assert!(!c.has_child(&child));

        child.entity_type = "other".to_string();
        child.bundle = "text".to_string();
        assert!(!c.has_child(&child));
    }

    #[test]
    fn validation_rejects_excluded_default_bundle() {
        let mut c = container();
        c.child_bundles_default = Some("video".to_string());
        assert!(matches!(
            c.validate(),
            Err(KernelError::Configuration(_))
        ));
    }

    #[test]
    fn validation_rejects_missing_entity_types() {
        let mut c = container();
        c.host_entity_type.clear();
        assert!(c.validate().is_err());

        let mut c = container();
        c.child_entity_type.clear();
        assert!(c.validate().is_err());
    }
}
