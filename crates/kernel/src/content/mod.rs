//! Content relationship management.
//!
//! Owns the parent/child/container relationship model: the cached, ordered
//! query listing a host's current children, host resolution for a child,
//! container matching, and the display helpers (labels, teasers, table of
//! contents).

pub mod child_service;
pub mod request_cache;

use std::sync::Arc;

use tracing::debug;

use crate::cache::CacheLayer;
use crate::error::{KernelError, KernelResult};
use crate::models::{Container, ContentBlock, HostEntity, Snapshot};
use crate::storage::{ChildQuery, ContentStorage};

pub use child_service::ChildService;
pub use request_cache::RequestCache;

/// Strategy for overriding a block's display label.
///
/// Return `None` to fall back to the block's own label.
pub trait LabelResolver: Send + Sync {
    fn resolve(&self, block: &ContentBlock) -> Option<String>;
}

/// One table-of-contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    pub href: String,
}

/// Content relationship manager.
#[derive(Clone)]
pub struct ContentManager {
    storage: Arc<dyn ContentStorage>,
    cache: CacheLayer,
    label_resolver: Option<Arc<dyn LabelResolver>>,
}

impl ContentManager {
    pub fn new(storage: Arc<dyn ContentStorage>, cache: CacheLayer) -> Self {
        Self {
            storage,
            cache,
            label_resolver: None,
        }
    }

    /// Install a label override strategy.
    pub fn with_label_resolver(mut self, resolver: Arc<dyn LabelResolver>) -> Self {
        self.label_resolver = Some(resolver);
        self
    }

    fn content_key(host: &HostEntity, container_id: &str) -> String {
        format!(
            "content:{container_id}:{}:{}:{}",
            host.entity_type, host.entity_id, host.langcode
        )
    }

    /// A host's current children in one container, ordered by weight.
    ///
    /// The id list is memoized in the request cache and in the durable
    /// cache (tagged with the host's cache tag); the blocks themselves are
    /// always loaded fresh from storage.
    pub async fn get_content(
        &self,
        request: &RequestCache,
        host: &HostEntity,
        container_id: &str,
    ) -> KernelResult<Vec<ContentBlock>> {
        let container = self
            .storage
            .load_container(container_id)
            .await?
            .ok_or_else(|| KernelError::not_found("container", container_id))?;

        let key = Self::content_key(host, container_id);

        let ids = if let Some(ids) = request.get(&key) {
            ids
        } else if let Some(ids) = self.cache.get(&key) {
            request.set(&key, ids.clone());
            ids
        } else {
            let ids = self
                .storage
                .query_child_ids(ChildQuery {
                    parent_id: &host.entity_id,
                    parent_type: &host.entity_type,
                    langcode: &host.langcode,
                    container: &container.id,
                })
                .await?;
            self.cache.set(&key, ids.clone(), &[host.cache_tag()]);
            request.set(&key, ids.clone());
            debug!(container = %container.id, host = %host.cache_tag(), count = ids.len(), "children queried");
            ids
        };

        Ok(self.storage.load_blocks(&ids).await?)
    }

    /// Drop the cached child list for one host+container, in both tiers.
    pub fn invalidate_content(&self, request: &RequestCache, host: &HostEntity, container_id: &str) {
        let key = Self::content_key(host, container_id);
        request.remove(&key);
        self.cache.invalidate(&key);
    }

    /// Invalidate everything cached under the host's tag.
    ///
    /// This is the "content changed" notification: mutating services call it
    /// so the host's cached child lists are re-derived on next read.
    pub fn host_clear_cache(&self, child: &ContentBlock) {
        let (Some(parent_type), Some(parent_id)) =
            (child.parent_type.as_deref(), child.parent_id.as_deref())
        else {
            return;
        };
        if parent_type.is_empty() || parent_id.is_empty() {
            return;
        }
        self.cache.invalidate_tag(&format!("{parent_type}:{parent_id}"));
    }

    /// Whether an entity is a child (has a parent reference set).
    pub fn is_child(block: &ContentBlock) -> bool {
        block.parent_id.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Resolve a child's host entity.
    ///
    /// Returns the translation matching the child's language when the host
    /// has one, the base record otherwise, and `None` for unattached blocks.
    pub async fn get_host(&self, child: &ContentBlock) -> KernelResult<Option<HostEntity>> {
        if !Self::is_child(child) {
            return Ok(None);
        }

        let (Some(parent_type), Some(parent_id)) =
            (child.parent_type.as_deref(), child.parent_id.as_deref())
        else {
            return Ok(None);
        };

        let Some(base) = self.storage.load_host(parent_type, parent_id).await? else {
            return Ok(None);
        };

        if base.langcode != child.langcode
            && let Some(translation) = self
                .storage
                .load_host_translation(parent_type, parent_id, &child.langcode)
                .await?
        {
            return Ok(Some(translation));
        }

        Ok(Some(base))
    }

    /// Validate and persist a container definition.
    pub async fn save_container(&self, container: &Container) -> KernelResult<()> {
        container.validate()?;
        self.storage.save_container(container).await?;
        debug!(container = %container.id, "container saved");
        Ok(())
    }

    /// Delete a container definition. The children referencing it are left
    /// alone; they simply stop being listed anywhere.
    pub async fn delete_container(&self, id: &str) -> KernelResult<bool> {
        Ok(self.storage.delete_container(id).await?)
    }

    /// Containers whose host filter matches this host.
    pub async fn get_host_containers(&self, host: &HostEntity) -> KernelResult<Vec<Container>> {
        let containers = self.storage.list_containers().await?;
        Ok(containers.into_iter().filter(|c| c.is_host(host)).collect())
    }

    /// Containers whose child filter matches this block.
    pub async fn get_child_containers(&self, child: &ContentBlock) -> KernelResult<Vec<Container>> {
        let containers = self.storage.list_containers().await?;
        Ok(containers
            .into_iter()
            .filter(|c| c.has_child(child))
            .collect())
    }

    /// Humanized bundle label: "image_gallery" becomes "Image Gallery".
    pub fn bundle_label(bundle: &str) -> String {
        bundle
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Display teaser for a block, honoring the label override strategy.
    pub fn teaser(&self, block: &ContentBlock) -> String {
        if let Some(resolver) = &self.label_resolver
            && let Some(label) = resolver.resolve(block)
        {
            return label;
        }
        block.label()
    }

    /// Table of contents: (label, anchor) pairs for titled children.
    pub async fn toc(
        &self,
        request: &RequestCache,
        host: &HostEntity,
        container_id: &str,
    ) -> KernelResult<Vec<TocEntry>> {
        let children = self.get_content(request, host, container_id).await?;

        Ok(children
            .iter()
            .filter_map(|child| {
                let title = child.field_str("title")?;
                if title.is_empty() {
                    return None;
                }
                Some(TocEntry {
                    label: title.to_string(),
                    href: format!("#entity-{}", child.id),
                })
            })
            .collect())
    }

    /// Resolve the host a snapshot is pointed at, if any.
    ///
    /// Prefers the translation matching the snapshot's own language. Note
    /// the snapshot's `source_langcode` is deliberately not used here: it is
    /// the language of the original source host, not of the current one.
    pub async fn snapshot_host(&self, snapshot: &Snapshot) -> KernelResult<Option<HostEntity>> {
        let (Some(entity_type), Some(entity_id)) = (
            snapshot.source_entity_type.as_deref(),
            snapshot.source_entity_id.as_deref(),
        ) else {
            return Ok(None);
        };
        if entity_type.is_empty() || entity_id.is_empty() {
            return Ok(None);
        }

        let Some(base) = self.storage.load_host(entity_type, entity_id).await? else {
            return Ok(None);
        };

        if base.langcode != snapshot.langcode
            && let Some(translation) = self
                .storage
                .load_host_translation(entity_type, entity_id, &snapshot.langcode)
                .await?
        {
            return Ok(Some(translation));
        }

        Ok(Some(base))
    }

    /// Resolve the container a snapshot is pointed at, if any.
    pub async fn snapshot_container(&self, snapshot: &Snapshot) -> KernelResult<Option<Container>> {
        let Some(container_id) = snapshot.container.as_deref() else {
            return Ok(None);
        };
        if container_id.is_empty() {
            return Ok(None);
        }
        Ok(self.storage.load_container(container_id).await?)
    }
}
