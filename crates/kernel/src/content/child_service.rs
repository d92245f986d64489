//! Content block lifecycle service.
//!
//! Creation with `weight = max + 1`, the drag-reorder batch weight rewrite,
//! and deletion. Every mutation fires the host's "content changed"
//! invalidation so cached child lists are re-derived.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access::{AccessPolicy, Action};
use crate::content::{ContentManager, RequestCache};
use crate::error::{KernelError, KernelResult};
use crate::models::{Container, ContentBlock, HostEntity};
use crate::storage::ContentStorage;

/// Service for content block CRUD and ordering.
#[derive(Clone)]
pub struct ChildService {
    storage: Arc<dyn ContentStorage>,
    manager: Arc<ContentManager>,
    access: Arc<dyn AccessPolicy>,
}

impl ChildService {
    pub fn new(
        storage: Arc<dyn ContentStorage>,
        manager: Arc<ContentManager>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            storage,
            manager,
            access,
        }
    }

    /// Build a draft child for the add-child flow.
    ///
    /// The draft carries the four structural fields and lands at the end of
    /// the host's current list (`weight = max + 1`). An empty bundle falls
    /// back to the container's default. Not persisted; call [`Self::save`].
    pub async fn create_child(
        &self,
        request: &RequestCache,
        container: &Container,
        bundle: &str,
        host: &HostEntity,
    ) -> KernelResult<ContentBlock> {
        let bundle = if bundle.is_empty() {
            container.child_bundles_default.as_deref().ok_or_else(|| {
                KernelError::Configuration(format!(
                    "container `{}` has no default child bundle",
                    container.id
                ))
            })?
        } else {
            bundle
        };

        if !container.allows_child_bundle(bundle) {
            return Err(KernelError::not_found("child bundle", bundle));
        }

        let existing = self.manager.get_content(request, host, &container.id).await?;
        let max_weight = existing.iter().map(|b| b.weight).max().unwrap_or(0);

        let mut block = ContentBlock::draft(&container.child_entity_type, bundle, &host.langcode);
        block.parent_id = Some(host.entity_id.clone());
        block.parent_type = Some(host.entity_type.clone());
        block.container = Some(container.id.clone());
        block.weight = max_weight + 1;

        Ok(block)
    }

    /// Persist a block and fire the content-changed invalidation.
    pub async fn save(&self, block: &ContentBlock) -> KernelResult<()> {
        let container = block.container.as_deref().unwrap_or_default();
        if !self.access.allows(Action::Edit, container) {
            return Err(KernelError::AccessDenied);
        }

        self.storage.save_block(block).await?;
        self.manager.host_clear_cache(block);

        info!(block_id = %block.id, bundle = %block.bundle, "content block saved");
        Ok(())
    }

    /// Rewrite weights for a whole container in one batch (drag-reorder).
    ///
    /// `order` pairs each block id with its new weight.
    pub async fn reorder(
        &self,
        request: &RequestCache,
        host: &HostEntity,
        container_id: &str,
        order: &[(Uuid, i32)],
    ) -> KernelResult<()> {
        if !self.access.allows(Action::Edit, container_id) {
            return Err(KernelError::AccessDenied);
        }

        for (id, weight) in order {
            let mut block = self
                .storage
                .load_block(*id)
                .await?
                .ok_or_else(|| KernelError::not_found("content block", id.to_string()))?;
            block.weight = *weight;
            block.changed = Utc::now().timestamp();
            self.storage.save_block(&block).await?;
        }

        self.manager.invalidate_content(request, host, container_id);

        info!(host = %host.cache_tag(), container = %container_id, rows = order.len(), "children reordered");
        Ok(())
    }

    /// Delete a block and fire the content-changed invalidation.
    pub async fn delete(&self, id: Uuid) -> KernelResult<bool> {
        let Some(block) = self.storage.load_block(id).await? else {
            return Ok(false);
        };

        let container = block.container.as_deref().unwrap_or_default();
        if !self.access.allows(Action::Delete, container) {
            return Err(KernelError::AccessDenied);
        }

        let deleted = self.storage.delete_block(id).await?;
        if deleted {
            self.manager.host_clear_cache(&block);
            info!(block_id = %id, bundle = %block.bundle, "content block deleted");
        }

        Ok(deleted)
    }
}
