//! In-memory storage backend.
//!
//! Reference implementation of [`ContentStorage`]: a single RwLock over
//! plain tables. Batch application validates every operation before touching
//! any table, which is what makes `apply_child_batch` atomic here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Container, ContentBlock, HostEntity, Snapshot, SnapshotLog};
use crate::storage::{ChildOp, ChildQuery, ContentStorage};

#[derive(Debug, Clone)]
struct BlockRow {
    block: ContentBlock,
    /// Monotonic insertion sequence, used to break weight ties.
    seq: u64,
}

#[derive(Default)]
struct Tables {
    containers: HashMap<String, Container>,
    blocks: HashMap<Uuid, BlockRow>,
    next_seq: u64,
    /// Host records keyed by (entity type, entity id); the first entry is
    /// the base record, the rest are translations.
    hosts: HashMap<(String, String), Vec<HostEntity>>,
    snapshots: HashMap<Uuid, Snapshot>,
    snapshot_order: Vec<Uuid>,
    logs: Vec<SnapshotLog>,
}

/// In-memory [`ContentStorage`] implementation.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
    child_queries: AtomicU64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many child queries have hit storage (cache-behavior assertions).
    pub fn child_query_count(&self) -> u64 {
        self.child_queries.load(Ordering::Relaxed)
    }

    fn upsert_block(tables: &mut Tables, block: &ContentBlock) {
        let seq = match tables.blocks.get(&block.id) {
            Some(row) => row.seq,
            None => {
                tables.next_seq += 1;
                tables.next_seq
            }
        };
        tables.blocks.insert(
            block.id,
            BlockRow {
                block: block.clone(),
                seq,
            },
        );
    }
}

#[async_trait]
impl ContentStorage for MemoryStorage {
    async fn load_container(&self, id: &str) -> Result<Option<Container>> {
        Ok(self.tables.read().containers.get(id).cloned())
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        let mut containers: Vec<_> = self.tables.read().containers.values().cloned().collect();
        containers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(containers)
    }

    async fn save_container(&self, container: &Container) -> Result<()> {
        self.tables
            .write()
            .containers
            .insert(container.id.clone(), container.clone());
        Ok(())
    }

    async fn delete_container(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().containers.remove(id).is_some())
    }

    async fn load_block(&self, id: Uuid) -> Result<Option<ContentBlock>> {
        Ok(self.tables.read().blocks.get(&id).map(|r| r.block.clone()))
    }

    async fn load_blocks(&self, ids: &[Uuid]) -> Result<Vec<ContentBlock>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.blocks.get(id).map(|r| r.block.clone()))
            .collect())
    }

    async fn query_child_ids(&self, query: ChildQuery<'_>) -> Result<Vec<Uuid>> {
        self.child_queries.fetch_add(1, Ordering::Relaxed);

        let tables = self.tables.read();
        let mut rows: Vec<&BlockRow> = tables
            .blocks
            .values()
            .filter(|row| {
                row.block.parent_id.as_deref() == Some(query.parent_id)
                    && row.block.parent_type.as_deref() == Some(query.parent_type)
                    && row.block.langcode == query.langcode
                    && row.block.container.as_deref() == Some(query.container)
            })
            .collect();
        rows.sort_by_key(|row| (row.block.weight, row.seq));

        Ok(rows.into_iter().map(|row| row.block.id).collect())
    }

    async fn save_block(&self, block: &ContentBlock) -> Result<()> {
        let mut tables = self.tables.write();
        Self::upsert_block(&mut tables, block);
        Ok(())
    }

    async fn delete_block(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().blocks.remove(&id).is_some())
    }

    async fn apply_child_batch(&self, host_key: &str, ops: Vec<ChildOp>) -> Result<()> {
        let mut tables = self.tables.write();

        // Validate the whole batch before applying any of it.
        for op in &ops {
            match op {
                ChildOp::Delete(id) => {
                    if !tables.blocks.contains_key(id) {
                        bail!("child batch for `{host_key}` deletes unknown block {id}");
                    }
                }
                ChildOp::Save(block) => {
                    if block.parent_id.as_deref().is_none_or(str::is_empty)
                        || block.parent_type.as_deref().is_none_or(str::is_empty)
                        || block.container.as_deref().is_none_or(str::is_empty)
                    {
                        bail!(
                            "child batch for `{host_key}` saves block {} without parent or container",
                            block.id
                        );
                    }
                }
            }
        }

        for op in ops {
            match op {
                ChildOp::Delete(id) => {
                    tables.blocks.remove(&id);
                }
                ChildOp::Save(block) => Self::upsert_block(&mut tables, &block),
            }
        }

        debug!(host = %host_key, "child batch applied");
        Ok(())
    }

    async fn save_host(&self, host: &HostEntity) -> Result<()> {
        let mut tables = self.tables.write();
        let records = tables
            .hosts
            .entry((host.entity_type.clone(), host.entity_id.clone()))
            .or_default();

        match records.iter_mut().find(|h| h.langcode == host.langcode) {
            Some(existing) => *existing = host.clone(),
            None => records.push(host.clone()),
        }
        Ok(())
    }

    async fn load_host(&self, entity_type: &str, entity_id: &str) -> Result<Option<HostEntity>> {
        Ok(self
            .tables
            .read()
            .hosts
            .get(&(entity_type.to_string(), entity_id.to_string()))
            .and_then(|records| records.first().cloned()))
    }

    async fn load_host_translation(
        &self,
        entity_type: &str,
        entity_id: &str,
        langcode: &str,
    ) -> Result<Option<HostEntity>> {
        Ok(self
            .tables
            .read()
            .hosts
            .get(&(entity_type.to_string(), entity_id.to_string()))
            .and_then(|records| records.iter().find(|h| h.langcode == langcode).cloned()))
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.snapshots.contains_key(&snapshot.id) {
            tables.snapshot_order.push(snapshot.id);
        }
        tables.snapshots.insert(snapshot.id, snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, id: Uuid) -> Result<Option<Snapshot>> {
        Ok(self.tables.read().snapshots.get(&id).cloned())
    }

    async fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        let tables = self.tables.read();
        Ok(tables
            .snapshot_order
            .iter()
            .rev()
            .filter_map(|id| tables.snapshots.get(id).cloned())
            .collect())
    }

    async fn delete_snapshot(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write();
        tables.snapshot_order.retain(|s| *s != id);
        Ok(tables.snapshots.remove(&id).is_some())
    }

    async fn save_snapshot_log(&self, log: &SnapshotLog) -> Result<()> {
        self.tables.write().logs.push(log.clone());
        Ok(())
    }

    async fn snapshot_logs(&self, snapshot_id: Uuid) -> Result<Vec<SnapshotLog>> {
        Ok(self
            .tables
            .read()
            .logs
            .iter()
            .filter(|log| log.snapshot_id == snapshot_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn attached_block(weight: i32) -> ContentBlock {
        let mut block = ContentBlock::draft("content_block", "text", "en");
        block.parent_id = Some("1".to_string());
        block.parent_type = Some("page".to_string());
        block.container = Some("main".to_string());
        block.weight = weight;
        block
    }

    #[tokio::test]
    async fn child_query_sorts_by_weight_then_insertion() {
        let storage = MemoryStorage::new();

        let a = attached_block(2);
        let b = attached_block(1);
        let c = attached_block(2); // same weight as a, inserted later
        storage.save_block(&a).await.unwrap();
        storage.save_block(&b).await.unwrap();
        storage.save_block(&c).await.unwrap();

        let ids = storage
            .query_child_ids(ChildQuery {
                parent_id: "1",
                parent_type: "page",
                langcode: "en",
                container: "main",
            })
            .await
            .unwrap();

        assert_eq!(ids, vec![b.id, a.id, c.id]);
    }

    #[tokio::test]
    async fn rejected_batch_leaves_storage_untouched() {
        let storage = MemoryStorage::new();
        let existing = attached_block(1);
        storage.save_block(&existing).await.unwrap();

        // Second op is invalid: a save without structural fields.
        let orphan = ContentBlock::draft("content_block", "text", "en");
        let result = storage
            .apply_child_batch(
                "page:1",
                vec![ChildOp::Delete(existing.id), ChildOp::Save(orphan)],
            )
            .await;

        assert!(result.is_err());
        assert!(storage.load_block(existing.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn host_translations_resolve_by_langcode() {
        let storage = MemoryStorage::new();
        let base = HostEntity {
            entity_type: "page".to_string(),
            entity_id: "1".to_string(),
            bundle: "article".to_string(),
            langcode: "en".to_string(),
            label: "About".to_string(),
        };
        let mut translation = base.clone();
        translation.langcode = "nl".to_string();
        translation.label = "Over ons".to_string();

        storage.save_host(&base).await.unwrap();
        storage.save_host(&translation).await.unwrap();

        let loaded = storage.load_host("page", "1").await.unwrap().unwrap();
        assert_eq!(loaded.langcode, "en");

        let nl = storage
            .load_host_translation("page", "1", "nl")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(nl.label, "Over ons");

        assert!(
            storage
                .load_host_translation("page", "1", "de")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn snapshots_list_newest_first() {
        let storage = MemoryStorage::new();
        let older = Snapshot::from_fields(
            crate::models::SnapshotFields {
                title: "first".to_string(),
                comment: String::new(),
                environment: "test".to_string(),
                created: Some(1),
                blob: Vec::new(),
                user_id: None,
                source_langcode: None,
                source_entity_type: None,
                source_entity_id: None,
                container: None,
                active: false,
            },
            "en",
        )
        .unwrap();
        let mut newer = older.clone();
        newer.id = Uuid::now_v7();
        newer.title = "second".to_string();

        storage.save_snapshot(&older).await.unwrap();
        storage.save_snapshot(&newer).await.unwrap();

        let listed = storage.list_snapshots().await.unwrap();
        assert_eq!(listed[0].title, "second");
        assert_eq!(listed[1].title, "first");
    }
}
