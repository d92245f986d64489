//! Entity storage boundary.
//!
//! The storage engine itself is an external collaborator; this module
//! specifies the contract the kernel needs from it: typed load/save/delete,
//! field-equality child queries sorted by weight, and one atomic batch
//! primitive scoped to a host record. [`memory::MemoryStorage`] is the
//! reference implementation and backs the test suite.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Container, ContentBlock, HostEntity, Snapshot, SnapshotLog};

pub use memory::MemoryStorage;

/// Field-equality filter for one host's children in one container.
#[derive(Debug, Clone, Copy)]
pub struct ChildQuery<'a> {
    pub parent_id: &'a str,
    pub parent_type: &'a str,
    pub langcode: &'a str,
    pub container: &'a str,
}

/// One operation in a host-scoped atomic batch.
#[derive(Debug, Clone)]
pub enum ChildOp {
    Delete(Uuid),
    Save(ContentBlock),
}

/// Storage contract consumed by the kernel services.
#[async_trait]
pub trait ContentStorage: Send + Sync {
    // Containers.
    async fn load_container(&self, id: &str) -> Result<Option<Container>>;
    async fn list_containers(&self) -> Result<Vec<Container>>;
    async fn save_container(&self, container: &Container) -> Result<()>;
    async fn delete_container(&self, id: &str) -> Result<bool>;

    // Content blocks.
    async fn load_block(&self, id: Uuid) -> Result<Option<ContentBlock>>;

    /// Load blocks by id, preserving the input order and skipping ids that
    /// no longer resolve.
    async fn load_blocks(&self, ids: &[Uuid]) -> Result<Vec<ContentBlock>>;

    /// Ids of matching children, sorted by weight ascending, ties resolved
    /// by insertion order.
    async fn query_child_ids(&self, query: ChildQuery<'_>) -> Result<Vec<Uuid>>;

    async fn save_block(&self, block: &ContentBlock) -> Result<()>;
    async fn delete_block(&self, id: Uuid) -> Result<bool>;

    /// Apply a batch of child deletions and saves atomically.
    ///
    /// `host_key` scopes the transaction to one host record. Either every
    /// operation lands or none do; a batch that fails validation must leave
    /// storage untouched.
    async fn apply_child_batch(&self, host_key: &str, ops: Vec<ChildOp>) -> Result<()>;

    // Hosts.
    async fn save_host(&self, host: &HostEntity) -> Result<()>;

    /// Load a host's base record.
    async fn load_host(&self, entity_type: &str, entity_id: &str) -> Result<Option<HostEntity>>;

    /// Load a specific translation of a host, if one exists.
    async fn load_host_translation(
        &self,
        entity_type: &str,
        entity_id: &str,
        langcode: &str,
    ) -> Result<Option<HostEntity>>;

    // Snapshots.
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;
    async fn load_snapshot(&self, id: Uuid) -> Result<Option<Snapshot>>;

    /// All snapshots, newest first.
    async fn list_snapshots(&self) -> Result<Vec<Snapshot>>;

    async fn delete_snapshot(&self, id: Uuid) -> Result<bool>;

    // Snapshot logs.
    async fn save_snapshot_log(&self, log: &SnapshotLog) -> Result<()>;

    /// Audit rows for one snapshot, oldest first.
    async fn snapshot_logs(&self, snapshot_id: Uuid) -> Result<Vec<SnapshotLog>>;
}
