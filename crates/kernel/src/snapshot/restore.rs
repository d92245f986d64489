//! Restore orchestration.
//!
//! Applies a snapshot's children back onto a live host: denormalize, decide
//! replace-vs-append, commit the delete+create sequence atomically, then
//! write one audit row. Denormalization failures abort before any live data
//! is touched. The audit row is written after the batch commits and is not
//! atomic with it: losing an audit row on crash is acceptable, losing data
//! consistency is not.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access::{AccessPolicy, Action};
use crate::content::{ContentManager, RequestCache};
use crate::error::{KernelError, KernelResult};
use crate::models::{Container, HostEntity, Snapshot, SnapshotLog};
use crate::snapshot::codec::Violation;
use crate::snapshot::service::SnapshotService;
use crate::storage::{ChildOp, ContentStorage};

/// Operator input for one restore.
#[derive(Debug, Clone, Default)]
pub struct RestoreRequest {
    /// Why the operator is restoring; recorded in the audit log.
    pub reason: String,

    /// Keep the existing children and append the snapshot's after them.
    /// When false the existing children are replaced.
    pub append: bool,

    /// The operator, if known; recorded in the audit log.
    pub user_id: Option<Uuid>,
}

/// What a successful restore did.
#[derive(Debug, Clone)]
pub struct RestoreOutcome {
    /// Number of blocks written from the snapshot.
    pub restored: usize,

    /// Number of pre-existing blocks deleted (zero when appending).
    pub replaced: usize,

    /// The audit row that was written.
    pub log_id: Uuid,

    /// Per-record codec violations, in blob order. Informational: the
    /// operator chose to proceed despite them.
    pub violations: Vec<Vec<Violation>>,
}

/// Applies snapshots onto live hosts.
pub struct RestoreOrchestrator {
    storage: Arc<dyn ContentStorage>,
    manager: Arc<ContentManager>,
    service: Arc<SnapshotService>,
    access: Arc<dyn AccessPolicy>,
}

impl RestoreOrchestrator {
    pub fn new(
        storage: Arc<dyn ContentStorage>,
        manager: Arc<ContentManager>,
        service: Arc<SnapshotService>,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            storage,
            manager,
            service,
            access,
        }
    }

    /// Restore a snapshot onto a host.
    ///
    /// Weights are reassigned from a counter that starts at the existing
    /// maximum (append) or zero (replace), pre-incremented per draft, so a
    /// replaced set comes out as 1, 2, 3…
    pub async fn restore(
        &self,
        request: &RequestCache,
        snapshot: &Snapshot,
        container: &Container,
        host: &HostEntity,
        options: RestoreRequest,
    ) -> KernelResult<RestoreOutcome> {
        if !self.access.allows(Action::Restore, &container.id) {
            return Err(KernelError::AccessDenied);
        }

        // Any denormalization error aborts here, before live data is read
        // or written, and surfaces verbatim.
        let drafts = self
            .service
            .denormalize(snapshot, container, host, &host.langcode)
            .await?;

        let existing = self
            .manager
            .get_content(request, host, &container.id)
            .await?;

        let mut ops = Vec::new();
        let mut weight = 0;
        for block in &existing {
            if options.append {
                weight = weight.max(block.weight);
            } else {
                ops.push(ChildOp::Delete(block.id));
            }
        }
        let replaced = ops.len();

        let mut violations = Vec::with_capacity(drafts.len());
        let restored = drafts.len();
        for draft in drafts {
            violations.push(draft.violations);
            let mut block = draft.block;
            weight += 1;
            block.weight = weight;
            ops.push(ChildOp::Save(block));
        }

        self.storage
            .apply_child_batch(&host.cache_tag(), ops)
            .await?;
        self.manager.invalidate_content(request, host, &container.id);

        let log = SnapshotLog {
            id: Uuid::now_v7(),
            snapshot_id: snapshot.id,
            comment: options.reason,
            owner_id: options.user_id,
            source_entity_type: host.entity_type.clone(),
            source_entity_id: host.entity_id.clone(),
            created: Utc::now().timestamp(),
        };
        self.storage.save_snapshot_log(&log).await?;

        info!(
            snapshot = %snapshot.id,
            host = %host.cache_tag(),
            container = %container.id,
            restored,
            replaced,
            append = options.append,
            "snapshot restored"
        );

        Ok(RestoreOutcome {
            restored,
            replaced,
            log_id: log.id,
            violations,
        })
    }
}
