#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Restore orchestration tests: replace vs append, atomicity, and the
//! audit trail.

mod common;

use std::sync::Arc;

use common::{test_kernel, test_kernel_with_policy};
use tessera_kernel::KernelError;
use tessera_kernel::access::{AccessPolicy, Action};
use tessera_kernel::content::RequestCache;
use tessera_kernel::models::{ContentBlock, Snapshot, SnapshotFields};
use tessera_kernel::snapshot::RestoreRequest;
use tessera_kernel::storage::ContentStorage;
use tessera_test_utils::text_block;
use uuid::Uuid;

/// Snapshot of two text blocks (X, Y), unattached to any host.
async fn snapshot_of_x_and_y(kernel: &common::TestKernel) -> Snapshot {
    let (host, container) = kernel.seed_host_and_container().await;
    let blocks = vec![
        text_block("X").attached(&host, &container).build(),
        text_block("Y").attached(&host, &container).build(),
    ];
    kernel
        .service
        .create_snapshot(&blocks, "XY", "", None, &container, Some(&host), None, "en")
        .await
        .unwrap()
}

#[tokio::test]
async fn replace_swaps_the_existing_children() {
    let kernel = test_kernel();
    let snapshot = snapshot_of_x_and_y(&kernel).await;
    let (host, container) = kernel.seed_host_and_container().await;
    kernel.seed_text_children(&host, &container, &["A", "B"]).await;

    let request = RequestCache::new();
    let outcome = kernel
        .restore
        .restore(
            &request,
            &snapshot,
            &container,
            &host,
            RestoreRequest {
                reason: "relaunch rollback".to_string(),
                append: false,
                user_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.restored, 2);
    assert_eq!(outcome.replaced, 2);

    let children = kernel.current_children(&host, &container).await;
    let titles: Vec<_> = children.iter().map(ContentBlock::label).collect();
    assert_eq!(titles, vec!["X", "Y"]);
    let weights: Vec<_> = children.iter().map(|b| b.weight).collect();
    assert_eq!(weights, vec![1, 2]);
}

#[tokio::test]
async fn append_keeps_the_existing_children_in_front() {
    let kernel = test_kernel();
    let snapshot = snapshot_of_x_and_y(&kernel).await;
    let (host, container) = kernel.seed_host_and_container().await;
    kernel.seed_text_children(&host, &container, &["A", "B"]).await;

    let request = RequestCache::new();
    let outcome = kernel
        .restore
        .restore(
            &request,
            &snapshot,
            &container,
            &host,
            RestoreRequest {
                reason: String::new(),
                append: true,
                user_id: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.restored, 2);
    assert_eq!(outcome.replaced, 0);

    let children = kernel.current_children(&host, &container).await;
    let titles: Vec<_> = children.iter().map(ContentBlock::label).collect();
    assert_eq!(titles, vec!["A", "B", "X", "Y"]);
    let weights: Vec<_> = children.iter().map(|b| b.weight).collect();
    assert_eq!(weights, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn restore_onto_an_empty_host_starts_weights_at_one() {
    let kernel = test_kernel();
    let snapshot = snapshot_of_x_and_y(&kernel).await;
    let (host, container) = kernel.seed_host_and_container().await;

    let request = RequestCache::new();
    kernel
        .restore
        .restore(&request, &snapshot, &container, &host, RestoreRequest::default())
        .await
        .unwrap();

    let children = kernel.current_children(&host, &container).await;
    let weights: Vec<_> = children.iter().map(|b| b.weight).collect();
    assert_eq!(weights, vec![1, 2]);
}

#[tokio::test]
async fn every_successful_restore_writes_exactly_one_audit_row() {
    let kernel = test_kernel();
    let snapshot = snapshot_of_x_and_y(&kernel).await;
    let (host, container) = kernel.seed_host_and_container().await;
    let operator = Uuid::now_v7();

    let request = RequestCache::new();
    kernel
        .restore
        .restore(
            &request,
            &snapshot,
            &container,
            &host,
            RestoreRequest {
                reason: "first".to_string(),
                append: false,
                user_id: Some(operator),
            },
        )
        .await
        .unwrap();

    let logs = kernel.storage.snapshot_logs(snapshot.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].snapshot_id, snapshot.id);
    assert_eq!(logs[0].comment, "first");
    assert_eq!(logs[0].owner_id, Some(operator));
    assert_eq!(logs[0].source_entity_type, host.entity_type);
    assert_eq!(logs[0].source_entity_id, host.entity_id);

    kernel
        .restore
        .restore(
            &request,
            &snapshot,
            &container,
            &host,
            RestoreRequest {
                reason: "second".to_string(),
                append: true,
                user_id: Some(operator),
            },
        )
        .await
        .unwrap();
    assert_eq!(kernel.storage.snapshot_logs(snapshot.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn aborted_restore_touches_nothing() {
    let kernel = test_kernel();
    let (host, container) = kernel.seed_host_and_container().await;
    kernel.seed_text_children(&host, &container, &["A", "B"]).await;

    // A snapshot whose blob cannot be denormalized: record without bundle.
    let mut broken = Snapshot::from_fields(
        SnapshotFields {
            title: "Broken".to_string(),
            comment: String::new(),
            environment: "test".to_string(),
            created: None,
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
    broken.blob = r#"[{"metadata":{"entityTypeId":"content_block"},"data":{}}]"#.to_string();

    let request = RequestCache::new();
    let result = kernel
        .restore
        .restore(&request, &broken, &container, &host, RestoreRequest::default())
        .await;

    assert!(matches!(result, Err(KernelError::DataIntegrity(_))));

    // Live data is untouched and no audit row exists.
    let children = kernel.current_children(&host, &container).await;
    let titles: Vec<_> = children.iter().map(ContentBlock::label).collect();
    assert_eq!(titles, vec!["A", "B"]);
    assert!(kernel.storage.snapshot_logs(broken.id).await.unwrap().is_empty());
}

struct NoRestores;

impl AccessPolicy for NoRestores {
    fn allows(&self, action: Action, _container_id: &str) -> bool {
        action != Action::Restore
    }
}

#[tokio::test]
async fn restore_respects_the_access_policy() {
    let kernel = test_kernel_with_policy(Arc::new(NoRestores));
    let snapshot = snapshot_of_x_and_y(&kernel).await;
    let (host, container) = kernel.seed_host_and_container().await;
    kernel.seed_text_children(&host, &container, &["A"]).await;

    let request = RequestCache::new();
    let result = kernel
        .restore
        .restore(&request, &snapshot, &container, &host, RestoreRequest::default())
        .await;

    assert!(matches!(result, Err(KernelError::AccessDenied)));
    assert_eq!(kernel.current_children(&host, &container).await.len(), 1);
    assert!(kernel.storage.snapshot_logs(snapshot.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn violations_are_reported_but_do_not_block_the_restore() {
    let kernel = test_kernel();
    let (host, container) = kernel.seed_host_and_container().await;

    // A snapshot holding a text record with no title: denormalizes with a
    // violation, still restores.
    let mut snapshot = snapshot_of_x_and_y(&kernel).await;
    snapshot.blob = r#"[{"metadata":{"entityTypeId":"content_block","bundle":"text"},"data":{"body":"hello"}}]"#
        .to_string();

    let request = RequestCache::new();
    let outcome = kernel
        .restore
        .restore(&request, &snapshot, &container, &host, RestoreRequest::default())
        .await
        .unwrap();

    assert_eq!(outcome.restored, 1);
    assert_eq!(outcome.violations.len(), 1);
    assert!(outcome.violations[0].iter().any(|v| v.field == "title"));

    let children = kernel.current_children(&host, &container).await;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].field_str("body"), Some("hello"));
}
