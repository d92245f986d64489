#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test harness.
//!
//! Wires the real kernel services over the in-memory storage backend, with
//! the shipped codecs registered and a permissive access policy unless a
//! test installs its own.

#![allow(dead_code)]

use std::sync::Arc;

use tessera_kernel::access::{AccessPolicy, AllowAll};
use tessera_kernel::cache::CacheLayer;
use tessera_kernel::content::{ChildService, ContentManager, RequestCache};
use tessera_kernel::models::{Container, ContentBlock, HostEntity};
use tessera_kernel::snapshot::{
    CodecRegistry, GalleryCodec, RestoreOrchestrator, SnapshotService, TextCodec,
};
use tessera_kernel::storage::{ContentStorage, MemoryStorage};

pub const TEST_SECRET: &str = "tessera-test-secret";
pub const TEST_ENVIRONMENT: &str = "test";

/// Everything a test needs, wired over one shared in-memory storage.
pub struct TestKernel {
    pub storage: Arc<MemoryStorage>,
    pub registry: Arc<CodecRegistry>,
    pub service: Arc<SnapshotService>,
    pub manager: Arc<ContentManager>,
    pub children: ChildService,
    pub restore: RestoreOrchestrator,
}

/// Build a kernel with the default secret and a permissive access policy.
pub fn test_kernel() -> TestKernel {
    build_kernel(TEST_SECRET, Arc::new(AllowAll))
}

/// Build a kernel with a custom access policy.
pub fn test_kernel_with_policy(policy: Arc<dyn AccessPolicy>) -> TestKernel {
    build_kernel(TEST_SECRET, policy)
}

/// Build a kernel signing with a different secret (cross-environment tests).
pub fn test_kernel_with_secret(secret: &str) -> TestKernel {
    build_kernel(secret, Arc::new(AllowAll))
}

fn build_kernel(secret: &str, policy: Arc<dyn AccessPolicy>) -> TestKernel {
    let storage = Arc::new(MemoryStorage::new());
    let dyn_storage: Arc<dyn ContentStorage> = storage.clone();

    let registry = Arc::new(CodecRegistry::new());
    registry.register(Arc::new(TextCodec)).unwrap();
    registry.register(Arc::new(GalleryCodec)).unwrap();

    let manager = Arc::new(ContentManager::new(
        dyn_storage.clone(),
        CacheLayer::new(1024),
    ));
    let service = Arc::new(SnapshotService::new(
        registry.clone(),
        TEST_ENVIRONMENT,
        secret,
    ));

    let children = ChildService::new(dyn_storage.clone(), manager.clone(), policy.clone());
    let restore = RestoreOrchestrator::new(dyn_storage, manager.clone(), service.clone(), policy);

    TestKernel {
        storage,
        registry,
        service,
        manager,
        children,
        restore,
    }
}

impl TestKernel {
    /// Seed a container and a matching English host.
    pub async fn seed_host_and_container(&self) -> (HostEntity, Container) {
        let container = tessera_test_utils::test_container("main");
        self.storage.save_container(&container).await.unwrap();

        let host = tessera_test_utils::test_host("page", "1");
        self.storage.save_host(&host).await.unwrap();

        (host, container)
    }

    /// Persist attached text blocks with weights 1..=n, in order.
    pub async fn seed_text_children(
        &self,
        host: &HostEntity,
        container: &Container,
        titles: &[&str],
    ) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        for (i, title) in titles.iter().enumerate() {
            let block = tessera_test_utils::text_block(title)
                .attached(host, container)
                .with_weight(i as i32 + 1)
                .build();
            self.storage.save_block(&block).await.unwrap();
            blocks.push(block);
        }
        blocks
    }

    /// Current children of the host, through a fresh request context.
    pub async fn current_children(
        &self,
        host: &HostEntity,
        container: &Container,
    ) -> Vec<ContentBlock> {
        let request = RequestCache::new();
        self.manager
            .get_content(&request, host, &container.id)
            .await
            .unwrap()
    }
}
