//! Codec registry.
//!
//! Maps `entity_type.bundle` keys to registered codecs. Populated once at
//! process start. Lookup misses are not errors: they are how callers ask
//! "is this block type snapshot-capable at all".

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use crate::error::{KernelError, KernelResult};
use crate::snapshot::codec::Codec;

/// Registry of snapshot codecs, keyed `entity_type.bundle`.
#[derive(Default)]
pub struct CodecRegistry {
    codecs: DashMap<String, Arc<dyn Codec>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec, failing fast on configuration defects: a missing
    /// entity type or bundle (the key depends on both), a placeholder or
    /// unparseable version, or a key already taken.
    pub fn register(&self, codec: Arc<dyn Codec>) -> KernelResult<()> {
        if codec.entity_type_id().is_empty() {
            return Err(KernelError::Configuration(
                "codec declares no entity type".to_string(),
            ));
        }
        if codec.bundle().is_empty() {
            return Err(KernelError::Configuration(format!(
                "codec for entity type `{}` declares no bundle",
                codec.entity_type_id()
            )));
        }

        // Version guard, before the codec becomes reachable.
        codec.version()?;

        let key = codec.key();
        match self.codecs.entry(key.clone()) {
            Entry::Occupied(_) => Err(KernelError::Configuration(format!(
                "a codec is already registered for `{key}`"
            ))),
            Entry::Vacant(entry) => {
                entry.insert(codec);
                info!(key = %key, "snapshot codec registered");
                Ok(())
            }
        }
    }

    /// Exact-match lookup. `None` means the pair is not snapshot-capable.
    pub fn get(&self, entity_type_id: &str, bundle: &str) -> Option<Arc<dyn Codec>> {
        self.codecs
            .get(&format!("{entity_type_id}.{bundle}"))
            .map(|entry| entry.value().clone())
    }

    /// Whether a codec is registered for the pair.
    pub fn has(&self, entity_type_id: &str, bundle: &str) -> bool {
        self.codecs
            .contains_key(&format!("{entity_type_id}.{bundle}"))
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
