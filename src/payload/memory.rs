// src/payload/memory.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use uuid::Uuid;

use super::{Payload, PayloadStore};

/// Payload store that keeps serialized payloads in memory.
///
/// Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPayloadStore {
    payloads: Arc<Mutex<HashMap<Uuid, serde_json::Value>>>,
}

impl InMemoryPayloadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored payload document for `payload_id`.
    pub fn get(&self, payload_id: Uuid) -> Option<serde_json::Value> {
        self.payloads().get(&payload_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.payloads().len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads().is_empty()
    }

    fn payloads(&self) -> MutexGuard<'_, HashMap<Uuid, serde_json::Value>> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PayloadStore for InMemoryPayloadStore {
    fn set_payload(&self, payload_id: Uuid, payload: &Payload) -> Result<()> {
        let doc = serde_json::to_value(payload)
            .with_context(|| format!("serializing payload {payload_id}"))?;
        self.payloads().insert(payload_id, doc);
        Ok(())
    }
}
