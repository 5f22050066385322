// src/payload/mod.rs

//! Out-of-band payload staging.
//!
//! Large job inputs are not passed on the submission itself. Instead each
//! manifest that declares payload attributes or data sources gets a payload
//! id, its [`Payload`] is written to a [`PayloadStore`] under that id, and
//! the id travels with the job (environment + tag) so the container can
//! fetch it.

use std::fmt::Debug;

use anyhow::Result as AnyResult;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::{ComputeError, Result};
use crate::model::{Action, ComputeManifest, DataSource, DataStore, PayloadAttributes};

pub mod memory;

pub use memory::InMemoryPayloadStore;

/// Everything a job needs to locate its data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub attributes: PayloadAttributes,
    pub stores: Vec<DataStore>,
    pub inputs: Vec<DataSource>,
    pub outputs: Vec<DataSource>,
    pub actions: Vec<Action>,
}

impl Payload {
    pub fn from_manifest(manifest: &ComputeManifest) -> Self {
        Self {
            attributes: manifest.inputs.payload_attributes.clone(),
            stores: manifest.stores.clone(),
            inputs: manifest.inputs.data_sources.clone(),
            outputs: manifest.outputs.clone(),
            actions: manifest.actions.clone(),
        }
    }
}

/// Abstract payload store.
pub trait PayloadStore: Send + Sync + Debug {
    fn set_payload(&self, payload_id: Uuid, payload: &Payload) -> AnyResult<()>;
}

/// Stage the payload of every manifest that needs one and has not been
/// staged yet. Returns how many payloads were written.
///
/// Already-staged manifests keep their id, so calling this twice on the
/// same manifests writes nothing the second time.
pub fn stage_payloads(
    manifests: &mut [ComputeManifest],
    store: Option<&dyn PayloadStore>,
) -> Result<usize> {
    let mut staged = 0;

    for manifest in manifests.iter_mut() {
        if !manifest.needs_payload() || manifest.payload_id.is_some() {
            continue;
        }

        let store = store.ok_or_else(|| ComputeError::Payload {
            manifest_id: manifest.manifest_id.clone(),
            reason: "manifest declares payload inputs but no payload store is configured"
                .to_string(),
        })?;

        let payload_id = Uuid::new_v4();
        let payload = Payload::from_manifest(manifest);
        store
            .set_payload(payload_id, &payload)
            .map_err(|e| ComputeError::Payload {
                manifest_id: manifest.manifest_id.clone(),
                reason: format!("{e:#}"),
            })?;

        debug!(
            manifest_id = %manifest.manifest_id,
            %payload_id,
            inputs = payload.inputs.len(),
            outputs = payload.outputs.len(),
            "payload written"
        );

        manifest.payload_id = Some(payload_id);
        staged += 1;
    }

    if staged > 0 {
        info!(staged, "staged manifest payloads");
    }

    Ok(staged)
}
