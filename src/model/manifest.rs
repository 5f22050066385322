// src/model/manifest.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dag::TopoSortable;
use crate::model::data::{Action, DataSource, DataStore, PayloadAttributes};
use crate::types::{KeyValuePairs, ResourceRequirement};

/// A dependency edge.
///
/// Inside a manifest `job_id` is the manifest id of the dependency; on a
/// submitted job it is the vendor job id the dependency resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobDependency {
    pub job_id: String,
}

impl JobDependency {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

/// Job-level inputs injected into the container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginInputs {
    #[serde(default)]
    pub environment: KeyValuePairs,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub payload_attributes: PayloadAttributes,
}

/// A single unit of work in an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeManifest {
    #[serde(default)]
    pub manifest_name: String,
    pub manifest_id: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<JobDependency>,
    #[serde(default)]
    pub stores: Vec<DataStore>,
    #[serde(default)]
    pub inputs: PluginInputs,
    #[serde(default)]
    pub outputs: Vec<DataSource>,
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Registered job definition, `name:revision`.
    pub plugin_definition: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub retry_attempts: Option<u32>,
    /// Per-attempt timeout in seconds.
    #[serde(default)]
    pub job_timeout: Option<u32>,
    #[serde(default)]
    pub resource_requirements: Vec<ResourceRequirement>,
    /// Set once the payload for this manifest has been staged.
    #[serde(default, skip_deserializing)]
    pub payload_id: Option<Uuid>,
}

impl ComputeManifest {
    pub fn new(manifest_id: impl Into<String>, plugin_definition: impl Into<String>) -> Self {
        Self {
            manifest_id: manifest_id.into(),
            plugin_definition: plugin_definition.into(),
            ..Self::default()
        }
    }

    /// Manifest ids this manifest depends on.
    pub fn dependency_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(|d| d.job_id.as_str())
    }

    /// Whether this manifest carries inputs that must be staged out-of-band.
    pub fn needs_payload(&self) -> bool {
        !self.inputs.payload_attributes.is_empty() || !self.inputs.data_sources.is_empty()
    }
}

impl TopoSortable<String> for ComputeManifest {
    fn node(&self) -> String {
        self.manifest_id.clone()
    }

    fn deps(&self) -> Vec<String> {
        self.dependency_ids().map(str::to_string).collect()
    }
}
