// src/model/plugin.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::KeyValuePairs;

/// A reusable job-definition template.
///
/// Credentials are references in the provider's own format (for example a
/// secret-store resource name), never literal secrets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub name: String,
    pub image_and_tag: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub compute_environment: PluginComputeEnvironment,
    /// Default values for the container environment.
    #[serde(default)]
    pub environment: KeyValuePairs,
    #[serde(default)]
    pub volumes: Vec<PluginComputeVolume>,
    #[serde(default)]
    pub credentials: KeyValuePairs,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub retry_attempts: Option<u32>,
    /// Seconds.
    #[serde(default)]
    pub execution_timeout: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginComputeEnvironment {
    pub vcpu: String,
    pub memory: String,
}

impl Default for PluginComputeEnvironment {
    fn default() -> Self {
        Self {
            vcpu: "1".to_string(),
            memory: "2048".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginComputeVolume {
    pub name: String,
    #[serde(default)]
    pub resource_name: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_mount_point")]
    pub mount_point: String,
}

fn default_mount_point() -> String {
    "/data".to_string()
}

/// Result of registering a [`Plugin`] with a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRegistrationOutput {
    pub name: String,
    pub resource_name: String,
    pub revision: u32,
}

impl PluginRegistrationOutput {
    /// `name:revision`, the form manifests use in `plugin_definition`.
    pub fn definition(&self) -> String {
        format!("{}:{}", self.name, self.revision)
    }
}
