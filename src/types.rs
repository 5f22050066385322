use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single `name = value` entry of a container environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub name: String,
    pub value: String,
}

impl KeyValuePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered list of environment entries.
///
/// Order is preserved because backends pass the list through verbatim and
/// later entries may shadow earlier ones inside the container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValuePairs(pub Vec<KeyValuePair>);

impl KeyValuePairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.0.iter().any(|kv| kv.name == name)
    }

    /// First value recorded for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|kv| kv.name == name)
            .map(|kv| kv.value.as_str())
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(KeyValuePair::new(name, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyValuePair> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<KeyValuePair> for KeyValuePairs {
    fn from_iter<I: IntoIterator<Item = KeyValuePair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for KeyValuePairs {
    type Item = KeyValuePair;
    type IntoIter = std::vec::IntoIter<KeyValuePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Kind of resource a job may request from the compute environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceType {
    Gpu,
    Vcpu,
    Memory,
    #[serde(rename = "ATTACHEDSTORAGE")]
    AttachedStorage,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceType::Gpu => "GPU",
            ResourceType::Vcpu => "VCPU",
            ResourceType::Memory => "MEMORY",
            ResourceType::AttachedStorage => "ATTACHEDSTORAGE",
        };
        f.write_str(s)
    }
}

impl FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GPU" => Ok(ResourceType::Gpu),
            "VCPU" => Ok(ResourceType::Vcpu),
            "MEMORY" => Ok(ResourceType::Memory),
            "ATTACHEDSTORAGE" => Ok(ResourceType::AttachedStorage),
            other => Err(format!(
                "invalid resource type: {other} (expected GPU, VCPU, MEMORY or ATTACHEDSTORAGE)"
            )),
        }
    }
}

/// A single resource request, e.g. `{ type = "MEMORY", value = "2048" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirement {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub value: String,
}

/// Granularity of a hierarchical status / termination query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryLevel {
    Compute,
    Event,
    Manifest,
}

impl fmt::Display for QueryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryLevel::Compute => "COMPUTE",
            QueryLevel::Event => "EVENT",
            QueryLevel::Manifest => "MANIFEST",
        };
        f.write_str(s)
    }
}

impl FromStr for QueryLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMPUTE" => Ok(QueryLevel::Compute),
            "EVENT" => Ok(QueryLevel::Event),
            "MANIFEST" => Ok(QueryLevel::Manifest),
            other => Err(format!(
                "invalid query level: {other} (expected COMPUTE, EVENT or MANIFEST)"
            )),
        }
    }
}
