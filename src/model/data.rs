// src/model/data.rs

//! Data declarations that travel with a manifest to the payload store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form attributes handed to a job through its payload.
pub type PayloadAttributes = BTreeMap<String, serde_json::Value>;

/// A named input or output location, resolved against a [`DataStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    #[serde(default)]
    pub data_paths: BTreeMap<String, String>,
}

/// A storage backend a job can read from or write to.
///
/// `profile` is the credential prefix the job uses to find its credentials
/// in the container environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataStore {
    pub name: String,
    pub store_type: String,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// An action the job should perform with its inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}
