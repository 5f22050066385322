// src/model/mod.rs

//! Data model for computes: manifests, events, plugins and the data
//! declarations that travel with them.

pub mod data;
pub mod event;
pub mod manifest;
pub mod plugin;

pub use data::{Action, DataSource, DataStore, PayloadAttributes};
pub use event::Event;
pub use manifest::{ComputeManifest, JobDependency, PluginInputs};
pub use plugin::{Plugin, PluginComputeEnvironment, PluginComputeVolume, PluginRegistrationOutput};
