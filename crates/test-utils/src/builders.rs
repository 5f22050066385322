#![allow(dead_code)]

use cloudcompute::model::{ComputeManifest, Event, JobDependency};
use uuid::Uuid;

/// Plugin definition used when a test does not care which one.
pub const TEST_PLUGIN: &str = "test-plugin:1";

/// Builder for `ComputeManifest`.
pub struct ManifestBuilder {
    manifest: ComputeManifest,
}

impl ManifestBuilder {
    pub fn new(manifest_id: &str) -> Self {
        let mut manifest = ComputeManifest::new(manifest_id, TEST_PLUGIN);
        manifest.manifest_name = manifest_id.to_string();
        Self { manifest }
    }

    pub fn plugin(mut self, definition: &str) -> Self {
        self.manifest.plugin_definition = definition.to_string();
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.manifest.dependencies.push(JobDependency::new(dep));
        self
    }

    pub fn command(mut self, args: &[&str]) -> Self {
        self.manifest.command = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn env(mut self, name: &str, value: &str) -> Self {
        self.manifest.inputs.environment.push(name, value);
        self
    }

    pub fn tag(mut self, name: &str, value: &str) -> Self {
        self.manifest
            .tags
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn payload_attr(mut self, name: &str, value: serde_json::Value) -> Self {
        self.manifest
            .inputs
            .payload_attributes
            .insert(name.to_string(), value);
        self
    }

    pub fn build(self) -> ComputeManifest {
        self.manifest
    }
}

/// Builder for `Event`.
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    pub fn new() -> Self {
        Self {
            event: Event::new(Uuid::new_v4()),
        }
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            event: Event::new(id),
        }
    }

    pub fn number(mut self, event_number: i64) -> Self {
        self.event.event_number = event_number;
        self
    }

    pub fn manifest(mut self, manifest: ManifestBuilder) -> Self {
        self.event.add_manifest(manifest.build());
        self
    }

    pub fn build(self) -> Event {
        self.event
    }
}

impl Default for EventBuilder {
    fn default() -> Self {
        Self::new()
    }
}
