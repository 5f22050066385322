// src/model/event.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::dag::{sort_nodes, CycleDetected};
use crate::errors::{ComputeError, Result};
use crate::model::manifest::ComputeManifest;

/// One pass through the DAG of manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub event_number: i64,
    #[serde(default, alias = "manifest")]
    pub manifests: Vec<ComputeManifest>,
}

impl Default for Event {
    fn default() -> Self {
        Self::new(Uuid::new_v4())
    }
}

impl Event {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            event_number: 0,
            manifests: Vec::new(),
        }
    }

    pub fn add_manifest(&mut self, manifest: ComputeManifest) {
        self.manifests.push(manifest);
    }

    /// Insert a manifest at `index`; indices past the end append.
    pub fn add_manifest_at(&mut self, manifest: ComputeManifest, index: usize) {
        let index = index.min(self.manifests.len());
        self.manifests.insert(index, manifest);
    }

    pub fn manifest(&self, manifest_id: &str) -> Option<&ComputeManifest> {
        self.manifests.iter().find(|m| m.manifest_id == manifest_id)
    }

    /// Check that manifest ids are unique and every dependency names a
    /// manifest of this event.
    pub fn validate_dependencies(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for manifest in &self.manifests {
            if !ids.insert(manifest.manifest_id.as_str()) {
                return Err(ComputeError::Config(format!(
                    "event {} contains manifest id '{}' more than once",
                    self.id, manifest.manifest_id
                )));
            }
        }

        for manifest in &self.manifests {
            for dep in manifest.dependency_ids() {
                if !ids.contains(dep) {
                    return Err(ComputeError::MissingDependency {
                        manifest_id: manifest.manifest_id.clone(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Manifest ids in dependency order.
    pub fn topo_sort(&self) -> Result<Vec<String>> {
        self.validate_dependencies()?;
        sort_nodes(&self.manifests).map_err(|CycleDetected { ordered, .. }| {
            ComputeError::Cycle {
                event_id: self.id.to_string(),
                ordered,
            }
        })
    }

    /// Re-linearize the manifests so each one follows its dependencies.
    ///
    /// Events with zero or one manifest are returned untouched.
    pub fn into_ordered(mut self) -> Result<Self> {
        if self.manifests.len() <= 1 {
            return Ok(self);
        }

        let order = self.topo_sort()?;
        let mut remaining = std::mem::take(&mut self.manifests);
        let mut ordered = Vec::with_capacity(remaining.len());

        for id in order {
            if let Some(pos) = remaining.iter().position(|m| m.manifest_id == id) {
                ordered.push(remaining.swap_remove(pos));
            }
        }

        debug!(
            event_id = %self.id,
            order = ?ordered.iter().map(|m| m.manifest_id.as_str()).collect::<Vec<_>>(),
            "event manifests ordered"
        );

        self.manifests = ordered;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::manifest::JobDependency;

    fn manifest(id: &str, deps: &[&str]) -> ComputeManifest {
        let mut m = ComputeManifest::new(id, "plugin:1");
        m.dependencies = deps.iter().map(|d| JobDependency::new(*d)).collect();
        m
    }

    fn position(event: &Event, id: &str) -> usize {
        event
            .manifests
            .iter()
            .position(|m| m.manifest_id == id)
            .unwrap()
    }

    #[test]
    fn five_manifest_event_is_ordered_by_dependencies() {
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(manifest("3", &["2"]));
        event.add_manifest(manifest("4", &["1", "3"]));
        event.add_manifest(manifest("5", &["2", "3"]));
        event.add_manifest(manifest("1", &[]));
        event.add_manifest(manifest("2", &["1"]));

        let ordered = event.into_ordered().unwrap();

        assert_eq!(ordered.manifests.len(), 5);
        assert!(position(&ordered, "1") < position(&ordered, "2"));
        assert!(position(&ordered, "2") < position(&ordered, "3"));
        assert!(position(&ordered, "3") < position(&ordered, "4"));
        assert!(position(&ordered, "1") < position(&ordered, "4"));
        assert!(position(&ordered, "3") < position(&ordered, "5"));
    }

    #[test]
    fn cycle_is_reported_with_event_id() {
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(manifest("a", &["b"]));
        event.add_manifest(manifest("b", &["a"]));
        let id = event.id.to_string();

        match event.into_ordered() {
            Err(ComputeError::Cycle { event_id, ordered }) => {
                assert_eq!(event_id, id);
                assert!(ordered.is_empty());
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn dependency_outside_event_is_rejected() {
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(manifest("a", &[]));
        event.add_manifest(manifest("b", &["elsewhere"]));

        let err = event.topo_sort().unwrap_err();
        assert!(matches!(
            err,
            ComputeError::MissingDependency { ref dependency, .. } if dependency == "elsewhere"
        ));
    }

    #[test]
    fn duplicate_manifest_ids_are_rejected() {
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(manifest("a", &[]));
        event.add_manifest(manifest("a", &[]));
        assert!(matches!(event.topo_sort(), Err(ComputeError::Config(_))));
    }

    #[test]
    fn single_manifest_event_skips_sorting() {
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(manifest("only", &["ghost"]));
        let ordered = event.clone().into_ordered().unwrap();
        assert_eq!(ordered, event);
    }

    #[test]
    fn add_manifest_at_inserts_and_clamps() {
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(manifest("a", &[]));
        event.add_manifest(manifest("c", &[]));
        event.add_manifest_at(manifest("b", &[]), 1);
        event.add_manifest_at(manifest("z", &[]), 99);

        let ids: Vec<_> = event.manifests.iter().map(|m| m.manifest_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "z"]);
    }
}
