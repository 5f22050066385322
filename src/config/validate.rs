// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ComputeFile, EventSource, RawComputeFile};
use crate::errors::{ComputeError, Result};
use crate::model::Event;

impl TryFrom<RawComputeFile> for ComputeFile {
    type Error = ComputeError;

    fn try_from(raw: RawComputeFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_compute(&raw)?;

        let events = match raw.range {
            Some(range) => EventSource::Range(range),
            None => EventSource::List(raw.events),
        };
        Ok(ComputeFile::new_unchecked(raw.compute, events, raw.plugins))
    }
}

/// Run every check against a raw compute file.
pub fn validate_raw_compute(cfg: &RawComputeFile) -> Result<()> {
    validate_compute_section(cfg)?;
    validate_event_source(cfg)?;
    validate_plugins(cfg)?;

    for event in cfg.events.iter().chain(cfg.range.as_ref().map(|r| &r.event)) {
        validate_event(event)?;
    }
    Ok(())
}

fn validate_compute_section(cfg: &RawComputeFile) -> Result<()> {
    let section = &cfg.compute;

    if section.name.trim().is_empty() {
        return Err(config_error("[compute].name must not be empty"));
    }
    if section.job_queue.trim().is_empty() {
        return Err(config_error("[compute].job_queue must not be empty"));
    }
    if section.profile.trim().is_empty() {
        return Err(config_error("[compute].profile must not be empty"));
    }
    Ok(())
}

fn validate_event_source(cfg: &RawComputeFile) -> Result<()> {
    let sources = [
        !cfg.events.is_empty(),
        cfg.range.is_some(),
        cfg.stochastic.is_some(),
    ]
    .into_iter()
    .filter(|present| *present)
    .count();

    if sources != 1 {
        return Err(config_error(format!(
            "exactly one of [[event]], [range] or [stochastic] is required (found {sources})"
        )));
    }

    if cfg.stochastic.is_some() {
        return Err(config_error(
            "[stochastic] event generation is not supported; use [[event]] or [range]",
        ));
    }

    if let Some(range) = &cfg.range {
        if range.start > range.end {
            return Err(config_error(format!(
                "[range].start ({}) must be <= [range].end ({})",
                range.start, range.end
            )));
        }
    }

    let mut ids = HashSet::new();
    for event in &cfg.events {
        if !ids.insert(event.id) {
            return Err(config_error(format!(
                "event id {} is declared more than once",
                event.id
            )));
        }
    }
    Ok(())
}

fn validate_plugins(cfg: &RawComputeFile) -> Result<()> {
    let mut names = HashSet::new();
    for plugin in &cfg.plugins {
        if plugin.name.trim().is_empty() {
            return Err(config_error("[[plugin]] entries need a name"));
        }
        if plugin.image_and_tag.trim().is_empty() {
            return Err(config_error(format!(
                "plugin '{}' has no image_and_tag",
                plugin.name
            )));
        }
        if !names.insert(plugin.name.as_str()) {
            return Err(config_error(format!(
                "plugin '{}' is declared more than once",
                plugin.name
            )));
        }
    }
    Ok(())
}

fn validate_event(event: &Event) -> Result<()> {
    if event.manifests.is_empty() {
        return Err(config_error(format!(
            "event {} must contain at least one [[event.manifest]]",
            event.id
        )));
    }

    let mut ids = HashSet::new();
    for manifest in &event.manifests {
        if manifest.manifest_id.trim().is_empty() {
            return Err(config_error(format!(
                "event {} has a manifest without manifest_id",
                event.id
            )));
        }
        if !ids.insert(manifest.manifest_id.as_str()) {
            return Err(config_error(format!(
                "event {} declares manifest '{}' more than once",
                event.id, manifest.manifest_id
            )));
        }
    }

    for manifest in &event.manifests {
        for dep in manifest.dependency_ids() {
            if dep == manifest.manifest_id {
                return Err(config_error(format!(
                    "manifest '{}' cannot depend on itself",
                    manifest.manifest_id
                )));
            }
            if !ids.contains(dep) {
                return Err(config_error(format!(
                    "manifest '{}' has unknown dependency '{}' in event {}",
                    manifest.manifest_id, dep, event.id
                )));
            }
        }
    }

    validate_dag(event)
}

fn validate_dag(event: &Event) -> Result<()> {
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for manifest in &event.manifests {
        graph.add_node(manifest.manifest_id.as_str());
    }
    for manifest in &event.manifests {
        for dep in manifest.dependency_ids() {
            graph.add_edge(dep, manifest.manifest_id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(config_error(format!(
            "cycle detected in event {} involving manifest '{}'",
            event.id,
            cycle.node_id()
        ))),
    }
}

fn config_error(msg: impl Into<String>) -> ComputeError {
    ComputeError::Config(msg.into())
}
