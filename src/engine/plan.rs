// src/engine/plan.rs

//! Pure job planning.
//!
//! Everything here is synchronous and deterministic: given an event, one of
//! its manifests and the vendor ids already assigned in that event, produce
//! the job to submit. No provider, no Tokio.

use std::collections::HashMap;

use tracing::trace;
use uuid::Uuid;

use crate::errors::{ComputeError, Result};
use crate::model::{ComputeManifest, Event, JobDependency};
use crate::naming::job_name;
use crate::provider::{ContainerOverrides, Job};
use crate::types::KeyValuePairs;

use super::{
    CC_EVENT_IDENTIFIER, CC_EVENT_NUMBER, CC_MANIFEST_ID, CC_PAYLOAD_ID, CC_PLUGIN_DEFINITION,
    PAYLOAD_ID_TAG,
};

/// Run-wide identifiers every job of a compute shares.
#[derive(Debug, Clone, Copy)]
pub struct JobContext<'a> {
    pub compute_id: Uuid,
    pub profile: &'a str,
    pub job_queue: &'a str,
}

/// Container environment for `manifest`: its declared entries followed by
/// the injected identifiers.
pub fn job_environment(manifest: &ComputeManifest, event: &Event) -> KeyValuePairs {
    let mut env = manifest.inputs.environment.clone();

    env.push(CC_MANIFEST_ID, manifest.manifest_id.as_str());
    env.push(CC_EVENT_IDENTIFIER, event.id.to_string());
    if !env.has_key(CC_EVENT_NUMBER) {
        env.push(CC_EVENT_NUMBER, event.event_number.to_string());
    }
    env.push(CC_PLUGIN_DEFINITION, manifest.plugin_definition.as_str());
    if let Some(payload_id) = manifest.payload_id {
        env.push(CC_PAYLOAD_ID, payload_id.to_string());
    }

    env
}

/// Map each declared dependency (a manifest id) to the vendor id it was
/// submitted as. `resolved` only holds manifests of the current event.
pub fn resolve_dependencies(
    manifest: &ComputeManifest,
    resolved: &HashMap<String, String>,
) -> Result<Vec<JobDependency>> {
    manifest
        .dependency_ids()
        .map(|dep| {
            resolved
                .get(dep)
                .map(JobDependency::new)
                .ok_or_else(|| ComputeError::MissingDependency {
                    manifest_id: manifest.manifest_id.clone(),
                    dependency: dep.to_string(),
                })
        })
        .collect()
}

/// Build the submission envelope for one manifest of one event.
pub fn build_job(
    ctx: JobContext<'_>,
    event: &Event,
    manifest: &ComputeManifest,
    resolved: &HashMap<String, String>,
) -> Result<Job> {
    let depends_on = resolve_dependencies(manifest, resolved)?;

    let mut tags = manifest.tags.clone();
    if let Some(payload_id) = manifest.payload_id {
        tags.insert(PAYLOAD_ID_TAG.to_string(), payload_id.to_string());
    }

    let job = Job {
        event_id: event.id,
        manifest_id: manifest.manifest_id.clone(),
        job_name: job_name(
            ctx.profile,
            &ctx.compute_id.to_string(),
            &event.id.to_string(),
            &manifest.manifest_id,
        ),
        job_queue: ctx.job_queue.to_string(),
        job_definition: manifest.plugin_definition.clone(),
        container_overrides: ContainerOverrides {
            command: manifest.command.clone(),
            environment: job_environment(manifest, event),
            resource_requirements: manifest.resource_requirements.clone(),
        },
        depends_on,
        parameters: manifest.inputs.parameters.clone(),
        tags,
        retry_attempts: manifest.retry_attempts,
        job_timeout: manifest.job_timeout,
    };

    trace!(job_name = %job.job_name, depends_on = ?job.depends_on, "job planned");
    Ok(job)
}
