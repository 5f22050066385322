// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComputeError {
    /// The provider rejected (or never received) a job submission.
    #[error(
        "failed to submit job '{job_name}' using definition '{job_definition}' on queue '{job_queue}': {reason}"
    )]
    Submission {
        job_name: String,
        job_definition: String,
        job_queue: String,
        reason: String,
    },

    /// The manifests of an event do not form a DAG.
    ///
    /// `ordered` holds the partial order computed before the cycle was hit.
    #[error("cycle detected in event {event_id}: dependency graph is not a DAG")]
    Cycle {
        event_id: String,
        ordered: Vec<String>,
    },

    #[error("unknown manifest id: {0}")]
    UnknownManifest(String),

    /// A manifest declared a dependency that has no submitted job in its event.
    #[error("manifest '{manifest_id}' depends on '{dependency}', which has not been submitted in this event")]
    MissingDependency {
        manifest_id: String,
        dependency: String,
    },

    #[error("invalid job name: {0}")]
    InvalidJobName(String),

    #[error("invalid status query: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("log unavailable for job {job_id}: {reason}")]
    LogUnavailable { job_id: String, reason: String },

    #[error("payload error for manifest '{manifest_id}': {reason}")]
    Payload { manifest_id: String, reason: String },

    #[error("compute {0} has already been run")]
    AlreadyRun(String),

    #[error("event generator has no more events")]
    GeneratorExhausted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ComputeError {
    /// Build a [`ComputeError::Submission`] for the given job.
    pub fn submission(job: &crate::provider::Job, reason: impl Into<String>) -> Self {
        ComputeError::Submission {
            job_name: job.job_name.clone(),
            job_definition: job.job_definition.clone(),
            job_queue: job.job_queue.clone(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ComputeError>;
