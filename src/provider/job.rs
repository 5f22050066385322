// src/provider/job.rs

//! Value types exchanged with a compute provider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::JobDependency;
use crate::naming::JobsSummaryQuery;
use crate::types::{KeyValuePairs, ResourceRequirement};

/// Status strings after which a job will not change again.
pub const TERMINAL_STATUSES: &[&str] = &["SUCCEEDED", "FAILED"];

/// Overrides applied on top of the job definition's container settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOverrides {
    pub command: Vec<String>,
    pub environment: KeyValuePairs,
    pub resource_requirements: Vec<ResourceRequirement>,
}

/// Submission envelope for a single manifest of a single event.
///
/// `depends_on` holds vendor job ids, already resolved from manifest ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub event_id: Uuid,
    pub manifest_id: String,
    pub job_name: String,
    pub job_queue: String,
    pub job_definition: String,
    pub container_overrides: ContainerOverrides,
    pub depends_on: Vec<JobDependency>,
    pub parameters: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub retry_attempts: Option<u32>,
    /// Seconds.
    pub job_timeout: Option<u32>,
}

/// What a provider hands back for an accepted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitJobResult {
    /// Vendor-assigned job id.
    pub job_id: String,
    /// Vendor resource name (an ARN on some backends), if the vendor has one.
    pub resource_name: Option<String>,
}

/// Provider's read-only view of a submitted job.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub job_name: String,
    pub created_at: Option<i64>,
    pub started_at: Option<i64>,
    pub stopped_at: Option<i64>,
    pub status: String,
    pub status_detail: Option<String>,
    pub resource_name: String,
}

impl JobSummary {
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.status.as_str())
    }
}

/// A job known to the backend, identified for termination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorJob {
    pub job_id: String,
    pub job_name: String,
}

impl From<&JobSummary> for VendorJob {
    fn from(summary: &JobSummary) -> Self {
        Self {
            job_id: summary.job_id.clone(),
            job_name: summary.job_name.clone(),
        }
    }
}

/// Which jobs a termination request applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminateTarget {
    /// An explicit list of jobs.
    Jobs(Vec<VendorJob>),
    /// Every job matching a hierarchical query.
    Query(JobsSummaryQuery),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminateJobsInput {
    pub reason: String,
    pub job_queue: String,
    pub target: TerminateTarget,
}

/// Outcome of terminating one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminateJobOutput {
    pub job_id: String,
    pub job_name: String,
    /// `None` when the termination was accepted.
    pub error: Option<String>,
}

impl TerminateJobOutput {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
