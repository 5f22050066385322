// src/engine/mod.rs

//! Orchestration engine.
//!
//! This module ties together:
//! - an event generator (where the work comes from)
//! - a compute provider (where the work goes)
//! - the manifest-id to vendor-id bookkeeping that lets later manifests
//!   depend on earlier ones
//!
//! Turning a manifest into a submittable [`Job`](crate::provider::Job) is
//! pure and lives in [`plan`]; the async shell that talks to the provider is
//! [`compute::Compute`].

use std::collections::HashMap;
use std::fmt;

use crate::provider::SubmitJobResult;

pub mod compute;
pub mod plan;

pub use compute::Compute;
pub use plan::{build_job, job_environment, resolve_dependencies, JobContext};

/// Environment key carrying the manifest id.
pub const CC_MANIFEST_ID: &str = "CC_MANIFEST_ID";
/// Environment key carrying the event id.
pub const CC_EVENT_IDENTIFIER: &str = "CC_EVENT_IDENTIFIER";
/// Environment key carrying the event number. Manifests may set their own.
pub const CC_EVENT_NUMBER: &str = "CC_EVENT_NUMBER";
/// Environment key carrying the job definition (`name:revision`).
pub const CC_PLUGIN_DEFINITION: &str = "CC_PLUGIN_DEFINITION";
/// Environment key carrying the staged payload id.
pub const CC_PAYLOAD_ID: &str = "CC_PAYLOAD_ID";
/// Job tag carrying the staged payload id.
pub const PAYLOAD_ID_TAG: &str = "payload_id";

/// Manifest id to the provider's answer for its most recent submission.
pub type SubmissionIdMap = HashMap<String, SubmitJobResult>;

/// Lifecycle of a single [`Compute::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Submitting,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::NotStarted => "not started",
            RunState::Submitting => "submitting",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}
