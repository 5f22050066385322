// src/provider/mod.rs

//! Pluggable compute provider abstraction.
//!
//! The orchestrator talks to a `ComputeProvider` instead of any vendor API.
//! Backend adapters (a managed batch queue, a local container runner, ...)
//! implement this trait; the core never depends on a concrete backend.
//!
//! Status is delivered page by page through a caller-supplied callback
//! ([`ComputeProvider::status_batches`]) so arbitrarily large result sets
//! never need to be buffered. [`ComputeProvider::status`] is the collecting
//! shape for callers that want everything at once.
//!
//! - [`job`] holds the value types crossing this boundary.
//! - [`memory`] provides `InMemoryProvider`, a backend that records jobs
//!   instead of running them.

use std::future::Future;
use std::pin::Pin;

use tracing::warn;

use crate::errors::Result;
use crate::model::{Plugin, PluginRegistrationOutput};
use crate::naming::JobsSummaryQuery;

pub mod job;
pub mod memory;

pub use job::{
    ContainerOverrides, Job, JobSummary, SubmitJobResult, TerminateJobOutput, TerminateJobsInput,
    TerminateTarget, VendorJob, TERMINAL_STATUSES,
};
pub use memory::InMemoryProvider;

/// Boxed future returned by provider operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Receives one page of job summaries.
pub type SummarySink<'s> = dyn FnMut(Vec<JobSummary>) + Send + 's;

/// Receives the outcome of each individual termination.
pub type TerminationSink<'s> = dyn FnMut(TerminateJobOutput) + Send + 's;

/// Trait abstracting a vendor backend that accepts, tracks and terminates jobs.
pub trait ComputeProvider: Send + Sync {
    /// Submit a fully populated job.
    ///
    /// Failures should be reported as
    /// [`ComputeError::Submission`](crate::errors::ComputeError::Submission).
    fn submit_job<'a>(&'a self, job: &'a Job) -> BoxFuture<'a, Result<SubmitJobResult>>;

    /// Stream the summaries of every job in `job_queue` matching `query`,
    /// calling `on_batch` once per page until the backend has no more.
    fn status_batches<'a>(
        &'a self,
        job_queue: &'a str,
        query: &'a JobsSummaryQuery,
        on_batch: &'a mut SummarySink<'_>,
    ) -> BoxFuture<'a, Result<()>>;

    /// Ordered, timestamp-prefixed log lines of a job.
    ///
    /// Fails with `NotFound` for unknown ids and `LogUnavailable` when the
    /// log store cannot be reached.
    fn job_log<'a>(&'a self, vendor_job_id: &'a str) -> BoxFuture<'a, Result<Vec<String>>>;

    /// Terminate a single job.
    fn terminate_job<'a>(&'a self, job: &'a VendorJob, reason: &'a str)
    -> BoxFuture<'a, Result<()>>;

    /// Register a job-definition template.
    fn register_plugin<'a>(
        &'a self,
        plugin: &'a Plugin,
    ) -> BoxFuture<'a, Result<PluginRegistrationOutput>>;

    /// Remove a job definition, addressed as `name:revision`.
    fn unregister_plugin<'a>(&'a self, name_and_revision: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Collect every page of [`status_batches`](Self::status_batches).
    fn status<'a>(
        &'a self,
        job_queue: &'a str,
        query: &'a JobsSummaryQuery,
    ) -> BoxFuture<'a, Result<Vec<JobSummary>>> {
        Box::pin(async move {
            let mut summaries = Vec::new();
            let mut collect = |batch: Vec<JobSummary>| summaries.extend(batch);
            self.status_batches(job_queue, query, &mut collect).await?;
            Ok(summaries)
        })
    }

    /// Terminate an explicit job list, or every job a query matches.
    ///
    /// Each outcome goes to `on_terminated`; a failure on one job does not
    /// stop the rest. Only a failure to discover the jobs is returned.
    fn terminate_jobs<'a>(
        &'a self,
        input: &'a TerminateJobsInput,
        on_terminated: &'a mut TerminationSink<'_>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let jobs: Vec<VendorJob> = match &input.target {
                TerminateTarget::Jobs(jobs) => jobs.clone(),
                TerminateTarget::Query(query) => self
                    .status(&input.job_queue, query)
                    .await?
                    .iter()
                    .map(VendorJob::from)
                    .collect(),
            };

            for job in &jobs {
                let error = self
                    .terminate_job(job, &input.reason)
                    .await
                    .err()
                    .map(|e| e.to_string());

                if let Some(ref err) = error {
                    warn!(
                        job_id = %job.job_id,
                        job_name = %job.job_name,
                        error = %err,
                        "failed to terminate job; continuing with the rest"
                    );
                }

                on_terminated(TerminateJobOutput {
                    job_id: job.job_id.clone(),
                    job_name: job.job_name.clone(),
                    error,
                });
            }

            Ok(())
        })
    }
}
