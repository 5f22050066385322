use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use cloudcompute::errors::{ComputeError, Result};
use cloudcompute::model::{Plugin, PluginRegistrationOutput};
use cloudcompute::naming::JobsSummaryQuery;
use cloudcompute::provider::{
    BoxFuture, ComputeProvider, InMemoryProvider, Job, SubmitJobResult, SummarySink, VendorJob,
};

/// A provider that:
/// - records the name of every job it is asked to submit
/// - rejects the n-th submission (1-based) when told to
/// - forwards everything else to an `InMemoryProvider`.
#[derive(Debug, Clone)]
pub struct FlakyProvider {
    inner: InMemoryProvider,
    fail_on: Option<usize>,
    attempts: Arc<AtomicUsize>,
    attempted: Arc<Mutex<Vec<String>>>,
}

impl FlakyProvider {
    pub fn new(inner: InMemoryProvider) -> Self {
        Self {
            inner,
            fail_on: None,
            attempts: Arc::new(AtomicUsize::new(0)),
            attempted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail the `n`-th submission (1-based) with a non-submission error.
    pub fn fail_on_submission(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    pub fn inner(&self) -> &InMemoryProvider {
        &self.inner
    }

    /// Job names of every submission attempt, including the failed one.
    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }
}

impl ComputeProvider for FlakyProvider {
    fn submit_job<'a>(&'a self, job: &'a Job) -> BoxFuture<'a, Result<SubmitJobResult>> {
        Box::pin(async move {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.attempted.lock().unwrap().push(job.job_name.clone());

            if self.fail_on == Some(attempt) {
                warn!(attempt, job_name = %job.job_name, "rejecting submission");
                return Err(ComputeError::Other(anyhow::anyhow!(
                    "injected failure on submission {attempt}"
                )));
            }
            self.inner.submit_job(job).await
        })
    }

    fn status_batches<'a>(
        &'a self,
        job_queue: &'a str,
        query: &'a JobsSummaryQuery,
        on_batch: &'a mut SummarySink<'_>,
    ) -> BoxFuture<'a, Result<()>> {
        self.inner.status_batches(job_queue, query, on_batch)
    }

    fn job_log<'a>(&'a self, vendor_job_id: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
        self.inner.job_log(vendor_job_id)
    }

    fn terminate_job<'a>(
        &'a self,
        job: &'a VendorJob,
        reason: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        self.inner.terminate_job(job, reason)
    }

    fn register_plugin<'a>(
        &'a self,
        plugin: &'a Plugin,
    ) -> BoxFuture<'a, Result<PluginRegistrationOutput>> {
        self.inner.register_plugin(plugin)
    }

    fn unregister_plugin<'a>(&'a self, name_and_revision: &'a str) -> BoxFuture<'a, Result<()>> {
        self.inner.unregister_plugin(name_and_revision)
    }
}
