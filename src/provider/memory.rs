// src/provider/memory.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};
use uuid::Uuid;

use super::{BoxFuture, ComputeProvider, Job, JobSummary, SubmitJobResult, SummarySink, VendorJob};
use crate::errors::{ComputeError, Result};
use crate::model::{Plugin, PluginRegistrationOutput};
use crate::naming::JobsSummaryQuery;

/// Summaries delivered per status page.
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Default)]
struct ProviderState {
    /// Accepted jobs in submission order, paired with their vendor id.
    jobs: Vec<(String, Job)>,
    summaries: HashMap<String, JobSummary>,
    logs: HashMap<String, Vec<String>>,
    log_store_offline: bool,
    /// Registered definitions keyed by `name:revision`.
    plugins: BTreeMap<String, Plugin>,
    revisions: HashMap<String, u32>,
}

/// Provider that accepts jobs and tracks them in memory without running
/// anything.
///
/// Every accepted job starts in `SUBMITTED`; tests and callers move it along
/// with [`set_status`](Self::set_status). Clones share the same state.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    state: Arc<Mutex<ProviderState>>,
    batch_size: usize,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState::default())),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Change the status page size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Accepted jobs in submission order.
    pub fn jobs(&self) -> Vec<Job> {
        self.state().jobs.iter().map(|(_, job)| job.clone()).collect()
    }

    /// Accepted jobs in submission order, with their vendor ids.
    pub fn submissions(&self) -> Vec<(String, Job)> {
        self.state().jobs.clone()
    }

    /// Vendor id of the latest job submitted as `job_name`.
    ///
    /// Templated events reuse one event id, so several jobs can share a name.
    pub fn vendor_id_of(&self, job_name: &str) -> Option<String> {
        self.state()
            .jobs
            .iter()
            .rev()
            .find(|(_, job)| job.job_name == job_name)
            .map(|(id, _)| id.clone())
    }

    pub fn summary(&self, vendor_job_id: &str) -> Option<JobSummary> {
        self.state().summaries.get(vendor_job_id).cloned()
    }

    /// Move a job to a new status, stamping start / stop times.
    pub fn set_status(&self, vendor_job_id: &str, status: &str) -> Result<()> {
        let mut state = self.state();
        let summary = state
            .summaries
            .get_mut(vendor_job_id)
            .ok_or_else(|| ComputeError::NotFound(format!("job {vendor_job_id}")))?;

        let now = now_millis();
        summary.status = status.to_string();
        match status {
            "RUNNING" => {
                summary.started_at.get_or_insert(now);
            }
            "SUCCEEDED" | "FAILED" => {
                summary.started_at.get_or_insert(now);
                summary.stopped_at = Some(now);
            }
            _ => {}
        }
        Ok(())
    }

    /// Replace the log lines of a job.
    pub fn set_log(&self, vendor_job_id: &str, lines: Vec<String>) {
        self.state().logs.insert(vendor_job_id.to_string(), lines);
    }

    /// Simulate the log store going away (or coming back).
    pub fn set_log_store_online(&self, online: bool) {
        self.state().log_store_offline = !online;
    }

    /// Registered definitions as `name:revision`.
    pub fn registered_plugins(&self) -> Vec<String> {
        self.state().plugins.keys().cloned().collect()
    }

    fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accept(&self, job: &Job) -> Result<SubmitJobResult> {
        let mut state = self.state();

        for dep in &job.depends_on {
            if !state.summaries.contains_key(&dep.job_id) {
                return Err(ComputeError::submission(
                    job,
                    format!("dependency {} is not a known job", dep.job_id),
                ));
            }
        }

        let job_id = Uuid::new_v4().to_string();
        let resource_name = format!("local:{}:job/{}", job.job_queue, job_id);
        let created_at = now_millis();

        state.summaries.insert(
            job_id.clone(),
            JobSummary {
                job_id: job_id.clone(),
                job_name: job.job_name.clone(),
                created_at: Some(created_at),
                started_at: None,
                stopped_at: None,
                status: "SUBMITTED".to_string(),
                status_detail: None,
                resource_name: resource_name.clone(),
            },
        );
        state.logs.insert(
            job_id.clone(),
            vec![format!(
                "{created_at}: job {} submitted to queue {}",
                job.job_name, job.job_queue
            )],
        );
        state.jobs.push((job_id.clone(), job.clone()));

        Ok(SubmitJobResult {
            job_id,
            resource_name: Some(resource_name),
        })
    }
}

impl ComputeProvider for InMemoryProvider {
    fn submit_job<'a>(&'a self, job: &'a Job) -> BoxFuture<'a, Result<SubmitJobResult>> {
        Box::pin(async move {
            let result = self.accept(job)?;
            debug!(
                job_name = %job.job_name,
                vendor_job_id = %result.job_id,
                depends_on = job.depends_on.len(),
                "in-memory provider accepted job"
            );
            Ok(result)
        })
    }

    fn status_batches<'a>(
        &'a self,
        job_queue: &'a str,
        query: &'a JobsSummaryQuery,
        on_batch: &'a mut SummarySink<'_>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let pattern = query.pattern()?;

            let matching: Vec<JobSummary> = {
                let state = self.state();
                state
                    .jobs
                    .iter()
                    .filter(|(_, job)| job.job_queue == job_queue && pattern.matches(&job.job_name))
                    .filter_map(|(id, _)| state.summaries.get(id).cloned())
                    .collect()
            };

            debug!(%pattern, matches = matching.len(), "in-memory status query");

            for batch in matching.chunks(self.batch_size) {
                on_batch(batch.to_vec());
            }
            Ok(())
        })
    }

    fn job_log<'a>(&'a self, vendor_job_id: &'a str) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let state = self.state();
            if !state.summaries.contains_key(vendor_job_id) {
                return Err(ComputeError::NotFound(format!("job {vendor_job_id}")));
            }
            if state.log_store_offline {
                return Err(ComputeError::LogUnavailable {
                    job_id: vendor_job_id.to_string(),
                    reason: "log store is offline".to_string(),
                });
            }
            Ok(state.logs.get(vendor_job_id).cloned().unwrap_or_default())
        })
    }

    fn terminate_job<'a>(
        &'a self,
        job: &'a VendorJob,
        reason: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = self.state();
            let summary = state
                .summaries
                .get_mut(&job.job_id)
                .ok_or_else(|| ComputeError::NotFound(format!("job {}", job.job_id)))?;

            if summary.is_terminal() {
                debug!(job_id = %job.job_id, status = %summary.status, "job already finished");
                return Ok(());
            }

            summary.status = "FAILED".to_string();
            summary.status_detail = Some(reason.to_string());
            summary.stopped_at = Some(now_millis());
            info!(job_id = %job.job_id, job_name = %job.job_name, reason, "job terminated");
            Ok(())
        })
    }

    fn register_plugin<'a>(
        &'a self,
        plugin: &'a Plugin,
    ) -> BoxFuture<'a, Result<PluginRegistrationOutput>> {
        Box::pin(async move {
            let mut state = self.state();
            let revision = {
                let rev = state.revisions.entry(plugin.name.clone()).or_insert(0);
                *rev += 1;
                *rev
            };

            let output = PluginRegistrationOutput {
                name: plugin.name.clone(),
                resource_name: format!("local:job-definition/{}:{revision}", plugin.name),
                revision,
            };
            state.plugins.insert(output.definition(), plugin.clone());

            info!(definition = %output.definition(), image = %plugin.image_and_tag, "plugin registered");
            Ok(output)
        })
    }

    fn unregister_plugin<'a>(&'a self, name_and_revision: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match self.state().plugins.remove(name_and_revision) {
                Some(_) => {
                    info!(definition = name_and_revision, "plugin unregistered");
                    Ok(())
                }
                None => Err(ComputeError::NotFound(format!(
                    "job definition {name_and_revision}"
                ))),
            }
        })
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
