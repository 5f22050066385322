// src/engine/compute.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::{ComputeError, Result};
use crate::events::EventGenerator;
use crate::naming::{job_name, JobNameParts, JobsSummaryQuery, DEFAULT_PROFILE};
use crate::payload::{stage_payloads, PayloadStore};
use crate::provider::{
    ComputeProvider, JobSummary, SubmitJobResult, SummarySink, TerminateJobOutput,
    TerminateJobsInput, TerminateTarget, TerminationSink,
};

use super::plan::{build_job, JobContext};
use super::{RunState, SubmissionIdMap};

/// A compute: one DAG of manifests, run over every event a generator yields,
/// on one provider queue.
///
/// [`run`](Self::run) submits; status, logs and cancellation are recovered
/// through the job-name encoding and the submission id map afterwards.
pub struct Compute<P: ComputeProvider> {
    id: Uuid,
    name: String,
    job_queue: String,
    profile: String,
    events: Box<dyn EventGenerator>,
    provider: P,
    payload_store: Option<Arc<dyn PayloadStore>>,
    submission_ids: SubmissionIdMap,
    state: RunState,
}

impl<P: ComputeProvider> fmt::Debug for Compute<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compute")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("job_queue", &self.job_queue)
            .field("profile", &self.profile)
            .field("state", &self.state)
            .field("submitted", &self.submission_ids.len())
            .finish_non_exhaustive()
    }
}

impl<P: ComputeProvider> Compute<P> {
    /// New compute with a fresh id and the default profile.
    pub fn new(
        name: impl Into<String>,
        job_queue: impl Into<String>,
        events: impl EventGenerator + 'static,
        provider: P,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            job_queue: job_queue.into(),
            profile: DEFAULT_PROFILE.to_string(),
            events: Box::new(events),
            provider,
            payload_store: None,
            submission_ids: HashMap::new(),
            state: RunState::NotStarted,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Namespace prefix for job names.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Store used for manifests whose payload has not been staged yet.
    pub fn with_payload_store(mut self, store: Arc<dyn PayloadStore>) -> Self {
        self.payload_store = Some(store);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn job_queue(&self) -> &str {
        &self.job_queue
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Provider answer for the most recent submission of `manifest_id`.
    pub fn submission_id(&self, manifest_id: &str) -> Option<&SubmitJobResult> {
        self.submission_ids.get(manifest_id)
    }

    pub fn submission_ids(&self) -> &SubmissionIdMap {
        &self.submission_ids
    }

    /// Job name a manifest of `event_id` is (or would be) submitted under.
    pub fn job_name_for(&self, event_id: Uuid, manifest_id: &str) -> String {
        job_name(
            &self.profile,
            &self.id.to_string(),
            &event_id.to_string(),
            manifest_id,
        )
    }

    /// Query matching every job of this compute.
    pub fn compute_query(&self) -> JobsSummaryQuery {
        JobsSummaryQuery::compute(&self.profile, self.id.to_string())
    }

    /// Query matching every job of one event of this compute.
    pub fn event_query(&self, event_id: Uuid) -> JobsSummaryQuery {
        JobsSummaryQuery::event(&self.profile, self.id.to_string(), event_id.to_string())
    }

    /// Query matching the job of one manifest of one event.
    pub fn manifest_query(&self, event_id: Uuid, manifest_id: &str) -> JobsSummaryQuery {
        JobsSummaryQuery::manifest(
            &self.profile,
            JobNameParts::new(self.id.to_string(), event_id.to_string(), manifest_id),
        )
    }

    /// Submit every manifest of every event, in dependency order.
    ///
    /// Stops at the first failure. Jobs submitted before it stay with the
    /// provider and remain reachable through [`cancel`](Self::cancel) and
    /// [`submission_id`](Self::submission_id).
    pub async fn run(&mut self) -> Result<()> {
        if self.state != RunState::NotStarted {
            return Err(ComputeError::AlreadyRun(self.id.to_string()));
        }

        self.state = RunState::Submitting;
        info!(
            compute_id = %self.id,
            name = %self.name,
            job_queue = %self.job_queue,
            "compute run started"
        );

        match self.submit_events().await {
            Ok(submitted) => {
                self.state = RunState::Completed;
                info!(compute_id = %self.id, submitted, "compute run completed");
                Ok(())
            }
            Err(err) => {
                self.state = RunState::Failed;
                error!(
                    compute_id = %self.id,
                    submitted = self.submission_ids.len(),
                    error = %err,
                    "compute run failed"
                );
                Err(err)
            }
        }
    }

    async fn submit_events(&mut self) -> Result<usize> {
        let mut submitted = 0;

        while self.events.has_next_event() {
            let mut event = self.events.next_event()?;
            stage_payloads(&mut event.manifests, self.payload_store.as_deref())?;

            debug!(
                compute_id = %self.id,
                event_id = %event.id,
                event_number = event.event_number,
                manifests = event.manifests.len(),
                "submitting event"
            );

            let ctx = JobContext {
                compute_id: self.id,
                profile: &self.profile,
                job_queue: &self.job_queue,
            };
            // Dependencies only resolve against this event's submissions.
            let mut resolved: HashMap<String, String> = HashMap::new();

            for manifest in &event.manifests {
                let job = build_job(ctx, &event, manifest, &resolved)?;

                let result = self
                    .provider
                    .submit_job(&job)
                    .await
                    .map_err(|err| match err {
                        ComputeError::Submission { .. } => err,
                        other => ComputeError::submission(&job, other.to_string()),
                    })?;

                info!(
                    compute_id = %self.id,
                    event_id = %event.id,
                    manifest_id = %manifest.manifest_id,
                    job_name = %job.job_name,
                    vendor_job_id = %result.job_id,
                    depends_on = job.depends_on.len(),
                    "job submitted"
                );

                resolved.insert(manifest.manifest_id.clone(), result.job_id.clone());
                if let Some(previous) = self
                    .submission_ids
                    .insert(manifest.manifest_id.clone(), result)
                {
                    debug!(
                        manifest_id = %manifest.manifest_id,
                        previous_vendor_job_id = %previous.job_id,
                        "manifest resubmitted; tracking newest job"
                    );
                }
                submitted += 1;
            }
        }

        Ok(submitted)
    }

    /// Every summary matching `query` on this compute's queue.
    pub async fn status(&self, query: &JobsSummaryQuery) -> Result<Vec<JobSummary>> {
        self.provider.status(&self.job_queue, query).await
    }

    /// Stream summaries matching `query` page by page.
    pub async fn status_batches(
        &self,
        query: &JobsSummaryQuery,
        on_batch: &mut SummarySink<'_>,
    ) -> Result<()> {
        self.provider
            .status_batches(&self.job_queue, query, on_batch)
            .await
    }

    /// Log lines of the job most recently submitted for `manifest_id`.
    pub async fn log(&self, manifest_id: &str) -> Result<Vec<String>> {
        let submitted = self
            .submission_ids
            .get(manifest_id)
            .ok_or_else(|| ComputeError::UnknownManifest(manifest_id.to_string()))?;

        debug!(
            compute_id = %self.id,
            manifest_id,
            vendor_job_id = %submitted.job_id,
            "fetching job log"
        );
        self.provider.job_log(&submitted.job_id).await
    }

    /// Ask the provider to terminate every job of this compute.
    ///
    /// Each per-job outcome goes to `on_terminated`. Only jobs the provider
    /// already knows about are affected.
    pub async fn cancel(
        &self,
        reason: &str,
        on_terminated: &mut TerminationSink<'_>,
    ) -> Result<()> {
        let input = TerminateJobsInput {
            reason: reason.to_string(),
            job_queue: self.job_queue.clone(),
            target: TerminateTarget::Query(self.compute_query()),
        };

        info!(compute_id = %self.id, reason, "cancelling compute");

        let mut failed = 0usize;
        let mut record = |outcome: TerminateJobOutput| {
            if !outcome.is_ok() {
                failed += 1;
            }
            on_terminated(outcome);
        };
        self.provider.terminate_jobs(&input, &mut record).await?;

        if failed > 0 {
            warn!(compute_id = %self.id, failed, "some jobs could not be terminated");
        }
        Ok(())
    }

    /// Poll `query` every `interval` until every matching job is terminal.
    ///
    /// Returns the final summaries. A query matching nothing returns at
    /// once. There is no deadline; wrap the call in `tokio::time::timeout`.
    pub async fn wait_for_completion(
        &self,
        query: &JobsSummaryQuery,
        interval: Duration,
    ) -> Result<Vec<JobSummary>> {
        loop {
            let summaries = self.status(query).await?;
            let pending = summaries.iter().filter(|s| !s.is_terminal()).count();

            if pending == 0 {
                info!(
                    compute_id = %self.id,
                    jobs = summaries.len(),
                    "all jobs finished"
                );
                return Ok(summaries);
            }

            debug!(compute_id = %self.id, pending, "waiting for jobs");
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventList;
    use crate::model::{ComputeManifest, Event, JobDependency};
    use crate::payload::InMemoryPayloadStore;
    use crate::provider::InMemoryProvider;

    fn chain_event() -> Event {
        let mut post = ComputeManifest::new("post", "p:1");
        post.dependencies.push(JobDependency::new("sim"));
        let sim = ComputeManifest::new("sim", "p:1");

        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(post);
        event.add_manifest(sim);
        event
    }

    #[tokio::test]
    async fn run_resolves_dependencies_to_vendor_ids() {
        let provider = InMemoryProvider::new();
        let mut compute = Compute::new("chain", "queue", EventList::new(vec![chain_event()]), provider.clone());

        compute.run().await.unwrap();
        assert_eq!(compute.state(), RunState::Completed);

        let jobs = provider.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].manifest_id, "sim");
        assert_eq!(jobs[1].manifest_id, "post");

        let sim_id = &compute.submission_id("sim").unwrap().job_id;
        assert_eq!(jobs[1].depends_on, vec![JobDependency::new(sim_id.as_str())]);
    }

    #[tokio::test]
    async fn second_run_is_rejected() {
        let mut compute = Compute::new("once", "queue", EventList::new(vec![]), InMemoryProvider::new());
        compute.run().await.unwrap();

        assert!(matches!(compute.run().await, Err(ComputeError::AlreadyRun(_))));
        assert_eq!(compute.state(), RunState::Completed);
    }

    #[tokio::test]
    async fn payloads_are_staged_before_submission() {
        let mut sim = ComputeManifest::new("sim", "p:1");
        sim.inputs
            .payload_attributes
            .insert("seed".to_string(), serde_json::json!(11));
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(sim);

        let store = Arc::new(InMemoryPayloadStore::new());
        let provider = InMemoryProvider::new();
        let mut compute = Compute::new("payload", "queue", EventList::new(vec![event]), provider.clone())
            .with_payload_store(store.clone());

        compute.run().await.unwrap();

        assert_eq!(store.len(), 1);
        let job = &provider.jobs()[0];
        let payload_id = job
            .container_overrides
            .environment
            .get(crate::engine::CC_PAYLOAD_ID)
            .unwrap();
        assert_eq!(job.tags.get("payload_id").map(String::as_str), Some(payload_id));
    }

    #[tokio::test]
    async fn missing_payload_store_fails_the_run() {
        let mut sim = ComputeManifest::new("sim", "p:1");
        sim.inputs
            .payload_attributes
            .insert("seed".to_string(), serde_json::json!(11));
        let mut event = Event::new(Uuid::new_v4());
        event.add_manifest(sim);

        let provider = InMemoryProvider::new();
        let mut compute = Compute::new("payload", "queue", EventList::new(vec![event]), provider.clone());

        assert!(matches!(compute.run().await, Err(ComputeError::Payload { .. })));
        assert_eq!(compute.state(), RunState::Failed);
        assert!(provider.jobs().is_empty());
    }

    #[tokio::test]
    async fn log_of_unsubmitted_manifest_is_unknown() {
        let compute = Compute::new("idle", "queue", EventList::new(vec![]), InMemoryProvider::new());
        assert!(matches!(
            compute.log("sim").await,
            Err(ComputeError::UnknownManifest(id)) if id == "sim"
        ));
    }

    #[tokio::test]
    async fn queries_use_the_configured_profile() {
        let compute = Compute::new("named", "queue", EventList::new(vec![]), InMemoryProvider::new())
            .with_profile("WAT");
        let event_id = Uuid::new_v4();

        let name = compute.job_name_for(event_id, "m1");
        assert!(name.starts_with(&format!("WAT_C_{}", compute.id())));
        assert!(compute.compute_query().pattern().unwrap().matches(&name));
        assert!(compute.event_query(event_id).pattern().unwrap().matches(&name));
        assert!(compute.manifest_query(event_id, "m1").pattern().unwrap().matches(&name));
    }
}
