// tests/compute_run.rs

use std::error::Error;
use std::time::Duration;

use cloudcompute::engine::{Compute, RunState, CC_EVENT_NUMBER};
use cloudcompute::errors::ComputeError;
use cloudcompute::events::{ArrayEventGenerator, EventList};
use cloudcompute::model::JobDependency;
use cloudcompute::provider::{ComputeProvider, InMemoryProvider, JobSummary, TerminateJobOutput};
use cloudcompute_test_utils::builders::{EventBuilder, ManifestBuilder};
use cloudcompute_test_utils::fake_provider::FlakyProvider;
use cloudcompute_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn two_independent() -> EventList {
    EventList::new(vec![
        EventBuilder::new()
            .number(1)
            .manifest(ManifestBuilder::new("alpha").command(&["run", "alpha"]))
            .manifest(ManifestBuilder::new("beta").command(&["run", "beta"]))
            .build(),
    ])
}

fn sim_then_post() -> EventBuilder {
    EventBuilder::new()
        .manifest(ManifestBuilder::new("post").after("sim"))
        .manifest(ManifestBuilder::new("sim"))
}

#[tokio::test]
async fn logs_are_fetched_by_each_manifests_own_vendor_id() -> TestResult {
    init_tracing();

    let provider = InMemoryProvider::new();
    let mut compute = Compute::new("logs", "queue", two_independent(), provider.clone());
    compute.run().await?;

    let alpha = compute.submission_id("alpha").ok_or("alpha not submitted")?.job_id.clone();
    let beta = compute.submission_id("beta").ok_or("beta not submitted")?.job_id.clone();
    assert_ne!(alpha, beta);

    provider.set_log(&alpha, vec!["1: alpha says hi".to_string()]);
    provider.set_log(&beta, vec!["1: beta says hi".to_string(), "2: beta done".to_string()]);

    assert_eq!(compute.log("alpha").await?, vec!["1: alpha says hi".to_string()]);
    assert_eq!(compute.log("beta").await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn failed_submission_aborts_the_run() -> TestResult {
    init_tracing();

    let events = EventList::new(vec![
        EventBuilder::new()
            .manifest(ManifestBuilder::new("second").after("first"))
            .manifest(ManifestBuilder::new("first"))
            .build(),
        EventBuilder::new().manifest(ManifestBuilder::new("third")).build(),
    ]);
    let provider = FlakyProvider::new(InMemoryProvider::new()).fail_on_submission(2);
    let mut compute = Compute::new("flaky", "queue", events, provider.clone());

    let err = compute.run().await.expect_err("second submission must fail");
    let attempted = provider.attempted();
    assert_eq!(attempted.len(), 2, "nothing is submitted after the failure");
    assert!(attempted[0].ends_with("_M_first"), "{attempted:?}");
    assert!(attempted[1].ends_with("_M_second"), "{attempted:?}");

    match err {
        ComputeError::Submission {
            job_name,
            job_definition,
            job_queue,
            reason,
        } => {
            assert_eq!(job_name, attempted[1]);
            assert_eq!(job_definition, "test-plugin:1");
            assert_eq!(job_queue, "queue");
            assert!(reason.contains("injected failure"), "{reason}");
        }
        other => return Err(format!("unexpected error: {other}").into()),
    }

    assert_eq!(compute.state(), RunState::Failed);
    assert!(compute.submission_id("first").is_some());
    assert!(compute.submission_id("second").is_none());
    assert_eq!(provider.inner().jobs().len(), 1);

    // The job that did go out is still reachable for cancellation.
    let mut outcomes = Vec::new();
    compute
        .cancel("run failed", &mut |out: TerminateJobOutput| outcomes.push(out))
        .await?;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
    Ok(())
}

#[tokio::test]
async fn dependencies_resolve_within_each_templated_event() -> TestResult {
    init_tracing();

    let template = sim_then_post().build();
    let provider = InMemoryProvider::new();
    let mut compute = Compute::new(
        "array",
        "queue",
        ArrayEventGenerator::new(template.clone(), 1..=3)?,
        provider.clone(),
    );
    compute.run().await?;

    let submissions = provider.submissions();
    assert_eq!(submissions.len(), 6);

    // Every copy keeps the template id, so each event's jobs carry the same
    // names and only submission order tells them apart.
    let mut sim_ids = Vec::new();
    for pair in submissions.chunks(2) {
        let ((sim_id, sim), (_, post)) = (&pair[0], &pair[1]);
        assert_eq!(sim.manifest_id, "sim");
        assert_eq!(post.manifest_id, "post");
        assert_eq!(sim.event_id, template.id);
        assert_eq!(sim.job_name, submissions[0].1.job_name);

        assert_eq!(post.depends_on, vec![JobDependency::new(sim_id.clone())]);
        sim_ids.push(sim_id.clone());
    }
    sim_ids.sort();
    sim_ids.dedup();
    assert_eq!(sim_ids.len(), 3, "each event depends on its own sim job");

    let numbers: Vec<&str> = submissions
        .iter()
        .step_by(2)
        .filter_map(|(_, job)| job.container_overrides.environment.get(CC_EVENT_NUMBER))
        .collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);

    // A manifest-level query matches the job of every event.
    let sims = compute.status(&compute.manifest_query(template.id, "sim")).await?;
    assert_eq!(sims.len(), 3);

    // Map and name lookup both track the last event's submissions.
    let (last_post_id, last_post) = &submissions[5];
    assert_eq!(provider.vendor_id_of(&last_post.job_name).as_ref(), Some(last_post_id));
    assert_eq!(compute.submission_id("post").map(|r| r.job_id.clone()), Some(last_post_id.clone()));
    Ok(())
}

#[tokio::test]
async fn job_names_encode_compute_event_and_manifest() -> TestResult {
    let event = sim_then_post().build();
    let event_id = event.id;
    let provider = InMemoryProvider::new();
    let mut compute =
        Compute::new("names", "queue", EventList::new(vec![event]), provider.clone()).with_profile("WAT");
    compute.run().await?;

    for job in provider.jobs() {
        assert!(job.job_name.starts_with("WAT_C_"));
        assert_eq!(job.job_name, compute.job_name_for(event_id, &job.manifest_id));
    }

    let status = compute.status(&compute.event_query(event_id)).await?;
    assert_eq!(status.len(), 2);
    let exact = compute.status(&compute.manifest_query(event_id, "sim")).await?;
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].job_id, compute.submission_id("sim").ok_or("sim")?.job_id);
    Ok(())
}

#[tokio::test]
async fn status_is_an_idempotent_read() -> TestResult {
    let provider = InMemoryProvider::new();
    let mut compute = Compute::new("status", "queue", two_independent(), provider.clone());
    compute.run().await?;

    let query = compute.compute_query();
    let first = compute.status(&query).await?;
    let second = compute.status(&query).await?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|s| s.status == "SUBMITTED"));

    let mut pages = 0;
    let mut seen = 0;
    compute
        .status_batches(&query, &mut |batch: Vec<JobSummary>| {
            pages += 1;
            seen += batch.len();
        })
        .await?;
    assert_eq!((pages, seen), (1, 2));
    Ok(())
}

#[tokio::test]
async fn cancel_terminates_every_job_of_the_compute_only() -> TestResult {
    init_tracing();

    let provider = InMemoryProvider::new();
    let mut ours = Compute::new("ours", "queue", two_independent(), provider.clone());
    let mut theirs = Compute::new("theirs", "queue", two_independent(), provider.clone());
    ours.run().await?;
    theirs.run().await?;

    let mut cancelled = Vec::new();
    ours.cancel("no longer needed", &mut |out: TerminateJobOutput| {
        cancelled.push(out.job_name)
    })
    .await?;
    assert_eq!(cancelled.len(), 2);
    let prefix = format!("CC_C_{}", ours.id());
    assert!(cancelled.iter().all(|name| name.starts_with(&prefix)));

    let ours_status = ours.status(&ours.compute_query()).await?;
    assert!(ours_status.iter().all(|s| s.status == "FAILED"
        && s.status_detail.as_deref() == Some("no longer needed")));

    let theirs_status = theirs.status(&theirs.compute_query()).await?;
    assert!(theirs_status.iter().all(|s| s.status == "SUBMITTED"));
    Ok(())
}

#[tokio::test]
async fn wait_for_completion_polls_until_terminal() -> TestResult {
    init_tracing();

    let provider = InMemoryProvider::new();
    let mut compute = Compute::new("wait", "queue", two_independent(), provider.clone());
    compute.run().await?;

    let ids: Vec<String> = compute.submission_ids().values().map(|r| r.job_id.clone()).collect();
    let backend = provider.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        for id in &ids {
            let _ = backend.set_status(id, "RUNNING");
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
        for id in &ids {
            let _ = backend.set_status(id, "SUCCEEDED");
        }
    });

    let query = compute.compute_query();
    let summaries =
        with_timeout(compute.wait_for_completion(&query, Duration::from_millis(5))).await?;

    assert_eq!(summaries.len(), 2);
    assert!(summaries.iter().all(|s| s.is_terminal()));
    assert!(summaries.iter().all(|s| s.started_at.is_some() && s.stopped_at.is_some()));
    Ok(())
}

#[tokio::test]
async fn cyclic_event_fails_before_anything_is_submitted() -> TestResult {
    let cyclic = EventBuilder::new()
        .manifest(ManifestBuilder::new("a").after("b"))
        .manifest(ManifestBuilder::new("b").after("a"))
        .build();
    let event_id = cyclic.id.to_string();

    let provider = InMemoryProvider::new();
    let mut compute = Compute::new("cycle", "queue", EventList::new(vec![cyclic]), provider.clone());

    match compute.run().await {
        Err(ComputeError::Cycle { event_id: id, .. }) => assert_eq!(id, event_id),
        other => return Err(format!("expected cycle, got {other:?}").into()),
    }
    assert!(provider.jobs().is_empty());
    assert_eq!(compute.state(), RunState::Failed);
    Ok(())
}

#[tokio::test]
async fn lone_manifest_with_foreign_dependency_is_rejected() -> TestResult {
    let event = EventBuilder::new()
        .manifest(ManifestBuilder::new("post").after("sim"))
        .build();
    let provider = InMemoryProvider::new();
    let mut compute = Compute::new("orphan", "queue", EventList::new(vec![event]), provider.clone());

    assert!(matches!(
        compute.run().await,
        Err(ComputeError::MissingDependency { ref manifest_id, ref dependency })
            if manifest_id == "post" && dependency == "sim"
    ));
    assert!(provider.jobs().is_empty());
    Ok(())
}

#[tokio::test]
async fn registered_plugins_are_addressable_by_revision() -> TestResult {
    let provider = InMemoryProvider::new();
    let plugin = cloudcompute::model::Plugin {
        name: "ras".to_string(),
        image_and_tag: "ras:6.3".to_string(),
        ..Default::default()
    };

    let registered = provider.register_plugin(&plugin).await?;
    assert_eq!(registered.definition(), "ras:1");

    let event = EventBuilder::new()
        .manifest(ManifestBuilder::new("sim").plugin(&registered.definition()))
        .build();
    let mut compute = Compute::new("plugin", "queue", EventList::new(vec![event]), provider.clone());
    compute.run().await?;

    assert_eq!(provider.jobs()[0].job_definition, "ras:1");
    provider.unregister_plugin("ras:1").await?;
    assert!(provider.registered_plugins().is_empty());
    Ok(())
}
