// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod events;
pub mod logging;
pub mod model;
pub mod naming;
pub mod payload;
pub mod provider;
pub mod types;

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{ComputeFile, EventSource};
use crate::engine::Compute;
use crate::model::Event;
use crate::naming::job_name;
use crate::payload::InMemoryPayloadStore;
use crate::provider::{ComputeProvider, InMemoryProvider, JobSummary, TerminateJobOutput};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - compute file loading
/// - plugin registration
/// - the event generator and payload store
/// - the orchestrator, run against the in-memory provider
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let provider = InMemoryProvider::new();
    for plugin in &cfg.plugins {
        let registered = provider.register_plugin(plugin).await?;
        info!(
            plugin = %registered.name,
            definition = %registered.definition(),
            "registered plugin"
        );
    }

    let store = Arc::new(InMemoryPayloadStore::new());
    let events = cfg.event_generator(Some(&*store))?;

    let mut compute = Compute::new(
        cfg.compute.name.clone(),
        cfg.compute.job_queue.clone(),
        events,
        provider,
    )
    .with_id(cfg.compute_id())
    .with_profile(cfg.compute.profile.clone())
    .with_payload_store(store);

    // Ctrl-C stops submitting and cancels whatever already went out.
    let finished = tokio::select! {
        result = compute.run() => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
    };

    match finished {
        Some(result) => result?,
        None => {
            warn!(compute_id = %compute.id(), "interrupted; cancelling submitted jobs");
            compute
                .cancel("interrupted", &mut |outcome: TerminateJobOutput| {
                    debug!(job_id = %outcome.job_id, error = ?outcome.error, "terminated");
                })
                .await?;
            bail!("compute {} interrupted", compute.id());
        }
    }

    let summaries = compute.status(&compute.compute_query()).await?;
    print_status(&compute, &summaries);
    Ok(())
}

/// Dry-run output: every event with its manifests in submission order.
fn print_dry_run(cfg: &ComputeFile) -> Result<()> {
    let compute_id = cfg.compute_id();

    println!("cloudcompute dry-run");
    println!("  compute.name = {}", cfg.compute.name);
    println!("  compute.id = {compute_id}");
    println!("  compute.job_queue = {}", cfg.compute.job_queue);
    println!("  compute.profile = {}", cfg.compute.profile);
    println!();

    if !cfg.plugins.is_empty() {
        println!("plugins ({}):", cfg.plugins.len());
        for plugin in &cfg.plugins {
            println!("  - {} ({})", plugin.name, plugin.image_and_tag);
        }
        println!();
    }

    match &cfg.events {
        EventSource::List(events) => {
            println!("events ({}):", events.len());
            for event in events {
                print_event(cfg, compute_id, event.clone().into_ordered()?);
            }
        }
        EventSource::Range(range) => {
            println!(
                "events {}..={} ({}) from template:",
                range.start,
                range.end,
                cfg.event_count()
            );
            print_event(cfg, compute_id, range.event.clone().into_ordered()?);
        }
    }

    debug!("dry-run complete (nothing submitted)");
    Ok(())
}

fn print_event(cfg: &ComputeFile, compute_id: Uuid, event: Event) {
    println!("  - event {} (#{})", event.id, event.event_number);
    for manifest in &event.manifests {
        println!("      {} [{}]", manifest.manifest_id, manifest.plugin_definition);
        let deps: Vec<&str> = manifest.dependency_ids().collect();
        if !deps.is_empty() {
            println!("        after: {deps:?}");
        }
        println!(
            "        job: {}",
            job_name(
                &cfg.compute.profile,
                &compute_id.to_string(),
                &event.id.to_string(),
                &manifest.manifest_id,
            )
        );
    }
}

fn print_status<P: ComputeProvider>(compute: &Compute<P>, summaries: &[JobSummary]) {
    println!(
        "compute {} ({}): {} jobs, state {}",
        compute.name(),
        compute.id(),
        summaries.len(),
        compute.state()
    );
    for summary in summaries {
        println!(
            "  {:<36}  {:<10}  {}",
            summary.job_id, summary.status, summary.job_name
        );
    }
}
