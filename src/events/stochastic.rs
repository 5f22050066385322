// src/events/stochastic.rs

use serde::Deserialize;

use crate::model::ComputeManifest;

/// Configuration of a stochastic event generator: events are derived from a
/// manifest template for every index in `event_start_index..=event_end_index`.
///
/// Only the shape is defined. No generator implements it yet, and config
/// validation rejects computes that select it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StochasticEventsConfig {
    pub manifest_template: ComputeManifest,
    pub event_start_index: i64,
    pub event_end_index: i64,
}
