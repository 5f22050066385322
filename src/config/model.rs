// src/config/model.rs

use serde::Deserialize;
use uuid::Uuid;

use crate::errors::Result;
use crate::events::{ArrayEventGenerator, EventGenerator, EventList, StochasticEventsConfig};
use crate::model::{Event, Plugin};
use crate::naming::DEFAULT_PROFILE;
use crate::payload::PayloadStore;

/// Compute definition as read from a TOML file, before validation.
///
/// ```toml
/// [compute]
/// name = "muncie-ras"
/// job_queue = "hydro-queue"
///
/// [[event]]
/// event_number = 1
///
/// [[event.manifest]]
/// manifest_id = "sim"
/// plugin_definition = "ras:1"
///
/// [[event.manifest]]
/// manifest_id = "post"
/// plugin_definition = "post:1"
/// dependencies = ["sim"]
/// ```
///
/// Exactly one of `[[event]]`, `[range]` or `[stochastic]` must be present.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComputeFile {
    pub compute: ComputeSection,

    #[serde(default, rename = "event")]
    pub events: Vec<Event>,

    #[serde(default)]
    pub range: Option<RangeSection>,

    #[serde(default)]
    pub stochastic: Option<StochasticEventsConfig>,

    #[serde(default, rename = "plugin")]
    pub plugins: Vec<Plugin>,
}

/// `[compute]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ComputeSection {
    pub name: String,

    /// Generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,

    pub job_queue: String,

    /// Job-name namespace prefix.
    #[serde(default = "default_profile")]
    pub profile: String,
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

/// `[range]` section: numbered copies of one template event.
#[derive(Debug, Clone, Deserialize)]
pub struct RangeSection {
    pub start: i64,
    pub end: i64,
    pub event: Event,
}

/// Where a validated compute gets its events from.
#[derive(Debug, Clone)]
pub enum EventSource {
    List(Vec<Event>),
    Range(RangeSection),
}

/// Validated compute definition.
///
/// Only constructible through `TryFrom<RawComputeFile>`
/// (see [`validate`](crate::config::validate)), so a value of this type
/// always has a single event source whose events form DAGs.
#[derive(Debug, Clone)]
pub struct ComputeFile {
    pub compute: ComputeSection,
    pub events: EventSource,
    pub plugins: Vec<Plugin>,
    compute_id: Uuid,
}

impl ComputeFile {
    pub(crate) fn new_unchecked(
        compute: ComputeSection,
        events: EventSource,
        plugins: Vec<Plugin>,
    ) -> Self {
        let compute_id = compute.id.unwrap_or_else(Uuid::new_v4);
        Self {
            compute,
            events,
            plugins,
            compute_id,
        }
    }

    /// Configured id, or the one generated at load time.
    pub fn compute_id(&self) -> Uuid {
        self.compute_id
    }

    /// Number of events the source will yield.
    pub fn event_count(&self) -> u64 {
        match &self.events {
            EventSource::List(events) => events.len() as u64,
            EventSource::Range(range) => {
                let span = i128::from(range.end) - i128::from(range.start) + 1;
                u64::try_from(span.max(0)).unwrap_or(u64::MAX)
            }
        }
    }

    /// Build the generator for this compute's events.
    ///
    /// Range templates stage their payloads here, once, when `store` is given.
    pub fn event_generator(
        &self,
        store: Option<&dyn PayloadStore>,
    ) -> Result<Box<dyn EventGenerator>> {
        match &self.events {
            EventSource::List(events) => Ok(Box::new(EventList::new(events.clone()))),
            EventSource::Range(range) => {
                let span = range.start..=range.end;
                let generator = match store {
                    Some(store) => {
                        ArrayEventGenerator::with_payload_store(range.event.clone(), span, store)?
                    }
                    None => ArrayEventGenerator::new(range.event.clone(), span)?,
                };
                Ok(Box::new(generator))
            }
        }
    }
}
