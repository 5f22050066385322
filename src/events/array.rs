// src/events/array.rs

use std::ops::RangeInclusive;

use tracing::{debug, info};

use crate::errors::{ComputeError, Result};
use crate::events::EventGenerator;
use crate::model::Event;
use crate::payload::{stage_payloads, PayloadStore};

/// Generates numbered copies of a template event over an inclusive range.
///
/// Each copy keeps the template's id and manifests; only `event_number`
/// changes. Payloads are staged once against the template when the
/// generator is built, so every copy shares the same payload ids.
#[derive(Debug, Clone)]
pub struct ArrayEventGenerator {
    template: Event,
    // None once the range is exhausted.
    next: Option<i64>,
    end: i64,
}

impl ArrayEventGenerator {
    /// Build a generator for a template whose manifests need no payload.
    pub fn new(template: Event, range: RangeInclusive<i64>) -> Result<Self> {
        Self::build(template, range, None)
    }

    /// Build a generator, staging manifest payloads in `store` first.
    pub fn with_payload_store(
        template: Event,
        range: RangeInclusive<i64>,
        store: &dyn PayloadStore,
    ) -> Result<Self> {
        Self::build(template, range, Some(store))
    }

    fn build(
        mut template: Event,
        range: RangeInclusive<i64>,
        store: Option<&dyn PayloadStore>,
    ) -> Result<Self> {
        stage_payloads(&mut template.manifests, store)?;

        let (start, end) = range.into_inner();
        info!(
            event_id = %template.id,
            start,
            end,
            manifests = template.manifests.len(),
            "array event generator ready"
        );

        Ok(Self {
            template,
            next: (start <= end).then_some(start),
            end,
        })
    }

    pub fn template(&self) -> &Event {
        &self.template
    }
}

impl EventGenerator for ArrayEventGenerator {
    fn has_next_event(&self) -> bool {
        self.next.is_some()
    }

    fn next_event(&mut self) -> Result<Event> {
        let Some(number) = self.next else {
            return Err(ComputeError::GeneratorExhausted);
        };
        self.next = number.checked_add(1).filter(|n| *n <= self.end);

        let mut event = self.template.clone();
        event.event_number = number;

        debug!(
            event_id = %event.id,
            event_number = event.event_number,
            "array generator: delivering event"
        );

        event.into_ordered()
    }
}
