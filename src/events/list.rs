// src/events/list.rs

use std::collections::VecDeque;

use tracing::debug;

use crate::errors::{ComputeError, Result};
use crate::events::EventGenerator;
use crate::model::Event;

/// Event generator over a fixed list of events, yielded in list order.
#[derive(Debug, Clone, Default)]
pub struct EventList {
    events: VecDeque<Event>,
    delivered: usize,
}

impl EventList {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
            delivered: 0,
        }
    }

    /// Number of events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventGenerator for EventList {
    fn has_next_event(&self) -> bool {
        !self.events.is_empty()
    }

    fn next_event(&mut self) -> Result<Event> {
        let event = self
            .events
            .pop_front()
            .ok_or(ComputeError::GeneratorExhausted)?;
        self.delivered += 1;

        debug!(
            event_id = %event.id,
            position = self.delivered,
            manifests = event.manifests.len(),
            "event list: delivering event"
        );

        event.into_ordered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComputeManifest, JobDependency};
    use uuid::Uuid;

    fn event_with(manifests: Vec<ComputeManifest>) -> Event {
        Event {
            id: Uuid::new_v4(),
            event_number: 0,
            manifests,
        }
    }

    fn dep(id: &str, on: &str) -> ComputeManifest {
        let mut m = ComputeManifest::new(id, "p:1");
        m.dependencies.push(JobDependency::new(on));
        m
    }

    #[test]
    fn yields_events_in_list_order_then_exhausts() {
        let first = event_with(vec![ComputeManifest::new("a", "p:1")]);
        let second = event_with(vec![ComputeManifest::new("b", "p:1")]);
        let (first_id, second_id) = (first.id, second.id);

        let mut list = EventList::new(vec![first, second]);
        assert_eq!(list.remaining(), 2);

        assert!(list.has_next_event());
        assert_eq!(list.next_event().unwrap().id, first_id);
        assert!(list.has_next_event());
        assert_eq!(list.next_event().unwrap().id, second_id);
        assert!(!list.has_next_event());
        assert!(matches!(list.next_event(), Err(ComputeError::GeneratorExhausted)));
    }

    #[test]
    fn reorders_manifests_before_delivery() {
        let event = event_with(vec![dep("b", "a"), ComputeManifest::new("a", "p:1")]);
        let mut list = EventList::new(vec![event]);

        let delivered = list.next_event().unwrap();
        let ids: Vec<_> = delivered.manifests.iter().map(|m| m.manifest_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn cycle_is_propagated_not_swallowed() {
        let event = event_with(vec![dep("a", "b"), dep("b", "a")]);
        let mut list = EventList::new(vec![event]);
        assert!(matches!(list.next_event(), Err(ComputeError::Cycle { .. })));
    }
}
