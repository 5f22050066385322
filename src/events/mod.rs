// src/events/mod.rs

//! Event generators.
//!
//! A compute pulls its events from an [`EventGenerator`]: a forward-only,
//! possibly unbounded sequence. Every generator re-linearizes an event's
//! manifests in dependency order before handing it out, so consumers can
//! submit manifests in the order they are listed.
//!
//! - [`list`] wraps a pre-built list of events.
//! - [`array`] stamps out numbered copies of a single template event.
//! - [`stochastic`] reserves the configuration shape of a template-driven
//!   stochastic generator that is not implemented.

use crate::errors::Result;
use crate::model::Event;

pub mod array;
pub mod list;
pub mod stochastic;

pub use array::ArrayEventGenerator;
pub use list::EventList;
pub use stochastic::StochasticEventsConfig;

/// Source of events for a compute.
pub trait EventGenerator: Send {
    /// Whether another event can be produced.
    fn has_next_event(&self) -> bool;

    /// Produce the next event with its manifests in dependency order.
    ///
    /// Fails with [`ComputeError::Cycle`](crate::errors::ComputeError::Cycle)
    /// if the manifests do not form a DAG, and with
    /// [`ComputeError::GeneratorExhausted`](crate::errors::ComputeError::GeneratorExhausted)
    /// when called after [`has_next_event`](Self::has_next_event) returned `false`.
    fn next_event(&mut self) -> Result<Event>;
}

impl<G: EventGenerator + ?Sized> EventGenerator for Box<G> {
    fn has_next_event(&self) -> bool {
        (**self).has_next_event()
    }

    fn next_event(&mut self) -> Result<Event> {
        (**self).next_event()
    }
}
