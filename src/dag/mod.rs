// src/dag/mod.rs

//! Dependency graph and ordering.
//!
//! - [`graph`] holds a generic dependency graph and the [`TopoSortable`]
//!   trait that lets any node type describe its own edges.
//! - [`sort`] linearizes a graph with Kahn's algorithm and reports cycles.

pub mod graph;
pub mod sort;

pub use graph::{DependencyGraph, TopoSortable};
pub use sort::{sort_nodes, topological_sort, CycleDetected};
