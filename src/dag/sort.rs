// src/dag/sort.rs

//! Kahn's algorithm over a [`DependencyGraph`].

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::trace;

use crate::dag::graph::{DependencyGraph, TopoSortable};

/// Returned when the graph contains a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDetected<T> {
    /// Nodes that could be ordered before the cycle blocked progress.
    pub ordered: Vec<T>,
    /// Nodes whose in-degree never reached zero.
    pub unresolved: Vec<T>,
}

impl<T: fmt::Debug> fmt::Display for CycleDetected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "not a DAG: {} node(s) left unresolved: {:?}",
            self.unresolved.len(),
            self.unresolved
        )
    }
}

impl<T: fmt::Debug> std::error::Error for CycleDetected<T> {}

/// Order the nodes of `graph` so that every node follows all of its
/// dependencies.
///
/// Ties between independent nodes are broken by work-list order; callers
/// must not rely on a particular order for nodes without a path between them.
pub fn topological_sort<T>(graph: &DependencyGraph<T>) -> Result<Vec<T>, CycleDetected<T>>
where
    T: Eq + Hash + Clone,
{
    // Only nodes that appear as a dependency target get an in-degree entry.
    let mut indegrees: HashMap<&T, usize> = HashMap::new();
    for node in graph.nodes() {
        for dependent in graph.dependents_of(node) {
            *indegrees.entry(dependent).or_insert(0) += 1;
        }
    }

    let mut work: Vec<&T> = graph
        .nodes()
        .filter(|node| !indegrees.contains_key(node))
        .collect();

    let mut order = Vec::with_capacity(graph.len());
    while let Some(node) = work.pop() {
        order.push(node.clone());
        for dependent in graph.dependents_of(node) {
            if let Some(count) = indegrees.get_mut(dependent) {
                *count -= 1;
                if *count == 0 {
                    work.push(dependent);
                }
            }
        }
    }

    let unresolved: Vec<T> = graph
        .nodes()
        .filter(|node| indegrees.get(node).is_some_and(|count| *count > 0))
        .cloned()
        .collect();

    if unresolved.is_empty() {
        Ok(order)
    } else {
        trace!(
            ordered = order.len(),
            unresolved = unresolved.len(),
            "topological sort stopped on a cycle"
        );
        Err(CycleDetected {
            ordered: order,
            unresolved,
        })
    }
}

/// Convenience: build a graph from `items` and sort it.
pub fn sort_nodes<T, N>(items: &[N]) -> Result<Vec<T>, CycleDetected<T>>
where
    T: Eq + Hash + Clone,
    N: TopoSortable<T>,
{
    topological_sort(&DependencyGraph::from_nodes(items))
}
