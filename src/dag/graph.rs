// src/dag/graph.rs

use std::collections::HashMap;
use std::hash::Hash;

/// Something that can take part in a topological sort: it knows its own
/// identity and the identities of the nodes it depends on.
pub trait TopoSortable<T> {
    fn node(&self) -> T;
    fn deps(&self) -> Vec<T>;
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode<T> {
    /// Direct dependencies: nodes that must be ordered before this one.
    deps: Vec<T>,
    /// Direct dependents: nodes that list this one as a dependency.
    dependents: Vec<T>,
}

impl<T> Default for DagNode<T> {
    fn default() -> Self {
        Self {
            deps: Vec::new(),
            dependents: Vec::new(),
        }
    }
}

/// In-memory dependency graph keyed by node identity.
///
/// Edges point from a dependency to its dependent. No acyclicity check is
/// done here; [`topological_sort`](super::topological_sort) reports cycles.
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    nodes: HashMap<T, DagNode<T>>,
    /// Node identities in first-seen order.
    order: Vec<T>,
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Eq + Hash + Clone> DependencyGraph<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a set of sortable items.
    ///
    /// Every item becomes a node, even if it has no edges. A dependency on
    /// an identity that is not among `items` still creates a node for it.
    pub fn from_nodes<N: TopoSortable<T>>(items: &[N]) -> Self {
        let mut graph = Self::new();

        for item in items {
            graph.add_node(item.node());
        }

        for item in items {
            let node = item.node();
            for dep in item.deps() {
                graph.add_edge(dep, node.clone());
            }
        }

        graph
    }

    /// Insert a node; returns `false` if it was already present.
    pub fn add_node(&mut self, node: T) -> bool {
        if self.nodes.contains_key(&node) {
            return false;
        }
        self.order.push(node.clone());
        self.nodes.insert(node, DagNode::default());
        true
    }

    /// Add an edge `dependency -> dependent`, creating either node as needed.
    pub fn add_edge(&mut self, dependency: T, dependent: T) {
        self.add_node(dependency.clone());
        self.add_node(dependent.clone());

        if let Some(node) = self.nodes.get_mut(&dependency) {
            node.dependents.push(dependent.clone());
        }
        if let Some(node) = self.nodes.get_mut(&dependent) {
            node.deps.push(dependency);
        }
    }

    /// All nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.order.iter()
    }

    pub fn contains(&self, node: &T) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, node: &T) -> &[T] {
        self.nodes
            .get(node)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a node.
    pub fn dependents_of(&self, node: &T) -> &[T] {
        self.nodes
            .get(node)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }
}
