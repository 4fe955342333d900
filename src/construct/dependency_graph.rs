//! Dependency graph over the nodes of a construct sub-tree.
//!
//! Vertices are every node of the sub-tree (not only API objects), added in
//! pre-order; an edge `a -> b` means `a` depends on `b`. [`DependencyGraph::topology`]
//! returns an order in which every node comes after everything it depends
//! on. Ties are broken by declaration order, never re-sorted, so the same
//! tree always yields the same order.

use anyhow::Result;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use super::{ConstructTree, NodeId};
use crate::core::ChartformError;

#[derive(Debug, Clone)]
struct Vertex {
    node: NodeId,
    path: String,
}

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Dependency graph of one construct sub-tree.
pub struct DependencyGraph {
    graph: DiGraph<Vertex, ()>,
}

impl DependencyGraph {
    /// Build the graph for `root` and all of its descendants.
    ///
    /// Dependencies pointing outside the sub-tree are not part of the graph;
    /// they cannot influence the order inside it.
    #[must_use]
    pub fn new(tree: &ConstructTree, root: NodeId) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        let nodes = tree.find_all(root);
        for &node in &nodes {
            let index = graph.add_node(Vertex {
                node,
                path: tree.path(node),
            });
            node_map.insert(node, index);
        }

        for &node in &nodes {
            let from = node_map[&node];
            for dependency in tree.dependencies(node) {
                if let Some(&to) = node_map.get(dependency) {
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                    }
                }
            }
        }

        Self {
            graph,
        }
    }

    /// Outbound edges of `index` in insertion order.
    ///
    /// petgraph iterates adjacency lists newest-first, so edges are sorted
    /// by their index to restore declaration order.
    fn outbound(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self.graph.edges(index).map(|e| (e.id(), e.target())).collect();
        edges.sort_by_key(|(id, _)| *id);
        edges.into_iter().map(|(_, target)| target).collect()
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Returns [`ChartformError::CircularDependency`] naming the cycle.
    pub fn detect_cycles(&self) -> Result<()> {
        let mut colors = vec![Color::White; self.graph.node_count()];
        let mut path: Vec<NodeIndex> = Vec::new();

        for index in self.graph.node_indices() {
            if colors[index.index()] == Color::White {
                if let Some(cycle) = self.dfs_visit(index, &mut colors, &mut path) {
                    let chain = cycle
                        .iter()
                        .map(|i| self.graph[*i].path.as_str())
                        .collect::<Vec<_>>()
                        .join(" => ");
                    return Err(ChartformError::CircularDependency {
                        chain,
                    }
                    .into());
                }
            }
        }

        Ok(())
    }

    /// DFS visit for cycle detection.
    ///
    /// Returns `Some(cycle_path)` if a cycle is reachable from `index`.
    fn dfs_visit(
        &self,
        index: NodeIndex,
        colors: &mut [Color],
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors[index.index()] = Color::Gray;
        path.push(index);

        for neighbor in self.outbound(index) {
            match colors[neighbor.index()] {
                Color::Gray => {
                    let start = path.iter().position(|i| *i == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[index.index()] = Color::Black;
        None
    }

    /// Nodes ordered so that dependencies come before their dependents.
    ///
    /// The walk starts from every vertex nobody depends on, in pre-order,
    /// and emits each vertex after all of its dependencies (followed in the
    /// order they were declared).
    pub fn topology(&self) -> Result<Vec<NodeId>> {
        self.detect_cycles()?;

        let mut found = vec![false; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());

        let starts = self
            .graph
            .node_indices()
            .filter(|i| self.graph.neighbors_directed(*i, Direction::Incoming).next().is_none());
        for start in starts {
            self.visit(start, &mut found, &mut order);
        }

        Ok(order)
    }

    fn visit(&self, index: NodeIndex, found: &mut [bool], order: &mut Vec<NodeId>) {
        if found[index.index()] {
            return;
        }
        for dependency in self.outbound(index) {
            self.visit(dependency, found, order);
        }
        found[index.index()] = true;
        order.push(self.graph[index].node);
    }
}
