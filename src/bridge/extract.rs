//! Topological extraction of the API objects a chart owns.

use anyhow::Result;

use crate::construct::{ConstructTree, DependencyGraph, NodeId};

/// API objects owned by `chart`, dependencies first.
///
/// The graph spans every node below `chart`, containers included; the
/// order is then filtered to API objects whose closest chart is `chart`
/// itself. Objects of charts nested below it are left to their own run.
/// An empty result is a successful run with nothing to emit.
pub fn extract_api_objects(tree: &ConstructTree, chart: NodeId) -> Result<Vec<NodeId>> {
    let order = DependencyGraph::new(tree, chart).topology()?;

    Ok(order
        .into_iter()
        .filter(|&node| tree.node(node).api_object().is_some())
        .filter(|&node| tree.owning_chart(node) == Some(chart))
        .collect())
}
