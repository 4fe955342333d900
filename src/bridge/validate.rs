//! Tree validation, the first stage of a run.

use anyhow::Result;

use crate::construct::{ConstructTree, NodeId};
use crate::core::{ChartformError, ValidationIssue};

/// Run every validation hook of `root` and its descendants.
///
/// All messages are collected before failing, so one error reports every
/// problem in the tree. Returns the number of nodes visited.
pub fn validate_tree(tree: &ConstructTree, root: NodeId) -> Result<usize> {
    let nodes = tree.find_all(root);

    let errors: Vec<ValidationIssue> = nodes
        .iter()
        .flat_map(|&node| {
            tree.validate_node(node).into_iter().map(move |message| ValidationIssue {
                path: tree.path(node),
                message,
            })
        })
        .collect();

    if !errors.is_empty() {
        return Err(ChartformError::ValidationFailed {
            errors,
        }
        .into());
    }

    Ok(nodes.len())
}
