//! Dependency translation and manifest emission.

use anyhow::{Context, Result};
use std::collections::HashMap;

use super::naming::{ResourceIdentity, synthesize_name};
use super::observer::SynthObserver;
use crate::construct::{ConstructTree, NodeId};
use crate::core::ChartformError;
use crate::terraform::{KubernetesManifest, ManifestOptions, ResourceRef, Stack};

/// Register one `kubernetes_manifest` per object, in the given order.
///
/// `objects` must list dependencies before dependents (see
/// [`extract_api_objects`](super::extract::extract_api_objects)). Each
/// object's declared dependencies are looked up among the manifests
/// emitted earlier in this call; a dependency that was not emitted yet
/// fails the run with [`ChartformError::DependencyNotFound`]. The external
/// `options.depends_on` references are appended after the resolved ones.
///
/// Manifests registered before a failure stay in the stack.
pub fn emit_manifests(
    stack: &mut Stack,
    tree: &ConstructTree,
    group: &str,
    objects: &[NodeId],
    options: &ManifestOptions,
    observer: &dyn SynthObserver,
) -> Result<Vec<ResourceRef>> {
    let mut emitted: HashMap<NodeId, ResourceRef> = HashMap::with_capacity(objects.len());
    let mut order = Vec::with_capacity(objects.len());

    for &node in objects {
        if !tree.contains(node) {
            return Err(ChartformError::Other {
                message: format!("node {node} belongs to another construct tree"),
            }
            .into());
        }
        let document = tree.render(node).ok_or_else(|| ChartformError::Other {
            message: format!("'{}' is not an API object", tree.path(node)),
        })?;

        let identity = ResourceIdentity::from_manifest(&document);
        let name = synthesize_name(group, &identity, &tree.address(node));

        let mut depends_on = tree
            .dependencies(node)
            .iter()
            .map(|&dependency| {
                emitted.get(&dependency).cloned().ok_or_else(|| ChartformError::DependencyNotFound {
                    resource: tree.path(node),
                    dependency: if tree.contains(dependency) {
                        tree.path(dependency)
                    } else {
                        dependency.to_string()
                    },
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        depends_on.extend(options.depends_on.iter().cloned());

        let manifest = KubernetesManifest::new(name, document, depends_on.clone(), options);
        let reference = stack
            .add_manifest(manifest)
            .with_context(|| format!("Failed to emit manifest for '{}'", tree.path(node)))?;

        observer.emitted(group, &reference, &depends_on);
        emitted.insert(node, reference.clone());
        order.push(reference);
    }

    Ok(order)
}
