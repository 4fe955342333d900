//! The construct tree that chart definitions build.
//!
//! A [`ConstructTree`] is an arena of nodes addressed by [`NodeId`]. Every
//! synthesis run creates its own tree, so two runs never observe each
//! other's nodes. Nodes come in four variants ([`NodeKind`]):
//!
//! - the root (empty id, one per tree)
//! - charts, which own the API objects below them and supply defaults
//! - plain constructs, used to group objects
//! - API objects, the leaves that become manifests
//!
//! Chart definitions do not touch the arena directly; they receive a
//! [`Scope`] positioned at their chart.
//!
//! # Examples
//!
//! ```rust
//! use chartform::construct::{ApiObject, ChartProps, ConstructTree};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut tree = ConstructTree::new();
//! let chart = tree.add_chart(tree.root(), "web", ChartProps::default())?;
//!
//! let mut scope = tree.scope(chart);
//! let ns = scope.api_object("ns", ApiObject::new("v1", "Namespace").with_name("web"))?;
//! let deploy = scope.api_object("deploy", ApiObject::new("apps/v1", "Deployment"))?;
//! scope.add_dependency(deploy, ns)?;
//!
//! assert_eq!(tree.path(deploy), "web/deploy");
//! assert_eq!(tree.dependencies(deploy), &[ns]);
//! # Ok(())
//! # }
//! ```

pub mod api_object;
pub mod dependency_graph;
pub mod names;

pub use api_object::{ApiObject, ApiObjectMetadata};
pub use dependency_graph::DependencyGraph;

use crate::core::ChartformError;
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(0);

/// Handle of a node in the [`ConstructTree`] that created it.
///
/// Ids carry the identity of their tree, so an id from another tree never
/// resolves to a node of this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    tree: u64,
    index: usize,
}

impl NodeId {
    /// Position of the node in creation order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} of tree {}", self.index, self.tree)
    }
}

/// Chart-level settings applied to the API objects a chart owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartProps {
    /// Namespace for objects that do not declare one
    pub namespace: Option<String>,
    /// Labels added to every object (object labels win on conflict)
    pub labels: BTreeMap<String, String>,
    /// Generate object names without the address hash suffix
    pub disable_resource_name_hashes: bool,
}

/// The variant of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Root,
    Chart(ChartProps),
    Construct,
    ApiObject(ApiObject),
}

/// A hook returning zero or more validation messages for a node.
///
/// Implemented for closures, so most hooks are written inline:
///
/// ```rust
/// use chartform::construct::{ApiObject, ChartProps, ConstructTree};
///
/// # fn main() -> anyhow::Result<()> {
/// let mut tree = ConstructTree::new();
/// let chart = tree.add_chart(tree.root(), "web", ChartProps::default())?;
/// tree.add_validation(chart, || vec!["replicas must be positive".to_string()]);
/// assert_eq!(tree.validate_node(chart), vec!["replicas must be positive".to_string()]);
/// # Ok(())
/// # }
/// ```
pub trait Validation {
    fn validate(&self) -> Vec<String>;
}

impl<F> Validation for F
where
    F: Fn() -> Vec<String>,
{
    fn validate(&self) -> Vec<String> {
        self()
    }
}

/// One node of the tree.
pub struct Node {
    id: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    dependencies: Vec<NodeId>,
    validations: Vec<Box<dyn Validation>>,
    kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub const fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The API object stored in this node, if it is one.
    #[must_use]
    pub const fn api_object(&self) -> Option<&ApiObject> {
        match &self.kind {
            NodeKind::ApiObject(object) => Some(object),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("dependencies", &self.dependencies)
            .field("validations", &self.validations.len())
            .field("kind", &self.kind)
            .finish()
    }
}

/// Arena of construct nodes with a single root.
#[derive(Debug)]
pub struct ConstructTree {
    id: u64,
    nodes: Vec<Node>,
}

impl ConstructTree {
    /// Create a tree containing only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: vec![Node {
                id: String::new(),
                parent: None,
                children: Vec::new(),
                dependencies: Vec::new(),
                validations: Vec::new(),
                kind: NodeKind::Root,
            }],
        }
    }

    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId {
            tree: self.id,
            index: 0,
        }
    }

    /// Whether `node` was created by this tree.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        node.tree == self.id && node.index < self.nodes.len()
    }

    /// Access a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        assert!(self.contains(id), "node {id} does not belong to this construct tree");
        &self.nodes[id.index]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        assert!(self.contains(id), "node {id} does not belong to this construct tree");
        &mut self.nodes[id.index]
    }

    /// Handle for building below `node`.
    pub fn scope(&mut self, node: NodeId) -> Scope<'_> {
        Scope {
            tree: self,
            node,
        }
    }

    pub fn add_chart(&mut self, parent: NodeId, id: &str, props: ChartProps) -> Result<NodeId> {
        self.add_node(parent, id, NodeKind::Chart(props))
    }

    pub fn add_construct(&mut self, parent: NodeId, id: &str) -> Result<NodeId> {
        self.add_node(parent, id, NodeKind::Construct)
    }

    pub fn add_api_object(&mut self, parent: NodeId, id: &str, object: ApiObject) -> Result<NodeId> {
        self.add_node(parent, id, NodeKind::ApiObject(object))
    }

    fn add_node(&mut self, parent: NodeId, id: &str, kind: NodeKind) -> Result<NodeId> {
        if !self.contains(parent) {
            return Err(ChartformError::Other {
                message: format!("parent {parent} belongs to another construct tree"),
            }
            .into());
        }
        if id.is_empty() {
            return Err(ChartformError::InvalidConstructId {
                id: id.to_string(),
                reason: "only the root may have an empty id".to_string(),
            }
            .into());
        }
        if id.contains('/') {
            return Err(ChartformError::InvalidConstructId {
                id: id.to_string(),
                reason: "ids must not contain '/'".to_string(),
            }
            .into());
        }
        if self.child(parent, id).is_some() {
            return Err(ChartformError::DuplicateConstructId {
                parent: self.display_path(parent),
                id: id.to_string(),
            }
            .into());
        }

        let node = NodeId {
            tree: self.id,
            index: self.nodes.len(),
        };
        self.nodes.push(Node {
            id: id.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            dependencies: Vec::new(),
            validations: Vec::new(),
            kind,
        });
        self.node_mut(parent).children.push(node);
        Ok(node)
    }

    /// Find a direct child by id.
    #[must_use]
    pub fn child(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.node(parent).children.iter().copied().find(|child| self.nodes[child.index].id == id)
    }

    /// Resolve a `/`-separated path relative to `from`.
    #[must_use]
    pub fn find_path(&self, from: NodeId, path: &str) -> Option<NodeId> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(from, |current, segment| self.child(current, segment))
    }

    /// Record that `from` depends on `to`. Repeated edges are ignored.
    ///
    /// Both nodes must belong to this tree. A `to` from another tree fails
    /// with [`ChartformError::DependencyNotFound`].
    pub fn add_dependency(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        if !self.contains(from) {
            return Err(ChartformError::Other {
                message: format!("node {from} belongs to another construct tree"),
            }
            .into());
        }
        if !self.contains(to) {
            return Err(ChartformError::DependencyNotFound {
                resource: self.path(from),
                dependency: format!("node {to} of another construct tree"),
            }
            .into());
        }

        let dependencies = &mut self.node_mut(from).dependencies;
        if !dependencies.contains(&to) {
            dependencies.push(to);
        }
        Ok(())
    }

    /// Declared dependencies of `node`, in declaration order.
    #[must_use]
    pub fn dependencies(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).dependencies
    }

    pub fn add_validation(&mut self, node: NodeId, validation: impl Validation + 'static) {
        self.node_mut(node).validations.push(Box::new(validation));
    }

    /// Run the node's validation hooks plus the intrinsic API object checks.
    #[must_use]
    pub fn validate_node(&self, node: NodeId) -> Vec<String> {
        let node = self.node(node);
        let mut errors = match &node.kind {
            NodeKind::ApiObject(object) => object.intrinsic_errors(),
            _ => Vec::new(),
        };
        for validation in &node.validations {
            errors.extend(validation.validate());
        }
        errors
    }

    /// Ids from the root down to `node`, the root's empty id included.
    #[must_use]
    pub fn scope_ids(&self, node: NodeId) -> Vec<&str> {
        let mut ids = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let node = self.node(id);
            ids.push(node.id.as_str());
            current = node.parent;
        }
        ids.reverse();
        ids
    }

    /// Path of `node`: non-empty ids from the root joined with `/`.
    #[must_use]
    pub fn path(&self, node: NodeId) -> String {
        self.scope_ids(node).into_iter().filter(|id| !id.is_empty()).collect::<Vec<_>>().join("/")
    }

    fn display_path(&self, node: NodeId) -> String {
        let path = self.path(node);
        if path.is_empty() {
            "<root>".to_string()
        } else {
            path
        }
    }

    /// Stable address of `node`, see [`names::address_of`].
    #[must_use]
    pub fn address(&self, node: NodeId) -> String {
        names::address_of(&self.scope_ids(node))
    }

    /// `node` and all of its descendants in pre-order.
    #[must_use]
    pub fn find_all(&self, node: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            found.push(current);
            stack.extend(self.node(current).children.iter().rev());
        }
        found
    }

    /// The closest chart at or above `node`.
    #[must_use]
    pub fn owning_chart(&self, node: NodeId) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if matches!(self.node(id).kind, NodeKind::Chart(_)) {
                return Some(id);
            }
            current = self.node(id).parent;
        }
        None
    }

    /// Render the manifest document of an API object.
    ///
    /// Returns `None` for nodes that are not API objects.
    #[must_use]
    pub fn render(&self, node: NodeId) -> Option<Value> {
        let object = self.node(node).api_object()?;

        let default_props = ChartProps::default();
        let props = match self.owning_chart(node).map(|chart| &self.node(chart).kind) {
            Some(NodeKind::Chart(props)) => props,
            _ => &default_props,
        };

        let ids = self.scope_ids(node);
        let components: Vec<&str> = ids.iter().copied().filter(|id| !id.is_empty()).collect();
        let address = names::address_of(&ids);
        let generated_name =
            names::to_dns_label(&components, &address, !props.disable_resource_name_hashes);

        Some(object.to_manifest(&generated_name, props.namespace.as_deref(), &props.labels))
    }
}

impl Default for ConstructTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder handle positioned at one node of a [`ConstructTree`].
///
/// New children are created below the scope's node; [`Scope::scope`]
/// descends into one of them.
pub struct Scope<'a> {
    tree: &'a mut ConstructTree,
    node: NodeId,
}

impl Scope<'_> {
    /// The node this scope builds under.
    #[must_use]
    pub const fn node_id(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn tree(&self) -> &ConstructTree {
        self.tree
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.tree.path(self.node)
    }

    pub fn api_object(&mut self, id: &str, object: ApiObject) -> Result<NodeId> {
        self.tree.add_api_object(self.node, id, object)
    }

    pub fn construct(&mut self, id: &str) -> Result<NodeId> {
        self.tree.add_construct(self.node, id)
    }

    /// Create a nested chart. Its API objects belong to the nested chart,
    /// not to the chart being synthesized.
    pub fn chart(&mut self, id: &str, props: ChartProps) -> Result<NodeId> {
        self.tree.add_chart(self.node, id, props)
    }

    /// Scope positioned at `node`.
    pub fn scope(&mut self, node: NodeId) -> Scope<'_> {
        Scope {
            tree: &mut *self.tree,
            node,
        }
    }

    pub fn add_dependency(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.tree.add_dependency(from, to)
    }

    pub fn add_validation(&mut self, node: NodeId, validation: impl Validation + 'static) {
        self.tree.add_validation(node, validation);
    }
}
