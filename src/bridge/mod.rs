//! Chart to Terraform synthesis.
//!
//! A [`ChartBridge`] run instantiates a chart definition in a fresh
//! [`ConstructTree`] and re-emits every API object the chart owns as a
//! `kubernetes_manifest` resource in a [`Stack`]:
//!
//! 1. [`validate::validate_tree`] runs every validation hook; any message
//!    aborts the run before anything is emitted
//! 2. [`extract::extract_api_objects`] orders the chart's API objects so
//!    dependencies come first
//! 3. [`naming::synthesize_name`] derives each manifest's name
//! 4. [`emit::emit_manifests`] resolves declared dependencies to manifests
//!    emitted earlier and registers the result
//!
//! Each run owns its tree and its dependency lookup table. Runs into the
//! same stack share nothing but the stack itself.
//!
//! # Examples
//!
//! ```rust
//! use chartform::bridge::{ChartBridge, SynthOptions, chart_fn};
//! use chartform::construct::ApiObject;
//! use chartform::terraform::Stack;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let chart = chart_fn(|scope| {
//!     let ns = scope.api_object("ns", ApiObject::new("v1", "Namespace").with_name("apps"))?;
//!     let deploy = scope.api_object(
//!         "deploy",
//!         ApiObject::new("apps/v1", "Deployment").with_field("spec", json!({ "replicas": 2 })),
//!     )?;
//!     scope.add_dependency(deploy, ns)?;
//!     Ok(())
//! });
//!
//! let mut stack = Stack::new();
//! let bridge = ChartBridge::new(&mut stack, "web", &chart, SynthOptions::default())?;
//!
//! assert_eq!(bridge.manifests().len(), 2);
//! assert_eq!(stack.manifests()[1].depends_on(), &bridge.manifests()[..1]);
//! # Ok(())
//! # }
//! ```

pub mod emit;
pub mod extract;
pub mod naming;
pub mod observer;
pub mod validate;

pub use observer::{NoopObserver, SynthObserver, TracingObserver};

use anyhow::{Context, Result};

use crate::construct::{ChartProps, ConstructTree, NodeId, Scope};
use crate::terraform::{ManifestOptions, ResourceRef, Stack};

/// Something that can populate a chart.
pub trait ChartDefinition {
    /// Options passed through from [`SynthOptions::chart_options`].
    type Props;

    /// Chart-level defaults for the API objects this chart owns.
    fn chart_props(&self, _props: Option<&Self::Props>) -> ChartProps {
        ChartProps::default()
    }

    /// Create the chart's children below `scope`.
    fn define(&self, scope: &mut Scope<'_>, props: Option<&Self::Props>) -> Result<()>;
}

/// A chart defined by a closure, see [`chart_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FnChart<F>(F);

/// Wrap a closure as a [`ChartDefinition`] without props.
pub fn chart_fn<F>(define: F) -> FnChart<F>
where
    F: Fn(&mut Scope<'_>) -> Result<()>,
{
    FnChart(define)
}

impl<F> ChartDefinition for FnChart<F>
where
    F: Fn(&mut Scope<'_>) -> Result<()>,
{
    type Props = ();

    fn define(&self, scope: &mut Scope<'_>, _props: Option<&()>) -> Result<()> {
        (self.0)(scope)
    }
}

/// Caller options of one run.
#[derive(Debug, Clone)]
pub struct SynthOptions<P> {
    /// Forwarded to the chart definition
    pub chart_options: Option<P>,
    /// Applied to every emitted manifest
    pub manifest_options: Option<ManifestOptions>,
}

impl<P> Default for SynthOptions<P> {
    fn default() -> Self {
        Self {
            chart_options: None,
            manifest_options: None,
        }
    }
}

/// The result of synthesizing one chart into a stack.
#[derive(Debug)]
pub struct ChartBridge {
    name: String,
    tree: ConstructTree,
    chart: NodeId,
    manifests: Vec<ResourceRef>,
}

impl ChartBridge {
    /// Synthesize `definition` as chart `name`, reporting progress through
    /// [`TracingObserver`].
    pub fn new<D: ChartDefinition>(
        stack: &mut Stack,
        name: &str,
        definition: &D,
        options: SynthOptions<D::Props>,
    ) -> Result<Self> {
        Self::with_observer(stack, name, definition, options, &TracingObserver)
    }

    /// Synthesize `definition` as chart `name`.
    ///
    /// `name` is both the chart id in the fresh construct tree and the
    /// prefix of every manifest name.
    pub fn with_observer<D: ChartDefinition>(
        stack: &mut Stack,
        name: &str,
        definition: &D,
        options: SynthOptions<D::Props>,
        observer: &dyn SynthObserver,
    ) -> Result<Self> {
        let chart_options = options.chart_options.as_ref();

        let mut tree = ConstructTree::new();
        let chart = tree.add_chart(tree.root(), name, definition.chart_props(chart_options))?;
        definition
            .define(&mut tree.scope(chart), chart_options)
            .with_context(|| format!("Failed to define chart '{name}'"))?;

        let nodes = validate::validate_tree(&tree, chart)?;
        observer.validated(name, nodes);

        let objects = extract::extract_api_objects(&tree, chart)?;
        let paths: Vec<String> = objects.iter().map(|&node| tree.path(node)).collect();
        observer.extracted(name, &paths);

        let manifest_options = options.manifest_options.unwrap_or_default();
        let manifests =
            emit::emit_manifests(stack, &tree, name, &objects, &manifest_options, observer)?;

        Ok(Self {
            name: name.to_string(),
            tree,
            chart,
            manifests,
        })
    }

    /// Emitted manifests, dependencies first.
    #[must_use]
    pub fn manifests(&self) -> &[ResourceRef] {
        &self.manifests
    }

    #[must_use]
    pub const fn tree(&self) -> &ConstructTree {
        &self.tree
    }

    /// The chart root in [`Self::tree`].
    #[must_use]
    pub const fn chart(&self) -> NodeId {
        self.chart
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
