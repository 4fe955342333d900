//! Progress reporting for synthesis runs.

use crate::terraform::ResourceRef;

/// Receives progress notifications from a [`ChartBridge`](super::ChartBridge) run.
///
/// Every method has an empty default, so observers implement only what
/// they care about.
pub trait SynthObserver {
    /// The tree under `chart` passed validation.
    fn validated(&self, _chart: &str, _nodes: usize) {}

    /// Extraction produced `objects` API object paths in emission order.
    fn extracted(&self, _chart: &str, _objects: &[String]) {}

    /// One manifest was registered.
    fn emitted(&self, _chart: &str, _manifest: &ResourceRef, _depends_on: &[ResourceRef]) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SynthObserver for NoopObserver {}

/// Default observer: forwards progress to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SynthObserver for TracingObserver {
    fn validated(&self, chart: &str, nodes: usize) {
        tracing::debug!(target: "bridge", chart, nodes, "validated construct tree");
    }

    fn extracted(&self, chart: &str, objects: &[String]) {
        tracing::debug!(target: "bridge", chart, count = objects.len(), "extracted API objects: {}", objects.join(", "));
    }

    fn emitted(&self, chart: &str, manifest: &ResourceRef, depends_on: &[ResourceRef]) {
        let depends_on: Vec<String> = depends_on.iter().map(ToString::to_string).collect();
        tracing::debug!(
            target: "bridge",
            chart,
            manifest = %manifest,
            "emitted manifest depending on [{}]",
            depends_on.join(", ")
        );
    }
}
