//! chartform - cdk8s-style charts as Terraform `kubernetes_manifest` resources
//!
//! A chart is a tree of Kubernetes API objects grouped under constructs.
//! chartform instantiates a chart in an isolated construct tree, validates
//! it, orders its API objects so that declared dependencies come first, and
//! re-emits each object as one `kubernetes_manifest` resource in a
//! Terraform stack. Dependencies between objects become `depends_on`
//! references between the manifests; callers can add external references
//! (a `kubernetes_namespace` managed elsewhere, for example) to every
//! manifest of a run.
//!
//! # Core Modules
//!
//! - [`bridge`] - the synthesis pipeline and its entry point [`bridge::ChartBridge`]
//! - [`construct`] - construct tree, dependency graph and object naming
//! - [`terraform`] - stack, manifest resources and Terraform JSON output
//! - [`core`] - error types and user-facing error rendering
//!
//! ## Supporting Modules
//!
//! - [`chart_file`] - declarative YAML charts
//! - [`config`] - project configuration (`chartform.toml`)
//! - [`cli`] - the `chartform` command line
//!
//! # Example
//!
//! ```rust
//! use chartform::bridge::{ChartBridge, SynthOptions, chart_fn};
//! use chartform::construct::ApiObject;
//! use chartform::terraform::{ManifestOptions, Stack};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut stack = Stack::new();
//! let namespace = stack.add_resource(
//!     "kubernetes_namespace",
//!     "apps",
//!     serde_json::json!({ "metadata": { "name": "apps" } }),
//! )?;
//!
//! let chart = chart_fn(|scope| {
//!     scope.api_object("deploy", ApiObject::new("apps/v1", "Deployment").with_namespace("apps"))?;
//!     Ok(())
//! });
//! let options = SynthOptions {
//!     chart_options: None,
//!     manifest_options: Some(ManifestOptions {
//!         depends_on: vec![namespace],
//!         ..ManifestOptions::default()
//!     }),
//! };
//! let bridge = ChartBridge::new(&mut stack, "web", &chart, options)?;
//!
//! let deploy = stack.resolve(&bridge.manifests()[0]).unwrap();
//! assert!(deploy.name().starts_with("web-apps--v1-Deployment-web-deploy-c8"));
//! assert!(deploy.name().ends_with("-apps"));
//! assert_eq!(deploy.depends_on()[0].to_string(), "kubernetes_namespace.apps");
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod chart_file;
pub mod cli;
pub mod config;
pub mod construct;
pub mod core;
pub mod terraform;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
