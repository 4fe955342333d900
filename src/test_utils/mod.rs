//! Test utilities for chartform
//!
//! Shared by unit tests and, through the `test-utils` feature, by the
//! integration tests. Provides logging setup and the Kubernetes objects
//! most tests build charts from.
//!
//! # Example
//!
//! ```rust,no_run
//! use chartform::bridge::{ChartBridge, SynthOptions, chart_fn};
//! use chartform::terraform::Stack;
//! use chartform::test_utils::{deployment, init_test_logging};
//!
//! init_test_logging(None);
//! let chart = chart_fn(|scope| {
//!     scope.api_object("deploy", deployment())?;
//!     Ok(())
//! });
//! let mut stack = Stack::new();
//! ChartBridge::new(&mut stack, "web", &chart, SynthOptions::default()).unwrap();
//! ```

use serde_json::{Value, json};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::construct::ApiObject;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. `level` wins over `RUST_LOG`; with
/// neither, logging stays off.
///
/// ```bash
/// RUST_LOG=bridge=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

pub const CONTAINER_NAME: &str = "hello-kubernetes";
pub const IMAGE: &str = "paulbouwer/hello-kubernetes:1.7";
pub const PORT: u16 = 8080;

/// A single-replica deployment spec labelled `app: test`, running `image` on `port`.
#[must_use]
pub fn deployment_spec_with(container: &str, image: &str, port: u16) -> Value {
    json!({
        "replicas": 1,
        "selector": { "matchLabels": { "app": "test" } },
        "template": {
            "metadata": { "labels": { "app": "test" } },
            "spec": {
                "containers": [{
                    "name": container,
                    "image": image,
                    "ports": [{ "containerPort": port }]
                }]
            }
        }
    })
}

#[must_use]
pub fn deployment_spec() -> Value {
    deployment_spec_with(CONTAINER_NAME, IMAGE, PORT)
}

/// `apps/v1` Deployment with [`deployment_spec`].
#[must_use]
pub fn deployment() -> ApiObject {
    ApiObject::new("apps/v1", "Deployment").with_field("spec", deployment_spec())
}

/// `v1` Service selecting the sample deployment.
#[must_use]
pub fn service() -> ApiObject {
    ApiObject::new("v1", "Service").with_field(
        "spec",
        json!({
            "selector": { "app": "test" },
            "ports": [{ "port": PORT }]
        }),
    )
}

/// `v1` Namespace called `name`.
#[must_use]
pub fn namespace(name: &str) -> ApiObject {
    ApiObject::new("v1", "Namespace").with_name(name)
}
