//! Kubernetes API objects as construct tree leaves.
//!
//! An [`ApiObject`] stores the declared state of one Kubernetes resource.
//! The fully resolved manifest document is produced by
//! [`ConstructTree::render`](super::ConstructTree::render), which fills in
//! chart defaults and generated names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static DNS_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

const RESERVED_BODY_KEYS: [&str; 3] = ["apiVersion", "kind", "metadata"];

/// Object metadata as declared by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiObjectMetadata {
    /// Explicit object name. Generated from the construct path when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Server-side name generation prefix, used only when `name` is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_name: Option<String>,
    /// Namespace. Falls back to the owning chart's namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A single Kubernetes resource declaration.
///
/// # Examples
///
/// ```rust
/// use chartform::construct::ApiObject;
/// use serde_json::json;
///
/// let service = ApiObject::new("v1", "Service")
///     .with_namespace("apps")
///     .with_field("spec", json!({ "ports": [{ "port": 8080 }] }));
/// assert_eq!(service.kind, "Service");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiObject {
    /// `apiVersion`, e.g. `apps/v1` or `v1`
    pub api_version: String,
    /// `kind`, e.g. `Deployment`
    pub kind: String,
    pub metadata: ApiObjectMetadata,
    /// Every other top-level field (`spec`, `data`, `rules`, ...)
    pub body: Map<String, Value>,
}

impl ApiObject {
    /// Create an object with empty metadata and body.
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.metadata.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_generate_name(mut self, prefix: impl Into<String>) -> Self {
        self.metadata.generate_name = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    /// Set a top-level body field such as `spec`.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    /// Checks every API object gets regardless of user validation hooks.
    pub(crate) fn intrinsic_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.api_version.trim().is_empty() {
            errors.push("apiVersion must not be empty".to_string());
        }
        if self.kind.trim().is_empty() {
            errors.push("kind must not be empty".to_string());
        }
        if let Some(namespace) = &self.metadata.namespace {
            if !is_dns_label(namespace) {
                errors.push(format!(
                    "namespace '{namespace}' must be a lowercase RFC 1123 label of at most 63 characters"
                ));
            }
        }
        for key in RESERVED_BODY_KEYS {
            if self.body.contains_key(key) {
                errors.push(format!("body must not redefine '{key}'"));
            }
        }

        errors
    }

    /// Render the manifest document.
    ///
    /// `generated_name` is used when neither `name` nor `generateName` is
    /// declared. Chart defaults are applied underneath the object's own
    /// metadata.
    pub(crate) fn to_manifest(
        &self,
        generated_name: &str,
        chart_namespace: Option<&str>,
        chart_labels: &BTreeMap<String, String>,
    ) -> Value {
        let mut metadata = Map::new();

        match (&self.metadata.name, &self.metadata.generate_name) {
            (Some(name), _) => {
                metadata.insert("name".to_string(), Value::String(name.clone()));
            }
            (None, Some(prefix)) => {
                metadata.insert("generateName".to_string(), Value::String(prefix.clone()));
            }
            (None, None) => {
                metadata.insert("name".to_string(), Value::String(generated_name.to_string()));
            }
        }

        if let Some(namespace) = self.metadata.namespace.as_deref().or(chart_namespace) {
            metadata.insert("namespace".to_string(), Value::String(namespace.to_string()));
        }

        let mut labels = chart_labels.clone();
        labels.extend(self.metadata.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        if !labels.is_empty() {
            metadata.insert("labels".to_string(), string_map(&labels));
        }
        if !self.metadata.annotations.is_empty() {
            metadata.insert("annotations".to_string(), string_map(&self.metadata.annotations));
        }

        let mut document = Map::new();
        document.insert("apiVersion".to_string(), Value::String(self.api_version.clone()));
        document.insert("kind".to_string(), Value::String(self.kind.clone()));
        document.insert("metadata".to_string(), Value::Object(metadata));
        for (key, value) in &self.body {
            if RESERVED_BODY_KEYS.contains(&key.as_str()) {
                continue;
            }
            document.insert(key.clone(), value.clone());
        }

        Value::Object(document)
    }
}

fn string_map(map: &BTreeMap<String, String>) -> Value {
    Value::Object(map.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect())
}

/// Whether `value` is a valid RFC 1123 label.
#[must_use]
pub fn is_dns_label(value: &str) -> bool {
    value.len() <= 63 && DNS_LABEL.is_match(value)
}
