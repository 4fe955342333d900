//! The provisioning side: a Terraform stack of `kubernetes_manifest` resources.
//!
//! A [`Stack`] collects everything a synthesis produces (manifests emitted
//! from charts, external resources declared by the caller and provider
//! blocks) and renders it as Terraform JSON (`*.tf.json`).
//!
//! # Examples
//!
//! ```rust
//! use chartform::terraform::{KubernetesManifest, ManifestOptions, Stack};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut stack = Stack::new();
//! let namespace = stack.add_resource(
//!     "kubernetes_namespace",
//!     "apps",
//!     json!({ "metadata": { "name": "apps" } }),
//! )?;
//!
//! let manifest = KubernetesManifest::new(
//!     "web-v1-ConfigMap-settings",
//!     json!({ "apiVersion": "v1", "kind": "ConfigMap", "metadata": { "name": "settings" } }),
//!     vec![namespace],
//!     &ManifestOptions::default(),
//! );
//! let reference = stack.add_manifest(manifest)?;
//!
//! assert_eq!(reference.to_string(), "kubernetes_manifest.web-v1-ConfigMap-settings");
//! assert_eq!(
//!     stack.to_json()["resource"]["kubernetes_manifest"]["web-v1-ConfigMap-settings"]["depends_on"],
//!     json!(["kubernetes_namespace.apps"])
//! );
//! # Ok(())
//! # }
//! ```

pub mod options;
pub mod resource_ref;

pub use options::{FieldManager, ManifestOptions, Timeouts, Wait};
pub use resource_ref::ResourceRef;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::core::ChartformError;

/// Terraform resource type of emitted manifests.
pub const MANIFEST_RESOURCE_TYPE: &str = "kubernetes_manifest";

/// Turn a name into a Terraform identifier.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, and a leading digit or
/// dash is prefixed with `_`.
///
/// ```rust
/// use chartform::terraform::terraform_identifier;
///
/// assert_eq!(
///     terraform_identifier("web-networking.k8s.io--v1-Ingress-edge"),
///     "web-networking_k8s_io--v1-Ingress-edge"
/// );
/// assert_eq!(terraform_identifier("1st"), "_1st");
/// ```
#[must_use]
pub fn terraform_identifier(name: &str) -> String {
    let mut identifier: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if identifier.chars().next().is_none_or(|c| c.is_ascii_digit() || c == '-') {
        identifier.insert(0, '_');
    }
    identifier
}

/// One `kubernetes_manifest` resource.
#[derive(Debug, Clone, PartialEq)]
pub struct KubernetesManifest {
    name: String,
    manifest: Value,
    depends_on: Vec<ResourceRef>,
    attributes: Map<String, Value>,
}

impl KubernetesManifest {
    /// Create a manifest resource.
    ///
    /// `options` contributes its pass-through attributes; its `depends_on`
    /// is *not* read here, callers merge it into `depends_on` themselves.
    pub fn new(
        name: impl Into<String>,
        manifest: Value,
        depends_on: Vec<ResourceRef>,
        options: &ManifestOptions,
    ) -> Self {
        Self {
            name: name.into(),
            manifest,
            depends_on,
            attributes: options.passthrough(),
        }
    }

    /// Synthesized unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn logical_id(&self) -> String {
        terraform_identifier(&self.name)
    }

    #[must_use]
    pub fn reference(&self) -> ResourceRef {
        ResourceRef::new(MANIFEST_RESOURCE_TYPE, self.logical_id())
    }

    /// The embedded Kubernetes document.
    #[must_use]
    pub const fn manifest(&self) -> &Value {
        &self.manifest
    }

    #[must_use]
    pub fn depends_on(&self) -> &[ResourceRef] {
        &self.depends_on
    }

    /// Pass-through attributes (field manager, timeouts, ...).
    #[must_use]
    pub const fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Append a dependency after synthesis.
    pub fn add_dependency(&mut self, reference: ResourceRef) {
        self.depends_on.push(reference);
    }

    /// The resource body as Terraform JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = self.attributes.clone();
        body.insert(
            "depends_on".to_string(),
            Value::Array(self.depends_on.iter().map(|r| Value::String(r.to_string())).collect()),
        );
        body.insert("manifest".to_string(), self.manifest.clone());
        Value::Object(body)
    }
}

/// `required_providers` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequirement {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The output registry of one or more synthesis runs.
#[derive(Debug, Default)]
pub struct Stack {
    manifests: Vec<KubernetesManifest>,
    manifest_index: HashMap<String, usize>,
    resources: BTreeMap<String, BTreeMap<String, Value>>,
    providers: BTreeMap<String, Vec<Value>>,
    required_providers: BTreeMap<String, ProviderRequirement>,
}

impl Stack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manifest.
    ///
    /// Fails with [`ChartformError::DuplicateResourceName`] if a manifest
    /// with the same name or logical id is already registered.
    pub fn add_manifest(&mut self, manifest: KubernetesManifest) -> Result<ResourceRef> {
        let logical_id = manifest.logical_id();
        let taken = self.manifest_index.contains_key(manifest.name())
            || self.manifests.iter().any(|m| m.logical_id() == logical_id);
        if taken {
            return Err(ChartformError::DuplicateResourceName {
                name: manifest.name().to_string(),
            }
            .into());
        }

        let reference = manifest.reference();
        self.manifest_index.insert(manifest.name().to_string(), self.manifests.len());
        self.manifests.push(manifest);
        Ok(reference)
    }

    /// Register any other resource, e.g. a `kubernetes_namespace`.
    pub fn add_resource(
        &mut self,
        resource_type: &str,
        logical_id: &str,
        body: Value,
    ) -> Result<ResourceRef> {
        let reference: ResourceRef = format!("{resource_type}.{logical_id}")
            .parse()
            .with_context(|| format!("Cannot register resource '{resource_type}.{logical_id}'"))?;
        if resource_type == MANIFEST_RESOURCE_TYPE {
            return Err(ChartformError::Other {
                message: "kubernetes_manifest resources must be added with add_manifest".to_string(),
            }
            .into());
        }

        let resources = self.resources.entry(resource_type.to_string()).or_default();
        if resources.contains_key(logical_id) {
            return Err(ChartformError::DuplicateResourceName {
                name: reference.to_string(),
            }
            .into());
        }
        resources.insert(logical_id.to_string(), body);
        Ok(reference)
    }

    /// Add a provider configuration block.
    pub fn add_provider(&mut self, name: &str, config: Value) {
        self.providers.entry(name.to_string()).or_default().push(config);
    }

    pub fn require_provider(&mut self, name: &str, requirement: ProviderRequirement) {
        self.required_providers.insert(name.to_string(), requirement);
    }

    /// Manifests in registration order.
    #[must_use]
    pub fn manifests(&self) -> &[KubernetesManifest] {
        &self.manifests
    }

    /// Look up a manifest by its synthesized name.
    #[must_use]
    pub fn manifest(&self, name: &str) -> Option<&KubernetesManifest> {
        self.manifest_index.get(name).map(|&i| &self.manifests[i])
    }

    /// Look up a manifest by the reference [`Self::add_manifest`] returned.
    #[must_use]
    pub fn resolve(&self, reference: &ResourceRef) -> Option<&KubernetesManifest> {
        if reference.resource_type() != MANIFEST_RESOURCE_TYPE {
            return None;
        }
        self.manifests.iter().find(|m| m.logical_id() == reference.logical_id())
    }

    /// Mutable access for post-hoc composition.
    pub fn manifest_mut(&mut self, reference: &ResourceRef) -> Option<&mut KubernetesManifest> {
        if reference.resource_type() != MANIFEST_RESOURCE_TYPE {
            return None;
        }
        self.manifests.iter_mut().find(|m| m.logical_id() == reference.logical_id())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty() && self.resources.is_empty() && self.providers.is_empty()
    }

    /// Render the stack as Terraform JSON.
    ///
    /// Sections without content are omitted, so an empty stack renders as `{}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();

        if !self.providers.is_empty() {
            let providers = self
                .providers
                .iter()
                .map(|(name, blocks)| (name.clone(), Value::Array(blocks.clone())))
                .collect();
            root.insert("provider".to_string(), Value::Object(providers));
        }

        let mut resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|(resource_type, entries)| {
                let entries = entries.iter().map(|(id, body)| (id.clone(), body.clone())).collect();
                (resource_type.clone(), Value::Object(entries))
            })
            .collect();
        if !self.manifests.is_empty() {
            let manifests =
                self.manifests.iter().map(|m| (m.logical_id(), m.to_json())).collect();
            resources.insert(MANIFEST_RESOURCE_TYPE.to_string(), Value::Object(manifests));
        }
        if !resources.is_empty() {
            root.insert("resource".to_string(), Value::Object(resources));
        }

        if !self.required_providers.is_empty() {
            let required: Map<String, Value> = self
                .required_providers
                .iter()
                .map(|(name, requirement)| {
                    (name.clone(), serde_json::to_value(requirement).unwrap_or(Value::Null))
                })
                .collect();
            let mut terraform = Map::new();
            terraform.insert("required_providers".to_string(), Value::Object(required));
            root.insert("terraform".to_string(), Value::Object(terraform));
        }

        Value::Object(root)
    }

    /// Pretty-printed Terraform JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_json()).context("Failed to serialize stack")
    }
}
