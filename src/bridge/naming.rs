//! Deterministic manifest names.

use serde_json::Value;

use crate::construct::names::HASH_LEN;

/// The parts of a rendered manifest that identify it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceIdentity {
    pub api_version: String,
    pub kind: String,
    pub name: Option<String>,
    pub namespace: Option<String>,
}

impl ResourceIdentity {
    /// Read the identity from a rendered manifest document.
    ///
    /// Empty strings count as absent.
    #[must_use]
    pub fn from_manifest(manifest: &Value) -> Self {
        let text = |value: &Value| value.as_str().filter(|s| !s.is_empty()).map(str::to_string);
        let metadata = &manifest["metadata"];

        Self {
            api_version: manifest["apiVersion"].as_str().unwrap_or_default().to_string(),
            kind: manifest["kind"].as_str().unwrap_or_default().to_string(),
            name: text(&metadata["name"]),
            namespace: text(&metadata["namespace"]),
        }
    }

    /// `apps/v1` + `Deployment` becomes `apps--v1-Deployment`.
    #[must_use]
    pub fn type_tag(&self) -> String {
        format!("{}-{}", self.api_version.replace('/', "--"), self.kind)
    }
}

/// Synthesize the manifest name for one API object.
///
/// The result is `<group>-<type tag>-<base>` plus `-<namespace>` when the
/// object has one. `base` is the object's `metadata.name`, else the first
/// characters of `address` (the node's stable tree address). A
/// `generateName` prefix is ignored.
///
/// ```rust
/// use chartform::bridge::naming::{ResourceIdentity, synthesize_name};
/// use serde_json::json;
///
/// let identity = ResourceIdentity::from_manifest(&json!({
///     "apiVersion": "apps/v1",
///     "kind": "Deployment",
///     "metadata": { "name": "web-deploy-c8d5cbf2", "namespace": "apps" }
/// }));
/// assert_eq!(
///     synthesize_name("web", &identity, "c8d5cbf2"),
///     "web-apps--v1-Deployment-web-deploy-c8d5cbf2-apps"
/// );
/// ```
#[must_use]
pub fn synthesize_name(group: &str, identity: &ResourceIdentity, address: &str) -> String {
    let base = identity
        .name
        .as_deref()
        .unwrap_or_else(|| address.get(..HASH_LEN).unwrap_or(address));
    let namespace_suffix =
        identity.namespace.as_ref().map(|ns| format!("-{ns}")).unwrap_or_default();

    format!("{group}-{}-{base}{namespace_suffix}", identity.type_tag())
}
