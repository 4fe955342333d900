//! Options applied uniformly to every manifest of a synthesis run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ResourceRef;

/// Server-side apply field manager settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldManager {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_conflicts: Option<bool>,
}

/// Operation timeouts, e.g. `"5m"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

/// Wait conditions evaluated after apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wait {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout: Option<bool>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    /// Written as Terraform's `condition` blocks
    #[serde(rename = "condition", alias = "conditions", default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Map<String, Value>>,
}

/// Per-run configuration spread onto every emitted manifest.
///
/// `depends_on` is merged into each manifest's dependency list after the
/// references resolved from the construct tree. Every other field is passed
/// through to the resource unchanged; keys not modelled here land in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ResourceRef>,
    /// Provider reference such as `kubernetes.staging`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_manager: Option<FieldManager>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeouts: Option<Timeouts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait: Option<Wait>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ManifestOptions {
    /// Layer `overrides` on top of `self`.
    ///
    /// `depends_on` lists are concatenated (ours first), set fields of
    /// `overrides` replace ours, and `extra` keys are merged with
    /// `overrides` winning.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chartform::terraform::{ManifestOptions, ResourceRef};
    ///
    /// let defaults = ManifestOptions {
    ///     depends_on: vec![ResourceRef::new("kubernetes_namespace", "apps")],
    ///     provider: Some("kubernetes".to_string()),
    ///     ..ManifestOptions::default()
    /// };
    /// let overrides = ManifestOptions {
    ///     depends_on: vec![ResourceRef::new("kubernetes_secret", "token")],
    ///     provider: Some("kubernetes.staging".to_string()),
    ///     ..ManifestOptions::default()
    /// };
    ///
    /// let merged = defaults.merged_with(&overrides);
    /// assert_eq!(merged.depends_on.len(), 2);
    /// assert_eq!(merged.provider.as_deref(), Some("kubernetes.staging"));
    /// ```
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        let mut merged = self.clone();
        merged.depends_on.extend(overrides.depends_on.iter().cloned());
        if overrides.provider.is_some() {
            merged.provider.clone_from(&overrides.provider);
        }
        if overrides.field_manager.is_some() {
            merged.field_manager.clone_from(&overrides.field_manager);
        }
        if overrides.timeouts.is_some() {
            merged.timeouts.clone_from(&overrides.timeouts);
        }
        if overrides.computed_fields.is_some() {
            merged.computed_fields.clone_from(&overrides.computed_fields);
        }
        if overrides.wait.is_some() {
            merged.wait.clone_from(&overrides.wait);
        }
        for (key, value) in &overrides.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Every option except `depends_on`, as Terraform JSON attributes.
    #[must_use]
    pub fn passthrough(&self) -> Map<String, Value> {
        let without_dependencies = Self {
            depends_on: Vec::new(),
            ..self.clone()
        };
        match serde_json::to_value(without_dependencies) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}
