//! Declarative YAML charts.
//!
//! A chart file describes a chart without Rust code. Entries under
//! `objects` become construct tree nodes:
//!
//! - an entry with `chart` becomes a nested chart (its objects are left out
//!   of the enclosing chart's run)
//! - an entry with `apiVersion` or `kind` becomes an API object; every key
//!   besides `id`, `depends_on`, `objects` and `metadata` is part of its body
//! - any other entry is a plain grouping construct
//!
//! Grouping constructs and nested charts have no body, so any key they
//! carry besides the ones above fails validation.
//!
//! `depends_on` lists paths relative to the chart root. They are resolved
//! after every node exists, so an entry may depend on one declared later.
//!
//! ```yaml
//! name: web
//! namespace: apps
//! objects:
//!   - id: ns
//!     apiVersion: v1
//!     kind: Namespace
//!     metadata: { name: apps }
//!   - id: backend
//!     objects:
//!       - id: deploy
//!         apiVersion: apps/v1
//!         kind: Deployment
//!         depends_on: [ns]
//!         spec: { replicas: 1 }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use strsim::levenshtein;

use crate::bridge::ChartDefinition;
use crate::construct::{ApiObject, ApiObjectMetadata, ChartProps, NodeId, Scope};
use crate::core::ChartformError;
use crate::terraform::ManifestOptions;

/// Keys that make an entry an API object.
const API_OBJECT_KEYS: [&str; 3] = ["apiVersion", "kind", "metadata"];

/// Maximum edit distance, as a percentage of the unknown path's length,
/// for a known path to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// A chart loaded from YAML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartFile {
    /// Chart name; defaults to the file stem when loaded from disk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub disable_resource_name_hashes: bool,
    /// Options for this chart's manifests, layered over project defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_options: Option<ManifestOptions>,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
}

/// Settings of a nested chart entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedChart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub disable_resource_name_hashes: bool,
}

impl From<&NestedChart> for ChartProps {
    fn from(chart: &NestedChart) -> Self {
        Self {
            namespace: chart.namespace.clone(),
            labels: chart.labels.clone(),
            disable_resource_name_hashes: chart.disable_resource_name_hashes,
        }
    }
}

/// One entry of an `objects` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<NestedChart>,
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ApiObjectMetadata>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ObjectSpec {
    #[must_use]
    pub const fn is_api_object(&self) -> bool {
        self.api_version.is_some() || self.kind.is_some()
    }

    /// Keys of a container or nested-chart entry that would otherwise be
    /// dropped, sorted.
    #[must_use]
    pub fn ignored_keys(&self) -> Vec<String> {
        if self.chart.is_none() && self.is_api_object() {
            return Vec::new();
        }

        let mut keys: Vec<String> = self.body.keys().cloned().collect();
        if self.api_version.is_some() {
            keys.push("apiVersion".to_string());
        }
        if self.kind.is_some() {
            keys.push("kind".to_string());
        }
        if self.metadata.is_some() {
            keys.push("metadata".to_string());
        }
        keys.sort();
        keys
    }

    /// The declared API object. A missing `apiVersion` or `kind` is left
    /// empty and reported by validation.
    #[must_use]
    pub fn to_api_object(&self) -> ApiObject {
        ApiObject {
            api_version: self.api_version.clone().unwrap_or_default(),
            kind: self.kind.clone().unwrap_or_default(),
            metadata: self.metadata.clone().unwrap_or_default(),
            body: self.body.clone(),
        }
    }
}

impl ChartFile {
    /// Parse a chart from YAML. `origin` names the source in errors.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            ChartformError::ChartFileParseError {
                file: origin.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Load a chart file, defaulting its name to the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chart file: {}", path.display()))?;
        let mut chart = Self::parse(&content, &path.display().to_string())?;

        if chart.name.is_none() {
            chart.name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned());
        }
        Ok(chart)
    }

    /// The chart name, if declared or derived from the file name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Chart-level defaults declared at the top of the file.
    #[must_use]
    pub fn props(&self) -> ChartProps {
        ChartProps {
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
            disable_resource_name_hashes: self.disable_resource_name_hashes,
        }
    }
}

/// `Props` replaces the file's own chart-level settings when given.
impl ChartDefinition for ChartFile {
    type Props = ChartProps;

    fn chart_props(&self, props: Option<&ChartProps>) -> ChartProps {
        props.cloned().unwrap_or_else(|| self.props())
    }

    fn define(&self, scope: &mut Scope<'_>, _props: Option<&ChartProps>) -> Result<()> {
        let mut pending = Vec::new();
        build(scope, &self.objects, &mut pending)?;

        let chart = scope.node_id();
        for (node, spec) in pending {
            for dependency in &spec.depends_on {
                let target = scope
                    .tree()
                    .find_path(chart, dependency)
                    .filter(|&target| target != chart)
                    .ok_or_else(|| unknown_dependency(scope, node, dependency))?;
                scope.add_dependency(node, target)?;
            }
        }
        Ok(())
    }
}

fn build<'a>(
    scope: &mut Scope<'_>,
    specs: &'a [ObjectSpec],
    pending: &mut Vec<(NodeId, &'a ObjectSpec)>,
) -> Result<()> {
    for spec in specs {
        let node = if let Some(chart) = &spec.chart {
            scope.chart(&spec.id, chart.into())?
        } else if spec.is_api_object() {
            scope.api_object(&spec.id, spec.to_api_object())?
        } else {
            scope.construct(&spec.id)?
        };

        let ignored = spec.ignored_keys();
        if !ignored.is_empty() {
            let message = ignored_keys_message(spec, &ignored);
            scope.add_validation(node, move || vec![message.clone()]);
        }

        if !spec.depends_on.is_empty() {
            pending.push((node, spec));
        }
        build(&mut scope.scope(node), &spec.objects, pending)?;
    }
    Ok(())
}

fn ignored_keys_message(spec: &ObjectSpec, ignored: &[String]) -> String {
    let known: Vec<String> = API_OBJECT_KEYS.iter().map(ToString::to_string).collect();
    let keys: Vec<String> = ignored
        .iter()
        .map(|key| match closest_match(key, &known).filter(|m| m != key) {
            Some(suggestion) => format!("'{key}' (did you mean '{suggestion}'?)"),
            None => format!("'{key}'"),
        })
        .collect();

    let entry = if spec.chart.is_some() {
        "a nested chart entry"
    } else {
        "an entry without apiVersion and kind"
    };
    format!("unexpected keys for {entry}: {}", keys.join(", "))
}

fn unknown_dependency(scope: &Scope<'_>, node: NodeId, dependency: &str) -> ChartformError {
    let tree = scope.tree();
    let chart = scope.node_id();
    let prefix = format!("{}/", tree.path(chart));

    let known: Vec<String> = tree
        .find_all(chart)
        .into_iter()
        .skip(1)
        .filter_map(|n| tree.path(n).strip_prefix(&prefix).map(str::to_string))
        .collect();

    ChartformError::UnknownDependency {
        object: tree.path(node),
        dependency: dependency.to_string(),
        suggestion: closest_match(dependency, &known),
    }
}

fn closest_match(target: &str, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| (candidate, levenshtein(target, candidate)))
        .filter(|(_, distance)| *distance <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate.clone())
}
