//! Project configuration (`chartform.toml`).
//!
//! The configuration supplies the Kubernetes provider block and the
//! manifest options applied to every chart of a `synth` run. Chart files
//! may layer their own `manifest_options` on top.
//!
//! # Location
//!
//! The first of these wins:
//!
//! 1. the path passed with `--config` (must exist)
//! 2. the `CHARTFORM_CONFIG` environment variable (must exist)
//! 3. `chartform.toml` in the current directory, if present
//!
//! With none of them, [`ProjectConfig::default`] is used.
//!
//! # File Format
//!
//! ```toml
//! [provider]
//! source = "hashicorp/kubernetes"
//! version = "2.12.1"
//!
//! [provider.config]
//! config_path = "~/.kube/config"
//!
//! [manifest]
//! depends_on = ["kubernetes_namespace.apps"]
//! computed_fields = ["metadata.labels"]
//!
//! [manifest.field_manager]
//! name = "chartform"
//! force_conflicts = true
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::core::ChartformError;
use crate::terraform::{ManifestOptions, ProviderRequirement, Stack};

/// Default file name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "chartform.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_ENV_VAR: &str = "CHARTFORM_CONFIG";

/// Provider name used for `kubernetes_manifest` resources.
pub const PROVIDER_NAME: &str = "kubernetes";

fn default_provider_source() -> String {
    "hashicorp/kubernetes".to_string()
}

/// The `[provider]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_source")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Provider block contents, passed through verbatim
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: default_provider_source(),
            version: None,
            config: Map::new(),
        }
    }
}

/// Contents of `chartform.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,
    /// Defaults for every emitted manifest
    #[serde(default)]
    pub manifest: ManifestOptions,
}

impl ProjectConfig {
    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ChartformError::ConfigError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Load a configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ChartformError::ConfigError {
            message: format!("Cannot read {}: {e}", path.display()),
        })?;
        toml::from_str(&content).map_err(|e| {
            ChartformError::ConfigError {
                message: format!("Invalid configuration in {}: {e}", path.display()),
            }
            .into()
        })
    }

    /// Locate and load the project configuration.
    ///
    /// See the [module documentation](self) for the lookup order.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);

        match resolve_path(explicit, from_env, &cwd) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Add the configured provider to `stack`, if any.
    pub fn apply_provider(&self, stack: &mut Stack) {
        if let Some(provider) = &self.provider {
            stack.require_provider(
                PROVIDER_NAME,
                ProviderRequirement {
                    source: provider.source.clone(),
                    version: provider.version.clone(),
                },
            );
            stack.add_provider(PROVIDER_NAME, Value::Object(provider.config.clone()));
        }
    }
}

/// Pick the configuration file to read.
///
/// Explicit and environment paths are returned even when missing, so that
/// a typo is reported instead of silently falling back to defaults.
#[must_use]
pub fn resolve_path(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    cwd: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    let local = cwd.join(CONFIG_FILE_NAME);
    local.is_file().then_some(local)
}
