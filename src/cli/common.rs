//! Shared plumbing for CLI commands.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::bridge::{ChartBridge, SynthOptions};
use crate::chart_file::ChartFile;
use crate::config::ProjectConfig;
use crate::core::ChartformError;
use crate::terraform::Stack;

/// What every command needs besides its own arguments.
#[derive(Debug, Default)]
pub struct CommandContext {
    /// Loaded `chartform.toml`, or defaults
    pub project: ProjectConfig,
    /// Suppress informational output
    pub quiet: bool,
}

impl CommandContext {
    /// Load the project configuration from `config_path` or the default
    /// locations.
    pub fn load(config_path: Option<&Path>, quiet: bool) -> Result<Self> {
        Ok(Self {
            project: ProjectConfig::load(config_path)?,
            quiet,
        })
    }
}

/// One emitted manifest, as reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestReport {
    pub name: String,
    pub resource: String,
    pub depends_on: Vec<String>,
}

/// The outcome of one chart file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartReport {
    pub chart: String,
    pub file: PathBuf,
    pub manifests: Vec<ManifestReport>,
}

/// Synthesize each chart file into `stack`, one isolated run per file.
///
/// Project manifest options apply to every chart; a chart's own
/// `manifest_options` are layered on top.
pub fn synthesize_charts(
    paths: &[PathBuf],
    project: &ProjectConfig,
    stack: &mut Stack,
) -> Result<Vec<ChartReport>> {
    let mut reports = Vec::with_capacity(paths.len());

    for path in paths {
        let chart = ChartFile::load(path)?;
        let name = chart.name().map(str::to_string).ok_or_else(|| ChartformError::ChartFileParseError {
            file: path.display().to_string(),
            reason: "chart has no name".to_string(),
        })?;

        let manifest_options = match &chart.manifest_options {
            Some(own) => project.manifest.merged_with(own),
            None => project.manifest.clone(),
        };
        let options = SynthOptions {
            chart_options: None,
            manifest_options: Some(manifest_options),
        };

        tracing::info!("Synthesizing chart '{}' from {}", name, path.display());
        let bridge = ChartBridge::new(stack, &name, &chart, options)
            .with_context(|| format!("Failed to synthesize {}", path.display()))?;

        let manifests = bridge
            .manifests()
            .iter()
            .filter_map(|reference| {
                stack.resolve(reference).map(|manifest| ManifestReport {
                    name: manifest.name().to_string(),
                    resource: reference.to_string(),
                    depends_on: manifest.depends_on().iter().map(ToString::to_string).collect(),
                })
            })
            .collect();

        reports.push(ChartReport {
            chart: name,
            file: path.clone(),
            manifests,
        });
    }

    Ok(reports)
}
