//! Common test utilities for chartform integration tests

// Not every helper is used by every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Output of one `chartform` invocation.
#[derive(Debug)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// A temporary project directory with chart files and configuration.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        fs::create_dir_all(project_dir.join("charts"))?;

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Write `charts/<name>.yaml` and return its path.
    pub fn write_chart(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join("charts").join(format!("{name}.yaml"));
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `chartform.toml` in the project root.
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.project_dir.join("chartform.toml");
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn read_file(&self, relative: &str) -> Result<String> {
        let path = self.project_dir.join(relative);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Run the `chartform` binary inside the project directory.
    pub fn run_chartform(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::cargo_bin("chartform")?
            .args(args)
            .current_dir(&self.project_dir)
            .env_remove("CHARTFORM_CONFIG")
            .env_remove("RUST_LOG")
            .env("NO_COLOR", "1")
            .output()
            .context("Failed to run chartform")?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
