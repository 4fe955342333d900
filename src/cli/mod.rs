//! Command-line interface for chartform.
//!
//! # Available Commands
//!
//! - `synth` - synthesize chart files into Terraform JSON
//! - `validate` - run the pipeline without writing output and report the
//!   emission order
//!
//! # Global Options
//!
//! - `-v, --verbose` - debug logging (pipeline progress included)
//! - `-q, --quiet` - errors only
//! - `-c, --config <FILE>` - project configuration instead of `chartform.toml`
//!
//! Logs go to stderr so that `synth` output on stdout stays valid JSON.
//! `RUST_LOG` overrides the level chosen by the flags.
//!
//! # Examples
//!
//! ```bash
//! chartform synth charts/*.yaml -o main.tf.json
//! chartform -v validate charts/web.yaml
//! chartform validate charts/web.yaml --format json
//! ```

pub mod common;
pub mod synth;
pub mod validate;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use common::CommandContext;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Suppress informational output
    pub quiet: bool,
    /// Explicit configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// A subscriber installed earlier (e.g. by a test harness) is kept.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Bridge cdk8s-style charts to Terraform `kubernetes_manifest` resources.
#[derive(Parser, Debug)]
#[command(name = "chartform", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output, including pipeline progress
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the project configuration (default: ./chartform.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synthesize chart files into Terraform JSON
    Synth(synth::SynthCommand),

    /// Check chart files and show the emission order
    Validate(validate::ValidateCommand),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config)
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };

        CliConfig {
            log_level: log_level.to_string(),
            quiet: self.quiet,
            config_path: self.config.clone(),
        }
    }

    pub fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();
        let ctx = CommandContext::load(config.config_path.as_deref(), config.quiet)?;

        match self.command {
            Commands::Synth(cmd) => cmd.execute(&ctx),
            Commands::Validate(cmd) => cmd.execute(&ctx),
        }
    }
}
