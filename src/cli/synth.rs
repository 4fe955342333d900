//! `chartform synth`: write Terraform JSON for one or more charts.
//!
//! Every chart file is synthesized in its own run into a single stack,
//! which also carries the provider configured in `chartform.toml`.
//!
//! ```bash
//! chartform synth charts/web.yaml charts/db.yaml -o main.tf.json
//! chartform synth charts/web.yaml > main.tf.json
//! ```

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use super::common::{CommandContext, synthesize_charts};
use crate::terraform::Stack;

/// Arguments of `chartform synth`.
#[derive(Args, Debug)]
pub struct SynthCommand {
    /// Chart files (YAML) to synthesize
    #[arg(value_name = "CHART", required = true)]
    pub charts: Vec<PathBuf>,

    /// Write the stack to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl SynthCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut stack = Stack::new();
        ctx.project.apply_provider(&mut stack);

        let reports = synthesize_charts(&self.charts, &ctx.project, &mut stack)?;
        let json = stack.to_json_string()?;

        match &self.output {
            Some(path) => {
                std::fs::write(path, format!("{json}\n"))
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !ctx.quiet {
                    let count: usize = reports.iter().map(|r| r.manifests.len()).sum();
                    println!(
                        "{} Synthesized {} manifest(s) from {} chart(s) into {}",
                        "✓".green(),
                        count,
                        reports.len(),
                        path.display()
                    );
                }
            }
            None => println!("{json}"),
        }

        Ok(())
    }
}
