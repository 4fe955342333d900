//! `chartform validate`: check chart files without writing anything.
//!
//! Runs the full pipeline into a scratch stack, so every failure `synth`
//! would hit (validation hooks, unknown or cyclic dependencies, name
//! collisions) is reported here too. On success the emission order and
//! each manifest's dependencies are listed.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::common::{ChartReport, CommandContext, synthesize_charts};
use crate::terraform::Stack;

/// Output format for validation results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, coloured
    #[default]
    Text,
    /// Machine-readable JSON on stdout
    Json,
}

/// Arguments of `chartform validate`.
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// Chart files (YAML) to validate
    #[arg(value_name = "CHART", required = true)]
    pub charts: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// JSON document printed with `--format json`.
#[derive(Debug, Default, Serialize)]
pub struct ValidationResults {
    pub valid: bool,
    pub charts: Vec<ChartReport>,
    pub errors: Vec<String>,
}

impl ValidateCommand {
    pub fn execute(self, ctx: &CommandContext) -> Result<()> {
        let mut stack = Stack::new();
        let outcome = synthesize_charts(&self.charts, &ctx.project, &mut stack);

        match self.format {
            OutputFormat::Json => {
                let results = match &outcome {
                    Ok(charts) => ValidationResults {
                        valid: true,
                        charts: charts.clone(),
                        errors: Vec::new(),
                    },
                    Err(e) => ValidationResults {
                        valid: false,
                        charts: Vec::new(),
                        errors: e.chain().map(ToString::to_string).collect(),
                    },
                };
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
            OutputFormat::Text => {
                if let Ok(charts) = &outcome {
                    if !ctx.quiet {
                        print_charts(charts);
                    }
                }
            }
        }

        outcome.map(|_| ())
    }
}

fn print_charts(charts: &[ChartReport]) {
    for chart in charts {
        println!(
            "{} {} ({}): {} manifest(s)",
            "✓".green(),
            chart.chart.bold(),
            chart.file.display(),
            chart.manifests.len()
        );
        for (position, manifest) in chart.manifests.iter().enumerate() {
            println!("  {}. {}", position + 1, manifest.name);
            if !manifest.depends_on.is_empty() {
                println!("     {} {}", "depends on".dimmed(), manifest.depends_on.join(", "));
            }
        }
    }
}
