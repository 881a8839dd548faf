//! Diff command

use std::path::PathBuf;

use clap::Args;
use tendril_core::diff;

use super::read_relation_set;
use crate::output::{mutation_lines, to_json, OutputFormat};
use crate::Cli;

#[derive(Args)]
pub struct DiffArgs {
    /// Relation set currently stored (JSON)
    pub existing: PathBuf,
    /// Desired relation set (JSON)
    pub updated: PathBuf,
}

pub fn run(args: &DiffArgs, cli: &Cli) -> anyhow::Result<()> {
    let existing = read_relation_set(&args.existing)?;
    let updated = read_relation_set(&args.updated)?;

    let delta = diff(&existing, &updated);
    tracing::info!("Delta has {} edge changes", delta.mutation_count());

    if cli.quiet {
        return Ok(());
    }

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&delta)?),
        OutputFormat::Table => {
            if delta.is_empty() {
                println!("No relation changes");
            } else {
                for line in mutation_lines(&delta.mutations()) {
                    println!("{}", line);
                }
            }
        }
    }

    Ok(())
}
