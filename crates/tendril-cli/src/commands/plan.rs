//! Plan command: the bulk writes a relation change would need

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tendril_core::{diff, EdgeMutation, EntityId, RelationDelta};
use tendril_storage::{split, BatchWriteRequest, DeltaBatchBuilder};

use super::read_relation_set;
use crate::config::Config;
use crate::output::{mutation_lines, to_json, OutputFormat};
use crate::Cli;

#[derive(Args)]
pub struct PlanArgs {
    /// Relation set currently stored (JSON)
    pub existing: PathBuf,
    /// Desired relation set (JSON)
    pub updated: PathBuf,
    /// Entity the relations belong to
    #[arg(short, long)]
    pub entity: String,
    /// Partition edge items are written to
    #[arg(short, long, default_value = "edges")]
    pub partition: String,
    /// Items per bulk-write request (overrides config)
    #[arg(short, long)]
    pub max_items: Option<usize>,
}

#[derive(Debug, Serialize)]
struct Plan {
    entity: EntityId,
    delta: RelationDelta,
    mutations: Vec<EdgeMutation>,
    requests: Vec<BatchWriteRequest>,
}

pub fn run(args: &PlanArgs, cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let existing = read_relation_set(&args.existing)?;
    let updated = read_relation_set(&args.updated)?;
    updated.validate()?;

    let entity = EntityId::new(args.entity.clone());
    let max_items = args.max_items.unwrap_or(config.max_items_per_request);

    let delta = diff(&existing, &updated);
    let batch = DeltaBatchBuilder::new(args.partition.as_str()).build(&entity, &delta);
    let requests = split(batch, max_items)?;

    let plan = Plan {
        entity,
        mutations: delta.mutations(),
        delta,
        requests,
    };

    if cli.quiet {
        return Ok(());
    }

    match cli.output_format() {
        OutputFormat::Json => println!("{}", to_json(&plan)?),
        OutputFormat::Table => {
            if plan.mutations.is_empty() {
                println!("Relations of {} are up to date", plan.entity);
                return Ok(());
            }
            println!("Edge changes for {}:", plan.entity);
            for line in mutation_lines(&plan.mutations) {
                println!("  {}", line);
            }
            println!();
            println!(
                "{} writes in {} requests (max {} items each)",
                plan.mutations.len(),
                plan.requests.len(),
                max_items
            );
            for (index, request) in plan.requests.iter().enumerate() {
                println!("  request {}: {} items", index + 1, request.len());
            }
        }
    }

    Ok(())
}
