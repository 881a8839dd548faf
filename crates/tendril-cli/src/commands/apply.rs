//! Apply command: push write batches through the bulk-write pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use futures::future::join_all;
use serde::Serialize;
use tendril_storage::{
    ApplyReport, BatchWriteCoordinator, BatchWriteRequest, MemoryBatchStore, RetryPolicy,
};

use crate::config::Config;
use crate::output::{to_json, OutputFormat};
use crate::Cli;

#[derive(Args)]
pub struct ApplyArgs {
    /// Batch files (JSON: partition -> [{"put": item} | {"delete": key}])
    #[arg(required = true)]
    pub batches: Vec<PathBuf>,
    /// Items per bulk-write request (overrides config)
    #[arg(short, long)]
    pub max_items: Option<usize>,
    /// Attempts per request (overrides config)
    #[arg(long)]
    pub max_attempts: Option<u32>,
    /// Starting backoff delay in milliseconds (overrides config)
    #[arg(long)]
    pub delay_ms: Option<u64>,
    /// Share of each request the store leaves unprocessed (overrides config)
    #[arg(long)]
    pub unprocessed_rate: Option<f64>,
}

#[derive(Debug, Serialize)]
struct BatchOutcome {
    file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ApplyReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining: Option<BatchWriteRequest>,
}

fn read_batch(path: &Path) -> anyhow::Result<BatchWriteRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let batch =
        BatchWriteRequest::from_json(&text).with_context(|| format!("In {}", path.display()))?;
    Ok(batch)
}

pub async fn run(args: &ApplyArgs, cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let max_items = args.max_items.unwrap_or(config.max_items_per_request);
    let policy = RetryPolicy::for_storage(
        args.max_attempts.unwrap_or(config.max_attempts),
        args.delay_ms.unwrap_or(config.starting_delay_ms),
    );
    let rate = args.unprocessed_rate.unwrap_or(config.unprocessed_rate);

    let batches = args
        .batches
        .iter()
        .map(|path| read_batch(path).map(|batch| (path.clone(), batch)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let store = Arc::new(MemoryBatchStore::new(max_items).with_unprocessed_rate(rate));
    let coordinator = BatchWriteCoordinator::new(Arc::clone(&store), max_items, policy);

    // each file is an independent pipeline against the shared store
    let outcomes = join_all(batches.into_iter().map(|(file, batch)| {
        let coordinator = &coordinator;
        async move {
            match coordinator.apply(batch).await {
                Ok(report) => BatchOutcome {
                    file,
                    report: Some(report),
                    error: None,
                    remaining: None,
                },
                Err(err) => BatchOutcome {
                    file,
                    report: None,
                    error: Some(err.source.to_string()),
                    remaining: Some(err.remaining),
                },
            }
        }
    }))
    .await;

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    tracing::info!(
        "Store received {} requests, applied {} operations",
        store.calls(),
        store.applied()
    );

    if !cli.quiet {
        match cli.output_format() {
            OutputFormat::Json => println!("{}", to_json(&outcomes)?),
            OutputFormat::Table => {
                for outcome in &outcomes {
                    match (&outcome.report, &outcome.error) {
                        (Some(report), _) => println!(
                            "{}: applied {} operations in {} requests ({} with unprocessed items)",
                            outcome.file.display(),
                            report.operations,
                            report.requests,
                            report.unprocessed_rounds
                        ),
                        (None, Some(error)) => println!(
                            "{}: failed: {} ({} operations not applied)",
                            outcome.file.display(),
                            error,
                            outcome.remaining.as_ref().map_or(0, BatchWriteRequest::len)
                        ),
                        (None, None) => {}
                    }
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} batches failed", failed, outcomes.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        std::fs::write(&path, r#"{"edges": [{"put": {"id": 1}}, {"delete": {"id": 2}}]}"#).unwrap();

        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.partition_count(), 1);
    }

    #[test]
    fn test_read_batch_names_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"edges": {"put": {}}}"#).unwrap();

        let err = read_batch(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("broken.json"));
    }
}
