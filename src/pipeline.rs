//! End-to-end report pipeline
//!
//! Loads the lookup index, aggregates the order log either in one pass or
//! as partitioned chunks on a bounded worker pool, merges the partial
//! results and writes the report.

use crate::aggregate::{aggregate_chunk, ChunkOutcome, SkipStats};
use crate::config::{ColumnNames, ExecutionMode, ReportConfig};
use crate::error::{ReportError, ReportResult};
use crate::lookup::{load_index, ProductDepartmentIndex};
use crate::partition::split_order_file;
use crate::report::{build_rows, write_report, REPORT_HEADER};
use futures::stream::{FuturesUnordered, StreamExt};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{self, JoinError};
use tracing::{debug, info, warn};

/// What a completed run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Departments written to the report
    pub departments: usize,
    pub orders: u64,
    pub first_orders: u64,
    /// Product table rows dropped while building the index
    pub skipped_products: u64,
    pub skipped_orders: SkipStats,
    /// Chunks aggregated; 1 in sequential mode
    pub chunks: usize,
    pub elapsed: Duration,
}

/// Aggregated order log plus the number of chunks it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult {
    pub outcome: ChunkOutcome,
    pub chunks: usize,
}

fn worker_error(chunk: usize, error: JoinError) -> ReportError {
    let message = if error.is_panic() {
        "worker panicked".to_string()
    } else {
        error.to_string()
    };
    ReportError::WorkerFailed { chunk, message }
}

/// Aggregate the whole order log in a single pass
pub async fn aggregate_sequential(
    order_file: &Path,
    index: Arc<ProductDepartmentIndex>,
    columns: Arc<ColumnNames>,
) -> ReportResult<AggregationResult> {
    let path = order_file.to_path_buf();
    let outcome = task::spawn_blocking(move || aggregate_chunk(&path, &index, &columns))
        .await
        .map_err(|e| worker_error(0, e))??;

    Ok(AggregationResult {
        outcome,
        chunks: 1,
    })
}

/// Split the order log and aggregate the chunks on at most `workers` threads
///
/// The chunk directory is removed once every worker has finished, whether
/// or not they all succeeded. The first worker error is returned.
pub async fn aggregate_parallel(
    order_file: &Path,
    index: Arc<ProductDepartmentIndex>,
    columns: Arc<ColumnNames>,
    workers: NonZeroUsize,
    temp_root: Option<PathBuf>,
) -> ReportResult<AggregationResult> {
    let path = order_file.to_path_buf();
    let split_columns = columns.clone();
    let chunk_set = task::spawn_blocking(move || {
        split_order_file(&path, &split_columns, workers, temp_root.as_deref())
    })
    .await
    .map_err(|e| worker_error(0, e))??;

    let semaphore = Arc::new(Semaphore::new(workers.get()));
    let mut pending = FuturesUnordered::new();

    info!(
        "Aggregating {} chunks (max parallel: {})",
        chunk_set.len(),
        workers
    );

    let mut first_error = None;
    for chunk in chunk_set.chunks() {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                first_error = Some(ReportError::WorkerFailed {
                    chunk: chunk.index,
                    message: e.to_string(),
                });
                break;
            }
        };
        let index = index.clone();
        let columns = columns.clone();
        let chunk_path = chunk.path.clone();
        let chunk_index = chunk.index;

        let handle = task::spawn_blocking(move || {
            let result = aggregate_chunk(&chunk_path, &index, &columns);
            drop(permit);
            result
        });
        pending.push(async move { (chunk_index, handle.await) });
    }

    let mut partials = Vec::with_capacity(chunk_set.len());
    while let Some((chunk, joined)) = pending.next().await {
        match joined {
            Ok(Ok(outcome)) => {
                debug!("Chunk {} finished with {} rows", chunk, outcome.rows);
                partials.push(outcome);
            }
            Ok(Err(e)) => {
                warn!("Chunk {} failed: {}", chunk, e);
                first_error.get_or_insert(e);
            }
            Err(e) => {
                warn!("Chunk {} worker did not complete: {}", chunk, e);
                first_error.get_or_insert(worker_error(chunk, e));
            }
        }
    }

    let merged = ChunkOutcome::merge_all(partials);
    let chunks = chunk_set.len();
    let chunk_dir = chunk_set.dir().to_path_buf();
    if let Err(e) = chunk_set.close() {
        warn!(
            "Failed to remove chunk directory {}: {}",
            chunk_dir.display(),
            e
        );
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    Ok(AggregationResult {
        outcome: merged,
        chunks,
    })
}

/// Run the full report: lookup, aggregation, merge, and report write
///
/// Either input failing to open stops the run before the report is written.
pub async fn run(config: &ReportConfig) -> ReportResult<RunSummary> {
    let start = Instant::now();
    let columns = Arc::new(config.columns.clone());

    let product_file = config.product_file.clone();
    let index_columns = columns.clone();
    let index = task::spawn_blocking(move || load_index(&product_file, &index_columns))
        .await
        .map_err(|e| worker_error(0, e))??;
    info!(
        "Loaded {} products from {}",
        index.len(),
        config.product_file.display()
    );
    let skipped_products = index.skipped_rows();
    let index = Arc::new(index);

    let aggregation = match config.execution_mode() {
        ExecutionMode::Sequential => {
            aggregate_sequential(&config.order_file, index, columns).await?
        }
        ExecutionMode::Parallel { workers } => {
            aggregate_parallel(
                &config.order_file,
                index,
                columns,
                workers,
                config.temp_dir.clone(),
            )
            .await?
        }
    };

    let AggregationResult { outcome, chunks } = aggregation;
    let rows = build_rows(&outcome.counts);
    write_report(&config.output, &REPORT_HEADER, &rows)?;

    let totals = outcome.counts.totals();
    let summary = RunSummary {
        departments: rows.len(),
        orders: totals.orders,
        first_orders: totals.first_orders,
        skipped_products,
        skipped_orders: outcome.skipped,
        chunks,
        elapsed: start.elapsed(),
    };

    if summary.skipped_orders.total() > 0 || skipped_products > 0 {
        warn!(
            "Skipped {} product rows and {} order rows ({} unknown product, {} invalid flag, {} missing fields)",
            skipped_products,
            summary.skipped_orders.total(),
            summary.skipped_orders.unknown_product,
            summary.skipped_orders.invalid_flag,
            summary.skipped_orders.short_row
        );
    }
    info!(
        "Wrote {} departments ({} orders) to {} in {:.3}s",
        summary.departments,
        summary.orders,
        config.output.display(),
        summary.elapsed.as_secs_f64()
    );

    Ok(summary)
}
