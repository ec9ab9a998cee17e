//! Chunk aggregation
//!
//! Counts orders and first orders per department over one self-contained
//! chunk of the order log. Every call returns a fresh partial result; the
//! shared lookup index is only read.

use crate::config::ColumnNames;
use crate::counts::{merge_all, DepartmentCounts};
use crate::error::{ReportError, ReportResult};
use crate::lookup::ProductDepartmentIndex;
use crate::row::{display_record, OrderColumns};
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Parsed reorder flag of an order row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderFlag {
    /// Flag `0`: the product was bought for the first time
    FirstOrder,
    /// Flag `1`
    Reorder,
}

impl ReorderFlag {
    /// Parse a flag field; anything other than integer 0 or 1 is rejected
    pub fn parse(field: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(field).ok()?.trim();
        match text.parse::<u8>().ok()? {
            0 => Some(Self::FirstOrder),
            1 => Some(Self::Reorder),
            _ => None,
        }
    }

    pub fn is_first_order(self) -> bool {
        matches!(self, Self::FirstOrder)
    }
}

/// Order rows that were not counted, by reason
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipStats {
    /// Product id absent from the lookup index
    pub unknown_product: u64,
    /// Reorder flag missing or not 0/1
    pub invalid_flag: u64,
    /// Row too short to hold the configured columns
    pub short_row: u64,
}

impl SkipStats {
    pub fn total(&self) -> u64 {
        self.unknown_product + self.invalid_flag + self.short_row
    }

    pub fn combine(self, other: Self) -> Self {
        Self {
            unknown_product: self.unknown_product + other.unknown_product,
            invalid_flag: self.invalid_flag + other.invalid_flag,
            short_row: self.short_row + other.short_row,
        }
    }
}

/// Partial result of aggregating one chunk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub counts: DepartmentCounts,
    pub skipped: SkipStats,
    /// Data rows read, counted or not
    pub rows: u64,
}

impl ChunkOutcome {
    /// Combine partial outcomes; counts go through the merge reducer
    pub fn merge_all<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = ChunkOutcome>,
    {
        let mut skipped = SkipStats::default();
        let mut rows = 0;
        let counts = merge_all(outcomes.into_iter().map(|outcome| {
            skipped = skipped.combine(outcome.skipped);
            rows += outcome.rows;
            outcome.counts
        }));
        Self {
            counts,
            skipped,
            rows,
        }
    }
}

enum RowSkip {
    ShortRow,
    UnknownProduct,
    InvalidFlag,
}

fn resolve_row(
    columns: &OrderColumns,
    index: &ProductDepartmentIndex,
    record: &ByteRecord,
) -> Result<(u64, ReorderFlag), RowSkip> {
    let (product, flag) = match (columns.product(record), columns.reorder(record)) {
        (Some(product), Some(flag)) => (product, flag),
        _ => return Err(RowSkip::ShortRow),
    };
    let department = std::str::from_utf8(product)
        .ok()
        .and_then(|id| index.department(id))
        .ok_or(RowSkip::UnknownProduct)?;
    let flag = ReorderFlag::parse(flag).ok_or(RowSkip::InvalidFlag)?;
    Ok((department, flag))
}

/// Aggregate an order log (or chunk of one) read from `reader`
///
/// `source` is only used in diagnostics and errors.
pub fn aggregate_reader<R: Read>(
    reader: R,
    source: &Path,
    index: &ProductDepartmentIndex,
    columns: &ColumnNames,
) -> ReportResult<ChunkOutcome> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .byte_headers()
        .map_err(|e| ReportError::csv(source, e))?
        .clone();
    if headers.is_empty() {
        debug!("{} is empty, nothing to aggregate", source.display());
        return Ok(ChunkOutcome::default());
    }
    let order_columns = OrderColumns::resolve(&headers, columns, source)?;

    let mut outcome = ChunkOutcome::default();
    let mut record = ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .map_err(|e| ReportError::csv(source, e))?
    {
        outcome.rows += 1;
        match resolve_row(&order_columns, index, &record) {
            Ok((department, flag)) => outcome.counts.record(department, flag.is_first_order()),
            Err(skip) => {
                let reason = match skip {
                    RowSkip::ShortRow => {
                        outcome.skipped.short_row += 1;
                        "missing fields"
                    }
                    RowSkip::UnknownProduct => {
                        outcome.skipped.unknown_product += 1;
                        "unknown product"
                    }
                    RowSkip::InvalidFlag => {
                        outcome.skipped.invalid_flag += 1;
                        "reorder flag is not 0 or 1"
                    }
                };
                warn!(
                    "Skipping row {} of {} ({}): {}",
                    record.position().map_or(0, |p| p.line()),
                    source.display(),
                    reason,
                    display_record(&record)
                );
            }
        }
    }

    debug!(
        "Aggregated {} rows from {} into {} departments ({} skipped)",
        outcome.rows,
        source.display(),
        outcome.counts.len(),
        outcome.skipped.total()
    );
    Ok(outcome)
}

/// Aggregate the chunk or order log stored at `path`
pub fn aggregate_chunk(
    path: &Path,
    index: &ProductDepartmentIndex,
    columns: &ColumnNames,
) -> ReportResult<ChunkOutcome> {
    let file = File::open(path).map_err(|e| ReportError::input_open(path, e))?;
    aggregate_reader(BufReader::new(file), path, index, columns)
}
