//! Product to department lookup index
//!
//! The index is built once from the product table and then shared read-only
//! by every aggregation task.

use crate::config::ColumnNames;
use crate::error::{ReportError, ReportResult};
use crate::row::{display_record, ProductColumns};
use csv::{ByteRecord, ReaderBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Immutable mapping from product id to department id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDepartmentIndex {
    departments: HashMap<String, u64>,
    skipped_rows: u64,
}

impl ProductDepartmentIndex {
    /// Department of a product, if the product was mapped
    pub fn department(&self, product_id: &str) -> Option<u64> {
        self.departments.get(product_id).copied()
    }

    pub fn len(&self) -> usize {
        self.departments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    /// Number of product rows dropped for failing validation
    pub fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }
}

fn is_digits(field: &[u8]) -> bool {
    !field.is_empty() && field.iter().all(u8::is_ascii_digit)
}

/// Validate one product row, returning the mapping it contributes
fn parse_mapping(columns: &ProductColumns, record: &ByteRecord) -> Option<(String, u64)> {
    let product = columns.product(record).filter(|f| is_digits(f))?;
    let department = columns.department(record).filter(|f| is_digits(f))?;
    // Both fields are ASCII digits at this point
    let product = std::str::from_utf8(product).ok()?;
    let department = std::str::from_utf8(department).ok()?.parse().ok()?;
    Some((product.to_string(), department))
}

/// Build the index from a product table reader
///
/// Rows whose product or department field is not made only of digits are
/// skipped with a warning. A later row for the same product replaces an
/// earlier one.
pub fn build_index<R: Read>(
    reader: R,
    source: &Path,
    columns: &ColumnNames,
) -> ReportResult<ProductDepartmentIndex> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .byte_headers()
        .map_err(|e| ReportError::csv(source, e))?
        .clone();
    let product_columns = ProductColumns::resolve(&headers, columns, source)?;

    let mut index = ProductDepartmentIndex::default();
    let mut record = ByteRecord::new();
    while reader
        .read_byte_record(&mut record)
        .map_err(|e| ReportError::csv(source, e))?
    {
        match parse_mapping(&product_columns, &record) {
            Some((product, department)) => {
                index.departments.insert(product, department);
            }
            None => {
                warn!(
                    "Invalid data. Skipping row {}: {}",
                    record.position().map_or(0, |p| p.line()),
                    display_record(&record)
                );
                index.skipped_rows += 1;
            }
        }
    }

    debug!(
        "Loaded {} product mappings from {} ({} rows skipped)",
        index.len(),
        source.display(),
        index.skipped_rows
    );
    Ok(index)
}

/// Open the product table at `path` and build the index
pub fn load_index(path: &Path, columns: &ColumnNames) -> ReportResult<ProductDepartmentIndex> {
    let file = File::open(path).map_err(|e| ReportError::input_open(path, e))?;
    build_index(BufReader::new(file), path, columns)
}
