//! Typed views over CSV rows
//!
//! Column positions are resolved once from the header; per-row access is a
//! plain index into the record.

use crate::config::ColumnNames;
use crate::error::{ReportError, ReportResult};
use csv::ByteRecord;
use std::path::Path;

fn resolve_column(headers: &ByteRecord, name: &str, source: &Path) -> ReportResult<usize> {
    headers
        .iter()
        .position(|field| field == name.as_bytes())
        .ok_or_else(|| ReportError::missing_column(source, name))
}

/// Render a record for diagnostics
pub(crate) fn display_record(record: &ByteRecord) -> String {
    let fields: Vec<String> = record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();
    format!("{:?}", fields)
}

/// Product table columns: product id and department id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductColumns {
    product: usize,
    department: usize,
}

impl ProductColumns {
    pub fn resolve(headers: &ByteRecord, columns: &ColumnNames, source: &Path) -> ReportResult<Self> {
        Ok(Self {
            product: resolve_column(headers, &columns.product, source)?,
            department: resolve_column(headers, &columns.department, source)?,
        })
    }

    pub fn product<'r>(&self, record: &'r ByteRecord) -> Option<&'r [u8]> {
        record.get(self.product)
    }

    pub fn department<'r>(&self, record: &'r ByteRecord) -> Option<&'r [u8]> {
        record.get(self.department)
    }
}

/// Order log columns: product id and reorder flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderColumns {
    product: usize,
    reorder: usize,
}

impl OrderColumns {
    pub fn resolve(headers: &ByteRecord, columns: &ColumnNames, source: &Path) -> ReportResult<Self> {
        Ok(Self {
            product: resolve_column(headers, &columns.product, source)?,
            reorder: resolve_column(headers, &columns.reorder, source)?,
        })
    }

    pub fn product<'r>(&self, record: &'r ByteRecord) -> Option<&'r [u8]> {
        record.get(self.product)
    }

    pub fn reorder<'r>(&self, record: &'r ByteRecord) -> Option<&'r [u8]> {
        record.get(self.reorder)
    }
}
