//! Report formatting and writing

use crate::counts::DepartmentCounts;
use crate::error::{ReportError, ReportResult};
use csv::Writer;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Header row of the department report
pub const REPORT_HEADER: [&str; 4] = [
    "department_id",
    "number_of_orders",
    "number_of_first_orders",
    "percentage",
];

/// One line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub department_id: u64,
    pub orders: u64,
    pub first_orders: u64,
}

impl ReportRow {
    /// First-order share rendered with two decimals, e.g. `0.67`
    pub fn percentage(&self) -> String {
        format_percentage(self.first_orders, self.orders)
    }
}

/// Format `first_orders / orders` rounded to two decimal places
///
/// `orders` is never zero for a report row; a zero still renders as `0.00`
/// rather than dividing by zero.
pub fn format_percentage(first_orders: u64, orders: u64) -> String {
    if orders == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", first_orders as f64 / orders as f64)
}

/// Rows for every department with at least one order, ascending by id
pub fn build_rows(counts: &DepartmentCounts) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = counts
        .iter()
        .filter(|(_, tally)| tally.orders > 0)
        .map(|(department_id, tally)| ReportRow {
            department_id,
            orders: tally.orders,
            first_orders: tally.first_orders,
        })
        .collect();
    rows.sort_by_key(|row| row.department_id);
    rows
}

/// Write the header and rows as CSV to any writer
pub fn write_rows<W: Write>(writer: W, header: &[&str], rows: &[ReportRow]) -> csv::Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.write_record([
            row.department_id.to_string(),
            row.orders.to_string(),
            row.first_orders.to_string(),
            row.percentage(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write the report to `path`
///
/// The report is written to a temporary file beside `path` and moved into
/// place once complete. Missing parent directories are created.
pub fn write_report(path: &Path, header: &[&str], rows: &[ReportRow]) -> ReportResult<()> {
    let write_error = |source: std::io::Error| ReportError::ReportWrite {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(write_error)?;

    let mut staged = NamedTempFile::new_in(parent).map_err(write_error)?;
    write_rows(staged.as_file_mut(), header, rows).map_err(|e| write_error(e.into()))?;
    staged.as_file().sync_all().map_err(write_error)?;
    staged.persist(path).map_err(|e| write_error(e.error))?;

    debug!("Wrote {} report rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counts::DepartmentTally;

    fn counts(entries: &[(u64, u64, u64)]) -> DepartmentCounts {
        entries
            .iter()
            .map(|&(dept, orders, first_orders)| {
                (
                    dept,
                    DepartmentTally {
                        orders,
                        first_orders,
                    },
                )
            })
            .collect()
    }

    fn render(rows: &[ReportRow]) -> String {
        let mut out = Vec::new();
        write_rows(&mut out, &REPORT_HEADER, rows).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_format_percentage_two_decimals() {
        assert_eq!(format_percentage(2, 3), "0.67");
        assert_eq!(format_percentage(1, 1), "1.00");
        assert_eq!(format_percentage(3, 5), "0.60");
        assert_eq!(format_percentage(0, 4), "0.00");
        assert_eq!(format_percentage(0, 0), "0.00");
    }

    #[test]
    fn test_build_rows_sorted_numerically() {
        let rows = build_rows(&counts(&[(21, 2, 1), (3, 1, 1), (100, 5, 0)]));
        let ids: Vec<u64> = rows.iter().map(|r| r.department_id).collect();
        assert_eq!(ids, vec![3, 21, 100]);
    }

    #[test]
    fn test_build_rows_omits_departments_without_orders() {
        let rows = build_rows(&counts(&[(1, 0, 0), (2, 4, 1)]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].department_id, 2);
    }

    #[test]
    fn test_render_example_report() {
        let rows = build_rows(&counts(&[(10, 3, 2), (20, 1, 1)]));
        assert_eq!(
            render(&rows),
            "department_id,number_of_orders,number_of_first_orders,percentage\n\
             10,3,2,0.67\n\
             20,1,1,1.00\n"
        );
    }

    #[test]
    fn test_empty_report_has_header_only() {
        assert_eq!(
            render(&[]),
            "department_id,number_of_orders,number_of_first_orders,percentage\n"
        );
    }

    #[test]
    fn test_write_report_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("report.csv");
        let rows = build_rows(&counts(&[(7, 2, 1)]));

        write_report(&path, &REPORT_HEADER, &rows).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("7,2,1,0.50\n"));
        let leftovers = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_report_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        std::fs::write(&path, "stale").unwrap();

        write_report(&path, &REPORT_HEADER, &[]).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("department_id,"));
        assert!(!written.contains("stale"));
    }
}
