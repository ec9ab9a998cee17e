//! # deptstat
//!
//! Per-department order statistics over a large order log.
//!
//! ## Usage
//!
//! ```bash
//! deptstat [-i orders.csv] [-p products.csv] [-o report.csv] [--mp [-w workers]]
//! ```
//!
//! ## Modules
//!
//! - `config` - Layered run configuration (defaults, TOML file, CLI overrides)
//! - `error` - Error type and error code registry
//! - `lookup` - Product to department lookup index
//! - `partition` - Row-aligned splitting of the order log into chunk files
//! - `aggregate` - Per-chunk order and first-order counting
//! - `counts` - Department tallies and the merge reducer
//! - `report` - Sorted CSV report with first-order percentages
//! - `pipeline` - Sequential and worker-pool execution of the whole run
pub mod aggregate;
pub mod config;
pub mod counts;
pub mod error;
pub mod lookup;
pub mod partition;
pub mod pipeline;
pub mod report;
pub mod row;

pub use config::{ColumnNames, ExecutionMode, ReportConfig};
pub use counts::{DepartmentCounts, DepartmentTally};
pub use error::{ReportError, ReportResult};
pub use lookup::ProductDepartmentIndex;
pub use pipeline::{run, RunSummary};
