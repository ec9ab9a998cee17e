//! Run configuration
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then command-line overrides.

use crate::error::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub mod loader;

#[cfg(test)]
mod tests;

pub use loader::{load_config, load_config_file};

pub const DEFAULT_ORDER_FILE: &str = "./input/order_products.csv";
pub const DEFAULT_PRODUCT_FILE: &str = "./input/products.csv";
pub const DEFAULT_OUTPUT_FILE: &str = "./output/report.csv";

/// Names of the columns read from the two input tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Product id column, present in both the product table and the order log
    pub product: String,
    /// Department id column of the product table
    pub department: String,
    /// Reorder flag column of the order log
    pub reorder: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            product: "product_id".to_string(),
            department: "department_id".to_string(),
            reorder: "reordered".to_string(),
        }
    }
}

/// How the order log is aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One aggregation pass over the whole order log
    Sequential,
    /// Split the order log into up to `workers` chunks and aggregate them on a worker pool
    Parallel { workers: NonZeroUsize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub order_file: PathBuf,
    pub product_file: PathBuf,
    pub output: PathBuf,
    pub columns: ColumnNames,
    /// Enables the partitioned worker-pool mode
    pub parallel: bool,
    /// Chunk count and pool size for parallel mode; defaults to available parallelism
    pub workers: Option<usize>,
    /// Parent directory for temporary chunk files; the system temp dir when unset
    pub temp_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            order_file: PathBuf::from(DEFAULT_ORDER_FILE),
            product_file: PathBuf::from(DEFAULT_PRODUCT_FILE),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            columns: ColumnNames::default(),
            parallel: false,
            workers: None,
            temp_dir: None,
        }
    }
}

/// Values supplied on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub order_file: Option<PathBuf>,
    pub product_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub product_column: Option<String>,
    pub department_column: Option<String>,
    pub reorder_column: Option<String>,
    pub parallel: bool,
    pub workers: Option<usize>,
    pub temp_dir: Option<PathBuf>,
}

impl ReportConfig {
    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.order_file {
            self.order_file = path;
        }
        if let Some(path) = overrides.product_file {
            self.product_file = path;
        }
        if let Some(path) = overrides.output {
            self.output = path;
        }
        if let Some(name) = overrides.product_column {
            self.columns.product = name;
        }
        if let Some(name) = overrides.department_column {
            self.columns.department = name;
        }
        if let Some(name) = overrides.reorder_column {
            self.columns.reorder = name;
        }
        // The flag can only switch parallel mode on
        self.parallel |= overrides.parallel;
        if overrides.workers.is_some() {
            self.workers = overrides.workers;
        }
        if overrides.temp_dir.is_some() {
            self.temp_dir = overrides.temp_dir;
        }
        self
    }

    pub fn validate(&self) -> ReportResult<()> {
        let columns = [
            ("columns.product", &self.columns.product),
            ("columns.department", &self.columns.department),
            ("columns.reorder", &self.columns.reorder),
        ];
        for (field, value) in columns {
            if value.trim().is_empty() {
                return Err(ReportError::invalid_config(field, "column name must not be empty"));
            }
        }
        if self.workers == Some(0) {
            return Err(ReportError::invalid_config("workers", "must be at least 1"));
        }
        Ok(())
    }

    /// Resolve the execution mode, falling back to the machine's available parallelism
    pub fn execution_mode(&self) -> ExecutionMode {
        if !self.parallel {
            return ExecutionMode::Sequential;
        }
        let workers = self
            .workers
            .and_then(NonZeroUsize::new)
            .unwrap_or_else(default_workers);
        ExecutionMode::Parallel { workers }
    }
}

fn default_workers() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
