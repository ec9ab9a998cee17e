use super::{ConfigOverrides, ReportConfig};
use crate::error::{ReportError, ReportResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Read a TOML configuration file; missing keys take their defaults
pub async fn load_config_file(path: &Path) -> ReportResult<ReportConfig> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ReportError::ConfigLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    toml::from_str(&content).map_err(|e| ReportError::ConfigLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Build the effective configuration from an optional file and CLI overrides
pub async fn load_config(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> ReportResult<ReportConfig> {
    let base = match config_path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            load_config_file(path).await?
        }
        None => ReportConfig::default(),
    };

    let config = base.apply_overrides(overrides);
    config.validate()?;
    Ok(config)
}
