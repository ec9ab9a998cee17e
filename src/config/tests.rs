use super::*;
use std::fs;
use tempfile::TempDir;

fn write_test_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("deptstat.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_default_config() {
    let config = ReportConfig::default();

    assert_eq!(config.order_file, PathBuf::from("./input/order_products.csv"));
    assert_eq!(config.product_file, PathBuf::from("./input/products.csv"));
    assert_eq!(config.output, PathBuf::from("./output/report.csv"));
    assert_eq!(config.columns.product, "product_id");
    assert_eq!(config.columns.department, "department_id");
    assert_eq!(config.columns.reorder, "reordered");
    assert_eq!(config.execution_mode(), ExecutionMode::Sequential);
    assert!(config.validate().is_ok());
}

#[tokio::test]
async fn test_load_partial_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_test_config(
        &temp_dir,
        r#"
order_file = "data/orders.csv"
parallel = true
workers = 3

[columns]
reorder = "is_reorder"
"#,
    );

    let config = load_config_file(&path).await.unwrap();

    assert_eq!(config.order_file, PathBuf::from("data/orders.csv"));
    assert_eq!(config.product_file, PathBuf::from(DEFAULT_PRODUCT_FILE));
    assert_eq!(config.columns.reorder, "is_reorder");
    assert_eq!(config.columns.product, "product_id");
    assert_eq!(
        config.execution_mode(),
        ExecutionMode::Parallel {
            workers: NonZeroUsize::new(3).unwrap()
        }
    );
}

#[tokio::test]
async fn test_load_invalid_toml() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_test_config(&temp_dir, "parallel = \"maybe\"");

    let err = load_config_file(&path).await.unwrap_err();
    assert!(matches!(err, ReportError::ConfigLoad { .. }));
}

#[tokio::test]
async fn test_load_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_config(Some(temp_dir.path().join("absent.toml").as_path()), ConfigOverrides::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::ConfigLoad { .. }));
}

#[tokio::test]
async fn test_overrides_take_precedence_over_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_test_config(
        &temp_dir,
        r#"
output = "from_file.csv"
workers = 2
"#,
    );

    let overrides = ConfigOverrides {
        output: Some(PathBuf::from("from_cli.csv")),
        department_column: Some("dept".to_string()),
        parallel: true,
        ..Default::default()
    };
    let config = load_config(Some(path.as_path()), overrides).await.unwrap();

    assert_eq!(config.output, PathBuf::from("from_cli.csv"));
    assert_eq!(config.columns.department, "dept");
    assert_eq!(config.workers, Some(2));
    assert!(config.parallel);
}

#[test]
fn test_parallel_flag_does_not_disable_file_setting() {
    let config = ReportConfig {
        parallel: true,
        ..Default::default()
    }
    .apply_overrides(ConfigOverrides::default());
    assert!(config.parallel);
}

#[test]
fn test_validate_rejects_zero_workers() {
    let config = ReportConfig {
        workers: Some(0),
        ..Default::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ReportError::InvalidConfig { ref field, .. } if field == "workers"));
}

#[test]
fn test_validate_rejects_empty_column() {
    let mut config = ReportConfig::default();
    config.columns.reorder = "  ".to_string();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ReportError::InvalidConfig { ref field, .. } if field == "columns.reorder"));
}

#[test]
fn test_parallel_mode_defaults_to_available_parallelism() {
    let config = ReportConfig {
        parallel: true,
        ..Default::default()
    };
    match config.execution_mode() {
        ExecutionMode::Parallel { workers } => assert!(workers.get() >= 1),
        ExecutionMode::Sequential => panic!("expected parallel mode"),
    }
}
