use clap::Parser;
use deptstat::config::{load_config, ConfigOverrides};
use deptstat::error::{describe_error_code, ReportError};
use std::path::PathBuf;
use tracing::{debug, error, trace};

/// Generate per-department order reports from an order log
#[derive(Parser)]
#[command(name = "deptstat")]
#[command(about = "Count orders and first orders per department", long_about = None)]
struct Cli {
    /// Order file path [default: ./input/order_products.csv]
    #[arg(short = 'i', long = "orderfile")]
    order_file: Option<PathBuf>,

    /// Product file path [default: ./input/products.csv]
    #[arg(short = 'p', long = "productfile")]
    product_file: Option<PathBuf>,

    /// Output file path [default: ./output/report.csv]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Department column name [default: department_id]
    #[arg(short = 'd', long = "deptcol")]
    dept_col: Option<String>,

    /// Product column name [default: product_id]
    #[arg(short = 'c', long = "productcol")]
    product_col: Option<String>,

    /// Reordered column name [default: reordered]
    #[arg(short = 'r', long = "reordercol")]
    reorder_col: Option<String>,

    /// Split the order file and aggregate the chunks in parallel
    #[arg(short = 'm', long = "mp")]
    parallel: bool,

    /// Number of chunks and workers in parallel mode (default: available parallelism)
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Directory for temporary chunk files (default: system temp dir)
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            order_file: self.order_file.clone(),
            product_file: self.product_file.clone(),
            output: self.output.clone(),
            product_column: self.product_col.clone(),
            department_column: self.dept_col.clone(),
            reorder_column: self.reorder_col.clone(),
            parallel: self.parallel,
            workers: self.workers,
            temp_dir: self.temp_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!("deptstat started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(&cli).await {
        error!("Fatal error: {:#}", e);
        match e.downcast_ref::<ReportError>() {
            Some(report_error) => {
                eprintln!("{}: {e:#}", describe_error_code(report_error.code()))
            }
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.overrides()).await?;
    debug!("Effective configuration: {:?}", config);

    let summary = deptstat::run(&config).await?;
    println!(
        "Time taken for processing: {:.3} seconds",
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
