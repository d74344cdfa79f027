use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

use hole_reach_etl::{logging, metrics, EtlConfig, EtlError, Pipeline, PipelineReport, ValidationMode};

#[derive(Parser, Debug)]
#[command(name = "hole_reach_etl")]
#[command(about = "Flag unreachable holes in part cases and load them into SQLite")]
#[command(version = "0.1.0")]
struct Cli {
    /// Parquet file to read
    #[arg(long)]
    input: Option<PathBuf>,
    /// SQLite database to write
    #[arg(long)]
    db: Option<PathBuf>,
    /// Destination table, replaced on every run
    #[arg(long)]
    table: Option<String>,
    /// Failure policy; overrides the config file
    #[arg(long, value_enum)]
    mode: Option<ValidationMode>,
    /// Shorthand for --mode strict
    #[arg(long, conflicts_with = "mode")]
    strict: bool,
    /// TOML file with input_path, db_path, table_name and mode
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
    /// Write a Prometheus text snapshot of the run's metrics to this file
    #[arg(long)]
    metrics_file: Option<PathBuf>,
}

impl Cli {
    /// Flags win over the config file, which wins over the defaults
    fn resolve_config(&self) -> hole_reach_etl::Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::load(path)?,
            None => EtlConfig::default(),
        };
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(db) = &self.db {
            config.db_path = db.clone();
        }
        if let Some(table) = &self.table {
            config.table_name = table.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.strict {
            config.mode = ValidationMode::Strict;
        }
        Ok(config)
    }
}

/// Process exit code for a finished run: only strict runs can fail the batch
fn exit_code(result: &hole_reach_etl::Result<PipelineReport>, mode: ValidationMode) -> u8 {
    match (result, mode) {
        (Err(_), ValidationMode::Strict) => 1,
        _ => 0,
    }
}

fn print_report(report: &PipelineReport) {
    println!("\n📊 Pipeline Results for {}:", report.table_name);
    println!("   Rows read: {}", report.rows_read);
    println!("   Rows transformed: {}", report.rows_transformed);
    println!("   Rows written: {}", report.rows_written);
    println!("   Warning rows: {}", report.warning_rows);
    println!("   Error rows: {}", report.error_rows);
    println!("   Destination: {}", report.destination.display());

    if !report.row_failures.is_empty() {
        println!("\n⚠️  Records with undecodable holes:");
        for failure in &report.row_failures {
            println!("   - {}", failure);
        }
    }
    if let Some(load_error) = &report.load_error {
        println!("\n❌ Load failed: {}", load_error);
    }
}

fn print_failure(e: &EtlError) {
    eprintln!("❌ Pipeline failed: {}", e);
    if let EtlError::RowDecode(failures) = e {
        for failure in failures {
            eprintln!("   - {}", failure);
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let _guard = logging::init_logging();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let mode = config.mode;

    let recorder = match &cli.metrics_file {
        Some(_) => Some(metrics::install_recorder()?),
        None => None,
    };

    let pipeline = Pipeline::new(config);
    let result = pipeline.run();

    match &result {
        Ok(report) if cli.json => println!("{}", serde_json::to_string_pretty(report)?),
        Ok(report) => print_report(report),
        Err(e) => {
            error!("Pipeline failed: {}", e);
            print_failure(e);
        }
    }

    if let (Some(handle), Some(path)) = (&recorder, &cli.metrics_file) {
        metrics::write_snapshot(handle, path)?;
    }

    Ok(ExitCode::from(exit_code(&result, mode)))
}
