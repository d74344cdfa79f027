use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::{EtlConfig, ValidationMode};
use crate::error::Result;
use crate::extract::{extract, try_extract};
use crate::load::load;
use crate::transform::{evaluate, RowFailure};

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_path: PathBuf,
    pub destination: PathBuf,
    pub table_name: String,
    pub mode: ValidationMode,
    pub rows_read: usize,
    pub rows_transformed: usize,
    pub rows_written: usize,
    pub warning_rows: usize,
    pub error_rows: usize,
    pub row_failures: Vec<RowFailure>,
    pub load_error: Option<String>,
}

impl PipelineReport {
    /// True when every stage finished without a logged failure
    pub fn is_clean(&self) -> bool {
        self.row_failures.is_empty() && self.load_error.is_none()
    }
}

/// Extract -> evaluate -> load, strictly in sequence
pub struct Pipeline {
    config: EtlConfig,
}

impl Pipeline {
    pub fn new(config: EtlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run the whole pipeline once.
    ///
    /// In lenient mode a failed read continues with an empty table and a
    /// failed write is recorded in [`PipelineReport::load_error`]; only an
    /// invalid configuration or an unusable table shape returns `Err`. In
    /// strict mode every failure is returned.
    pub fn run(&self) -> Result<PipelineReport> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline", run_id = %run_id, mode = %self.config.mode);
        let _enter = span.enter();

        let started_at = Utc::now();
        let t_pipeline = Instant::now();
        counter!("hole_etl_runs_total").increment(1);
        info!("🚀 Starting run from {}", self.config.input_path.display());

        // Step 1: Extract
        let t_extract = Instant::now();
        let table = match self.config.mode {
            ValidationMode::Lenient => extract(&self.config.input_path),
            ValidationMode::Strict => try_extract(&self.config.input_path)?,
        };
        histogram!("hole_etl_extract_duration_seconds").record(t_extract.elapsed().as_secs_f64());
        counter!("hole_etl_rows_read_total").increment(table.num_rows() as u64);
        let rows_read = table.num_rows();
        info!("📥 Read {} rows", rows_read);

        // Step 2: Transform
        let t_transform = Instant::now();
        let evaluation = evaluate(&table, self.config.mode)?;
        drop(table);
        histogram!("hole_etl_transform_duration_seconds")
            .record(t_transform.elapsed().as_secs_f64());
        counter!("hole_etl_warning_rows_total").increment(evaluation.warning_count as u64);
        counter!("hole_etl_error_rows_total").increment(evaluation.error_count as u64);
        counter!("hole_etl_decode_failures_total").increment(evaluation.failures.len() as u64);
        if !evaluation.failures.is_empty() {
            warn!(
                "{} rows could not be decoded and were written with null flags",
                evaluation.failures.len()
            );
        }

        // Step 3: Load
        let t_load = Instant::now();
        let (rows_written, load_error) = match load(
            &evaluation.table,
            &self.config.db_path,
            &self.config.table_name,
        ) {
            Ok(report) => (report.rows_written, None),
            Err(e) if self.config.mode == ValidationMode::Lenient => {
                error!("Error loading data into database: {}", e);
                (0, Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };
        histogram!("hole_etl_load_duration_seconds").record(t_load.elapsed().as_secs_f64());
        counter!("hole_etl_rows_written_total").increment(rows_written as u64);

        histogram!("hole_etl_pipeline_duration_seconds").record(t_pipeline.elapsed().as_secs_f64());
        info!("✅ Wrote {} rows to {}", rows_written, self.config.table_name);

        Ok(PipelineReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            input_path: self.config.input_path.clone(),
            destination: self.config.db_path.clone(),
            table_name: self.config.table_name.clone(),
            mode: self.config.mode,
            rows_read,
            rows_transformed: evaluation.table.num_rows(),
            rows_written,
            warning_rows: evaluation.warning_count,
            error_rows: evaluation.error_count,
            row_failures: evaluation.failures,
            load_error,
        })
    }
}
