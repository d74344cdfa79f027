//! Column and default-path constants shared across the pipeline stages.

// Input column holding the JSON-encoded hole list
pub const HOLES_COLUMN: &str = "holes";

// Derived flag columns, appended in this order
pub const WARNING_COLUMN: &str = "has_unreachable_hole_warning";
pub const ERROR_COLUMN: &str = "has_unreachable_hole_error";

// Defaults used when the binary runs without arguments
pub const DEFAULT_INPUT_PATH: &str = "data/2023 DE_case_dataset.gz.parquet";
pub const DEFAULT_DB_PATH: &str = "data/cases.db";
pub const DEFAULT_TABLE_NAME: &str = "cases";

// Threshold multipliers applied to a hole's diameter (radius * 2)
pub const POOR_DEPTH_FACTOR: f64 = 10.0;
pub const CRITICAL_DEPTH_FACTOR: f64 = 40.0;
