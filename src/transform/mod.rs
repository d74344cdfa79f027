//! Hole reachability rules applied to a whole table.
//!
//! Every record's `holes` cell is decoded once and scanned twice, once per
//! threshold. Records fail independently: a cell that cannot be decoded only
//! affects its own row, and [`ValidationMode`] decides what happens to the
//! table when any row failed.

pub mod holes;
pub mod rules;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, FieldRef, Schema};
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::ValidationMode;
use crate::constants::{ERROR_COLUMN, HOLES_COLUMN, WARNING_COLUMN};
use crate::error::{EtlError, Result};

pub use holes::{decode_holes, HoleDecodeError, HoleDescriptor};
pub use rules::{
    critical_ratio, exceeds_any, has_unreachable_hole_error, has_unreachable_hole_warning,
    poor_ratio,
};

/// Derived flags for one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HoleFlags {
    pub warning: bool,
    pub error: bool,
}

pub type RecordOutcome = std::result::Result<HoleFlags, HoleDecodeError>;

/// A record whose holes could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    pub reason: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

/// The augmented table plus what happened while building it
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub table: RecordBatch,
    pub warning_count: usize,
    pub error_count: usize,
    pub failures: Vec<RowFailure>,
}

/// Compute both flags for one `holes` cell
pub fn evaluate_record(cell: Option<&str>) -> RecordOutcome {
    let holes = decode_holes(cell)?;
    Ok(HoleFlags {
        warning: has_unreachable_hole_warning(holes.as_deref()),
        error: has_unreachable_hole_error(holes.as_deref()),
    })
}

/// Append the two flag columns to `table`.
///
/// Input columns and row order are left untouched; pre-existing flag columns
/// are replaced. In lenient mode a record that fails decoding gets null
/// flags and is reported in [`Evaluation::failures`]; in strict mode any
/// failure fails the whole table with [`EtlError::RowDecode`].
#[instrument(skip(table), fields(rows = table.num_rows()))]
pub fn evaluate(table: &RecordBatch, mode: ValidationMode) -> Result<Evaluation> {
    let outcomes = match holes_column(table)? {
        Some(cells) => {
            let cells = cells.as_string::<i32>();
            cells.iter().map(evaluate_record).collect::<Vec<_>>()
        }
        // Nothing was read: keep the flag schema even without data
        None => Vec::new(),
    };

    let mut warnings = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for (row, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(flags) => {
                warnings.push(Some(flags.warning));
                errors.push(Some(flags.error));
            }
            Err(e) => {
                warn!("Failed to decode holes for row {}: {}", row, e);
                failures.push(RowFailure {
                    row,
                    reason: e.to_string(),
                });
                warnings.push(None);
                errors.push(None);
            }
        }
    }

    if mode == ValidationMode::Strict && !failures.is_empty() {
        return Err(EtlError::RowDecode(failures));
    }

    let warning_count = warnings.iter().filter(|f| **f == Some(true)).count();
    let error_count = errors.iter().filter(|f| **f == Some(true)).count();

    let table = append_flags(
        table,
        Arc::new(BooleanArray::from(warnings)),
        Arc::new(BooleanArray::from(errors)),
    )?;

    info!(
        "Flagged {} warning rows and {} error rows ({} failed)",
        warning_count,
        error_count,
        failures.len()
    );

    Ok(Evaluation {
        table,
        warning_count,
        error_count,
        failures,
    })
}

/// The `holes` column as UTF-8, or `None` for the empty table
fn holes_column(table: &RecordBatch) -> Result<Option<ArrayRef>> {
    let schema = table.schema();
    let Some((index, field)) = schema.column_with_name(HOLES_COLUMN) else {
        if table.num_columns() == 0 && table.num_rows() == 0 {
            return Ok(None);
        }
        return Err(EtlError::MissingColumn(HOLES_COLUMN.to_string()));
    };

    if !is_text(field.data_type()) {
        return Err(EtlError::UnsupportedColumnType {
            column: HOLES_COLUMN.to_string(),
            data_type: field.data_type().to_string(),
        });
    }

    let column = table.column(index);
    if column.data_type() == &DataType::Utf8 {
        return Ok(Some(column.clone()));
    }
    Ok(Some(cast(column, &DataType::Utf8)?))
}

fn is_text(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, value) => is_text(value),
        _ => false,
    }
}

fn append_flags(table: &RecordBatch, warnings: ArrayRef, errors: ArrayRef) -> Result<RecordBatch> {
    let schema = table.schema();
    let mut fields: Vec<FieldRef> = Vec::with_capacity(schema.fields().len() + 2);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len() + 2);

    for (field, column) in schema.fields().iter().zip(table.columns()) {
        if field.name() == WARNING_COLUMN || field.name() == ERROR_COLUMN {
            continue;
        }
        fields.push(field.clone());
        columns.push(column.clone());
    }

    fields.push(Arc::new(Field::new(WARNING_COLUMN, DataType::Boolean, true)));
    columns.push(warnings);
    fields.push(Arc::new(Field::new(ERROR_COLUMN, DataType::Boolean, true)));
    columns.push(errors);

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}
