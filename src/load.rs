use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::{EtlError, Result};

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub table_name: String,
    pub rows_written: usize,
}

/// SQLite storage class chosen for an Arrow column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
}

impl SqlType {
    pub fn for_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => SqlType::Integer,
            DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _) => SqlType::Real,
            DataType::Binary | DataType::LargeBinary | DataType::BinaryView => SqlType::Blob,
            // strings, dictionaries, temporals and nested values are stored as text
            _ => SqlType::Text,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }
}

/// Quote an identifier for use in SQLite statements
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Replace `table_name` in the SQLite database at `destination` with `table`.
///
/// The drop, create and inserts run in one transaction. The connection lives
/// only for the duration of this call and is closed on every path.
#[instrument(skip(table, destination), fields(destination = %destination.as_ref().display(), rows = table.num_rows()))]
pub fn load<P: AsRef<Path>>(table: &RecordBatch, destination: P, table_name: &str) -> Result<LoadReport> {
    let destination = destination.as_ref();
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let schema = table.schema();
    let columns = schema
        .fields()
        .iter()
        .zip(table.columns())
        .map(|(field, array)| SqlColumn::try_new(field.name(), array))
        .collect::<Result<Vec<_>>>()?;

    let mut conn = Connection::open(destination)?;
    let tx = conn.transaction()?;
    let quoted_table = quote_identifier(table_name);

    tx.execute(&format!("DROP TABLE IF EXISTS {quoted_table}"), [])?;

    if columns.is_empty() {
        // SQLite cannot hold a table without columns
        debug!("No columns to write, dropped {}", table_name);
        tx.commit()?;
        return Ok(LoadReport {
            table_name: table_name.to_string(),
            rows_written: 0,
        });
    }

    let definitions = columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(c.name), c.sql_type.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute(&format!("CREATE TABLE {quoted_table} ({definitions})"), [])?;

    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    {
        let mut stmt = tx.prepare(&format!("INSERT INTO {quoted_table} VALUES ({placeholders})"))?;
        for row in 0..table.num_rows() {
            stmt.execute(params_from_iter(columns.iter().map(|c| c.value(row))))?;
        }
    }
    tx.commit()?;

    info!(
        "Data loaded successfully into {} table in {} database",
        table_name,
        destination.display()
    );
    Ok(LoadReport {
        table_name: table_name.to_string(),
        rows_written: table.num_rows(),
    })
}

/// One Arrow column converted into something SQLite can bind
struct SqlColumn<'a> {
    name: &'a str,
    sql_type: SqlType,
    values: ColumnValues<'a>,
}

enum ColumnValues<'a> {
    Boolean(&'a BooleanArray),
    Integer(ArrayRef),
    Real(ArrayRef),
    Text(ArrayRef),
    Blob(ArrayRef),
    Formatted(&'a ArrayRef, ArrayFormatter<'a>),
}

impl<'a> SqlColumn<'a> {
    fn try_new(name: &'a str, array: &'a ArrayRef) -> Result<Self> {
        let sql_type = SqlType::for_arrow(array.data_type());
        let values = match (sql_type, array.data_type()) {
            (SqlType::Integer, DataType::Boolean) => ColumnValues::Boolean(array.as_boolean()),
            (SqlType::Integer, _) => ColumnValues::Integer(cast_strict(name, array, &DataType::Int64)?),
            (SqlType::Real, _) => ColumnValues::Real(cast_strict(name, array, &DataType::Float64)?),
            (SqlType::Blob, _) => ColumnValues::Blob(cast_strict(name, array, &DataType::LargeBinary)?),
            (SqlType::Text, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View) => {
                ColumnValues::Text(cast_strict(name, array, &DataType::LargeUtf8)?)
            }
            (SqlType::Text, DataType::Dictionary(_, value))
                if matches!(value.as_ref(), DataType::Utf8 | DataType::LargeUtf8) =>
            {
                ColumnValues::Text(cast_strict(name, array, &DataType::LargeUtf8)?)
            }
            (SqlType::Text, _) => {
                let formatter = ArrayFormatter::try_new(array.as_ref(), &FormatOptions::default())?;
                ColumnValues::Formatted(array, formatter)
            }
        };
        Ok(Self {
            name,
            sql_type,
            values,
        })
    }

    fn value(&self, row: usize) -> Value {
        match &self.values {
            ColumnValues::Boolean(a) if a.is_valid(row) => Value::Integer(a.value(row) as i64),
            ColumnValues::Integer(a) if a.is_valid(row) => {
                Value::Integer(a.as_primitive::<Int64Type>().value(row))
            }
            ColumnValues::Real(a) if a.is_valid(row) => {
                Value::Real(a.as_primitive::<Float64Type>().value(row))
            }
            ColumnValues::Text(a) if a.is_valid(row) => {
                Value::Text(a.as_string::<i64>().value(row).to_string())
            }
            ColumnValues::Blob(a) if a.is_valid(row) => {
                Value::Blob(a.as_binary::<i64>().value(row).to_vec())
            }
            ColumnValues::Formatted(a, f) if a.is_valid(row) => Value::Text(f.value(row).to_string()),
            _ => Value::Null,
        }
    }
}

// Overflowing values are rejected rather than silently nulled
fn cast_strict(column: &str, array: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    if array.data_type() == to {
        return Ok(array.clone());
    }
    let options = CastOptions {
        safe: false,
        format_options: FormatOptions::default(),
    };
    cast_with_options(array, to, &options).map_err(|e| EtlError::ValueOutOfRange {
        column: column.to_string(),
        reason: e.to_string(),
    })
}
