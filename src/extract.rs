use arrow::compute::concat_batches;
use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::error::Result;

/// The table returned when nothing could be read: zero columns, zero rows
pub fn empty_table() -> RecordBatch {
    RecordBatch::new_empty(Arc::new(Schema::empty()))
}

/// Read a Parquet file into a single in-memory table.
///
/// Column names and Arrow types are kept as stored in the file. A file
/// without rows yields a zero-row table that still carries the file's schema.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn try_extract<P: AsRef<Path>>(path: P) -> Result<RecordBatch> {
    let file = File::open(path.as_ref())?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    debug!("Parquet schema has {} columns", schema.fields().len());

    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let table = concat_batches(&schema, &batches)?;

    info!(
        "Read {} rows across {} batches",
        table.num_rows(),
        batches.len()
    );
    Ok(table)
}

/// Fail-soft read: any failure is logged and replaced by [`empty_table`].
pub fn extract<P: AsRef<Path>>(path: P) -> RecordBatch {
    match try_extract(&path) {
        Ok(table) => table,
        Err(e) => {
            error!(
                "Error reading the parquet file {}: {}",
                path.as_ref().display(),
                e
            );
            empty_table()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field};
    use parquet::arrow::ArrowWriter;
    use parquet::basic::{Compression, GzipLevel};
    use parquet::file::properties::WriterProperties;
    use std::io::Write;

    fn write_gzip_parquet(path: &Path) {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("holes", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![
                    Some(r#"[{"length": 5, "radius": 1}]"#),
                    None,
                ])),
            ],
        )
        .unwrap();

        let props = WriterProperties::builder()
            .set_compression(Compression::GZIP(GzipLevel::default()))
            .build();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, Some(props)).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn test_reads_gzip_file_with_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cases.gz.parquet");
        write_gzip_parquet(&path);

        let table = try_extract(&path).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.schema().field(0).name(), "id");
        assert_eq!(table.schema().field(1).data_type(), &DataType::Utf8);
        assert!(table.column(1).is_null(1));
    }

    #[test]
    fn test_missing_file_yields_empty_table() {
        let table = extract("definitely/not/here.parquet");
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_corrupt_file_yields_empty_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not parquet").unwrap();

        assert!(try_extract(file.path()).is_err());
        let table = extract(file.path());
        assert_eq!(table.num_columns(), 0);
    }
}
