//! Arrow IPC file tables.
//!
//! Every table the pipeline reads or writes is a single Arrow IPC file.
//! Readers coerce columns with Arrow casts so producers may hand over
//! strings for timestamps, dictionary-encoded names, or 32-bit counts.

pub mod events;
pub mod tables;

use crate::error::{HealthError, Result};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array, PrimitiveArray,
    StringArray, TimestampMicrosecondArray, UInt64Array,
};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float64Type, Int64Type, SchemaRef, TimeUnit,
    TimestampMicrosecondType, UInt64Type,
};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::debug;

/// Reads every record batch of an IPC file. With `columns` set, only those
/// columns are decoded and a missing one is reported by name.
pub fn read_table(path: &Path, columns: Option<&[&str]>) -> Result<Vec<RecordBatch>> {
    if !path.exists() {
        return Err(HealthError::PathNotFound(path.display().to_string()));
    }

    let projection = match columns {
        Some(columns) => {
            let schema = read_schema(path)?;
            let indices = columns
                .iter()
                .map(|column| {
                    schema
                        .index_of(column)
                        .map_err(|_| missing_column(column, path))
                })
                .collect::<Result<Vec<_>>>()?;
            Some(indices)
        }
        None => None,
    };

    let reader = FileReader::try_new(BufReader::new(File::open(path)?), projection)?;
    let batches = reader
        .map(|batch| batch.map_err(HealthError::from))
        .collect::<Result<Vec<_>>>()?;
    debug!("read {} record batch(es) from {}", batches.len(), path.display());
    Ok(batches)
}

pub fn read_schema(path: &Path) -> Result<SchemaRef> {
    if !path.exists() {
        return Err(HealthError::PathNotFound(path.display().to_string()));
    }
    let reader = FileReader::try_new(BufReader::new(File::open(path)?), None)?;
    Ok(reader.schema())
}

/// Writes one record batch as an IPC file, creating parent directories.
pub fn write_table(path: &Path, batch: &RecordBatch) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = BufWriter::new(File::create(path)?);
    let mut writer = FileWriter::try_new(file, &batch.schema())?;
    writer.write(batch)?;
    writer.finish()?;
    debug!("wrote {} row(s) to {}", batch.num_rows(), path.display());
    Ok(())
}

pub(crate) fn missing_column(column: &str, source: &Path) -> HealthError {
    HealthError::MissingColumn {
        column: column.to_string(),
        source_path: source.display().to_string(),
    }
}

/// Casts a column to `to`. A value that does not parse fails the read
/// instead of becoming null.
fn cast_column(
    batch: &RecordBatch,
    column: &str,
    to: &DataType,
    source: &Path,
) -> Result<ArrayRef> {
    let array = batch
        .column_by_name(column)
        .ok_or_else(|| missing_column(column, source))?;
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, to, &options).map_err(|e| HealthError::InvalidColumn {
        column: column.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn string_column(
    batch: &RecordBatch,
    column: &str,
    source: &Path,
) -> Result<StringArray> {
    let array = cast_column(batch, column, &DataType::Utf8, source)?;
    Ok(array.as_string::<i32>().clone())
}

pub(crate) fn timestamp_column(
    batch: &RecordBatch,
    column: &str,
    source: &Path,
) -> Result<TimestampMicrosecondArray> {
    let array = cast_column(
        batch,
        column,
        &DataType::Timestamp(TimeUnit::Microsecond, None),
        source,
    )?;
    Ok(array.as_primitive::<TimestampMicrosecondType>().clone())
}

pub(crate) fn int64_column(batch: &RecordBatch, column: &str, source: &Path) -> Result<Int64Array> {
    let array = cast_column(batch, column, &DataType::Int64, source)?;
    Ok(array.as_primitive::<Int64Type>().clone())
}

pub(crate) fn uint64_column(
    batch: &RecordBatch,
    column: &str,
    source: &Path,
) -> Result<UInt64Array> {
    let array = cast_column(batch, column, &DataType::UInt64, source)?;
    Ok(array.as_primitive::<UInt64Type>().clone())
}

pub(crate) fn float64_column(
    batch: &RecordBatch,
    column: &str,
    source: &Path,
) -> Result<Float64Array> {
    let array = cast_column(batch, column, &DataType::Float64, source)?;
    Ok(array.as_primitive::<Float64Type>().clone())
}

pub(crate) fn boolean_column(
    batch: &RecordBatch,
    column: &str,
    source: &Path,
) -> Result<BooleanArray> {
    let array = cast_column(batch, column, &DataType::Boolean, source)?;
    Ok(array.as_boolean().clone())
}

pub(crate) fn opt_str(array: &StringArray, row: usize) -> Option<&str> {
    if array.is_null(row) {
        None
    } else {
        Some(array.value(row))
    }
}

pub(crate) fn opt_datetime(
    array: &TimestampMicrosecondArray,
    row: usize,
) -> Option<NaiveDateTime> {
    if array.is_null(row) {
        None
    } else {
        array.value_as_datetime(row)
    }
}

pub(crate) fn opt_i64(array: &Int64Array, row: usize) -> Option<i64> {
    if array.is_null(row) {
        None
    } else {
        Some(array.value(row))
    }
}

/// Value of a column that must not hold nulls.
pub(crate) fn required<T: ArrowPrimitiveType>(
    array: &PrimitiveArray<T>,
    column: &str,
    row: usize,
) -> Result<T::Native> {
    if array.is_null(row) {
        return Err(HealthError::InvalidColumn {
            column: column.to_string(),
            reason: format!("null value in row {row}"),
        });
    }
    Ok(array.value(row))
}

pub(crate) fn to_micros(value: Option<NaiveDateTime>) -> Option<i64> {
    value.map(|datetime| datetime.and_utc().timestamp_micros())
}
