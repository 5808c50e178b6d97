use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMillisecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use matchday_core::{FeatureTable, Value};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::export::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Timestamp,
    Text,
}

impl ColumnKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Int(_) => Some(ColumnKind::Int),
            Value::Float(_) => Some(ColumnKind::Float),
            Value::Bool(_) => Some(ColumnKind::Bool),
            Value::Timestamp(_) => Some(ColumnKind::Timestamp),
            Value::Text(_) => Some(ColumnKind::Text),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnKind::Int, ColumnKind::Float) | (ColumnKind::Float, ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => ColumnKind::Text,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
            ColumnKind::Text => DataType::Utf8,
        }
    }
}

/// Column type from its non-null cells. Int and float mix to float, any other
/// mix and all-null columns fall back to text.
fn column_kind(table: &FeatureTable, column: &str) -> ColumnKind {
    table
        .rows()
        .iter()
        .filter_map(|row| ColumnKind::of(row.get(column)))
        .reduce(ColumnKind::merge)
        .unwrap_or(ColumnKind::Text)
}

fn column_array(table: &FeatureTable, column: &str, kind: ColumnKind) -> ArrayRef {
    let cells = table.rows().iter().map(|row| row.get(column));
    match kind {
        ColumnKind::Int => Arc::new(Int64Array::from(
            cells.map(Value::as_i64).collect::<Vec<_>>(),
        )),
        ColumnKind::Float => Arc::new(Float64Array::from(
            cells.map(Value::as_f64).collect::<Vec<_>>(),
        )),
        ColumnKind::Bool => Arc::new(BooleanArray::from(
            cells.map(Value::as_bool).collect::<Vec<_>>(),
        )),
        ColumnKind::Timestamp => Arc::new(TimestampMillisecondArray::from(
            cells
                .map(|cell| match cell {
                    Value::Timestamp(at) => Some(at.and_utc().timestamp_millis()),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        ColumnKind::Text => Arc::new(StringArray::from(
            cells
                .map(|cell| (!cell.is_null()).then(|| cell.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

/// The table as one snappy-compressed Parquet row group, columns in table
/// order, every field nullable.
pub fn write_parquet(table: &FeatureTable) -> Result<Vec<u8>, ExportError> {
    let mut fields = Vec::with_capacity(table.columns().len());
    let mut arrays = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        let kind = column_kind(table, column);
        fields.push(Field::new(column.as_str(), kind.data_type(), true));
        arrays.push(column_array(table, column, kind));
    }
    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}
