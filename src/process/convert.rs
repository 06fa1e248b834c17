use crate::load::RawTable;
use crate::process::utils;
use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Builder, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

/// Convert the string cells of a raw table into a typed batch.
///
/// - `date_column` (if any) stays Utf8; dates are parsed in a later step
/// - columns whose present cells are all numeric → Float64
/// - everything else → Utf8
///
/// Missing cells become nulls in either case.
pub fn raw_to_batch(raw: &RawTable, date_column: Option<&str>) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(raw.headers.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(raw.headers.len());

    for (i, name) in raw.headers.iter().enumerate() {
        let cells = || raw.rows.iter().map(move |r| r.get(i).map(String::as_str).unwrap_or(""));

        let dtype = if Some(name.as_str()) == date_column {
            DataType::Utf8
        } else {
            utils::infer_column_dtype(cells())
        };
        debug!(column = %name, ?dtype, "inferred column type");

        let col: ArrayRef = match dtype {
            DataType::Float64 => {
                let mut b = Float64Builder::with_capacity(raw.rows.len());
                for cell in cells() {
                    b.append_option(utils::parse_number(cell));
                }
                Arc::new(b.finish())
            }
            _ => {
                let mut b = StringBuilder::new();
                for cell in cells() {
                    if utils::is_missing(cell) {
                        b.append_null();
                    } else {
                        b.append_value(utils::clean_str(cell));
                    }
                }
                Arc::new(b.finish())
            }
        };

        fields.push(Field::new(name, dtype, true));
        columns.push(col);
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .with_context(|| format!("building record batch for {}", raw.source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Float64Array, StringArray};

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            source: "inline".into(),
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn numeric_and_text_columns() -> Result<()> {
        let t = raw(
            &["DATE", "CLOSE", "NOTE"],
            &[&["2017-01-01", "998.3", "a"], &["2017-01-02", "", ""]],
        );
        let batch = raw_to_batch(&t, Some("DATE"))?;

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Float64);
        assert_eq!(schema.field(2).data_type(), &DataType::Utf8);

        let close = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(close.value(0), 998.3);
        assert!(close.is_null(1));

        let note = batch
            .column(2)
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(note.value(0), "a");
        assert!(note.is_null(1));
        Ok(())
    }

    #[test]
    fn short_rows_are_padded_with_nulls() -> Result<()> {
        let t = raw(&["MONTH", "X"], &[&["2010-01", "1"], &["2010-02"]]);
        let batch = raw_to_batch(&t, Some("MONTH"))?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.column(1).null_count(), 1);
        Ok(())
    }
}
