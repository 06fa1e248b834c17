// src/process/mod.rs
use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Array, Float64Array},
    datatypes::DataType,
    record_batch::RecordBatch,
};
use chrono::NaiveDate;

pub mod clean;
pub mod convert;
pub mod date_parser;
pub mod dates;
pub mod quality;
pub mod resample;
pub mod rolling;
pub mod utils;

/// One in-memory table: a name for reporting, the column holding its dates,
/// and the typed columns as an Arrow batch.
///
/// Transformations never modify a `Dataset`; they return a new one built
/// with [`Dataset::with_batch`].
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub date_column: String,
    pub batch: RecordBatch,
}

impl Dataset {
    pub fn new(name: impl Into<String>, date_column: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            date_column: date_column.into(),
            batch,
        }
    }

    /// Same name and date column, different contents.
    pub fn with_batch(&self, batch: RecordBatch) -> Self {
        Self {
            name: self.name.clone(),
            date_column: self.date_column.clone(),
            batch,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| anyhow!("{}: no column named {}", self.name, name))
    }

    /// A numeric column, or an error if it is absent or not Float64.
    pub fn f64_column(&self, name: &str) -> Result<&Float64Array> {
        let col = self.column(name)?;
        col.as_any().downcast_ref::<Float64Array>().ok_or_else(|| {
            anyhow!(
                "{}: column {} is {:?}, expected Float64",
                self.name,
                name,
                col.data_type()
            )
        })
    }

    /// Values of a numeric column with missing cells as `None`.
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        Ok(self.f64_column(name)?.iter().collect())
    }

    /// The date column as dates. Fails until dates have been normalized.
    pub fn dates(&self) -> Result<Vec<Option<NaiveDate>>> {
        let col = self.column(&self.date_column)?;
        let arr = col
            .as_any()
            .downcast_ref::<Date32Array>()
            .ok_or_else(|| {
                anyhow!(
                    "{}: date column {} is {:?}; normalize dates first",
                    self.name,
                    self.date_column,
                    col.data_type()
                )
            })?;
        Ok(arr
            .iter()
            .map(|v| v.map(date_parser::from_epoch_days))
            .collect())
    }

    /// Pairs each date with the value of `column`, in row order.
    pub fn dated_values(&self, column: &str) -> Result<Vec<(NaiveDate, Option<f64>)>> {
        let dates = self.dates()?;
        let values = self.f64_values(column)?;
        Ok(dates
            .into_iter()
            .zip(values)
            .filter_map(|(d, v)| d.map(|d| (d, v)))
            .collect())
    }

    pub fn dates_normalized(&self) -> bool {
        self.batch
            .column_by_name(&self.date_column)
            .map(|c| c.data_type() == &DataType::Date32)
            .unwrap_or(false)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::dataset_from_csv;
    use super::*;

    #[test]
    fn accessors_report_shape_and_columns() -> Result<()> {
        let ds = dataset_from_csv("MONTH,A,B\n2010-06,1,x\n2010-07,2,y\n", "MONTH")?;
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.num_columns(), 3);
        assert_eq!(ds.column_names(), vec!["MONTH", "A", "B"]);
        assert_eq!(ds.f64_values("A")?, vec![Some(1.0), Some(2.0)]);
        assert!(ds.f64_column("B").is_err());
        assert!(ds.column("C").is_err());
        Ok(())
    }

    #[test]
    fn dates_require_normalization() -> Result<()> {
        let ds = dataset_from_csv("MONTH,A\n2010-06,1\n", "MONTH")?;
        assert!(!ds.dates_normalized());
        assert!(ds.dates().is_err());
        Ok(())
    }
}
