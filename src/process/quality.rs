use crate::process::Dataset;
use anyhow::Result;
use arrow::{
    array::{Array, Float64Array},
    compute,
    datatypes::DataType,
};
use std::fmt;

/// `(rows, columns)`
pub fn shape(ds: &Dataset) -> (usize, usize) {
    (ds.num_rows(), ds.num_columns())
}

/// Largest value of a numeric column, ignoring missing cells.
pub fn column_max(ds: &Dataset, column: &str) -> Result<Option<f64>> {
    Ok(compute::max(ds.f64_column(column)?))
}

/// Smallest value of a numeric column, ignoring missing cells.
pub fn column_min(ds: &Dataset, column: &str) -> Result<Option<f64>> {
    Ok(compute::min(ds.f64_column(column)?))
}

/// True if any cell in the table is missing.
pub fn has_missing(ds: &Dataset) -> bool {
    ds.batch.columns().iter().any(|c| c.null_count() > 0)
}

/// Missing cells per column, in column order.
pub fn missing_counts(ds: &Dataset) -> Vec<(String, usize)> {
    ds.column_names()
        .into_iter()
        .zip(ds.batch.columns())
        .map(|(name, col)| (name, col.null_count()))
        .collect()
}

/// Name, Arrow type and missing count of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: DataType,
    pub missing: usize,
}

/// Per-column type and missing table, in column order.
#[derive(Debug, Clone)]
pub struct ColumnTable {
    pub columns: Vec<ColumnInfo>,
}

pub fn column_table(ds: &Dataset) -> ColumnTable {
    let schema = ds.batch.schema();
    let columns = schema
        .fields()
        .iter()
        .zip(ds.batch.columns())
        .map(|(field, col)| ColumnInfo {
            name: field.name().clone(),
            data_type: field.data_type().clone(),
            missing: col.null_count(),
        })
        .collect();
    ColumnTable { columns }
}

impl fmt::Display for ColumnTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<32} {:<10} {:>8}", "column", "type", "missing")?;
        for c in &self.columns {
            writeln!(
                f,
                "{:<32} {:<10} {:>8}",
                c.name,
                c.data_type.to_string(),
                c.missing
            )?;
        }
        Ok(())
    }
}

/// Summary statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n − 1); NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

/// `describe()`-style table over every numeric column of a dataset.
#[derive(Debug, Clone)]
pub struct Summary {
    pub dataset: String,
    pub columns: Vec<ColumnSummary>,
}

/// Summary statistics for each Float64 column. Columns with no values are
/// skipped.
pub fn describe(ds: &Dataset) -> Summary {
    let columns = ds
        .column_names()
        .into_iter()
        .zip(ds.batch.columns())
        .filter_map(|(name, col)| {
            let arr = col.as_any().downcast_ref::<Float64Array>()?;
            summarize(name, arr)
        })
        .collect();

    Summary {
        dataset: ds.name.clone(),
        columns,
    }
}

fn summarize(column: String, arr: &Float64Array) -> Option<ColumnSummary> {
    let mut values: Vec<f64> = arr.iter().flatten().filter(|v| !v.is_nan()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    } else {
        f64::NAN
    };

    Some(ColumnSummary {
        column,
        count: values.len(),
        mean,
        std,
        min: values[0],
        q25: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q75: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<8}", "")?;
        for c in &self.columns {
            write!(f, " {:>24}", c.column)?;
        }
        writeln!(f)?;

        let rows: [(&str, fn(&ColumnSummary) -> f64); 8] = [
            ("count", |c| c.count as f64),
            ("mean", |c| c.mean),
            ("std", |c| c.std),
            ("min", |c| c.min),
            ("25%", |c| c.q25),
            ("50%", |c| c.median),
            ("75%", |c| c.q75),
            ("max", |c| c.max),
        ];
        for (label, get) in rows {
            write!(f, "{:<8}", label)?;
            for c in &self.columns {
                write!(f, " {:>24.6}", get(c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
