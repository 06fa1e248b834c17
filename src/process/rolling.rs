use crate::process::Dataset;
use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array},
    record_batch::RecordBatch,
};
use std::sync::Arc;

/// Trailing mean over `window` values.
///
/// The first `window - 1` results are missing, as is any window that
/// contains a missing value.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Result<Vec<Option<f64>>> {
    if window == 0 {
        bail!("rolling window must be at least 1");
    }

    let mut out = vec![None; values.len().min(window - 1)];
    for w in values.windows(window) {
        let sum: Option<f64> = w.iter().copied().sum();
        out.push(sum.map(|s| s / window as f64));
    }
    Ok(out)
}

/// Replace each of `columns` with its trailing `window` mean. Other columns,
/// including the date column, are kept as they are.
pub fn rolling_dataset(ds: &Dataset, columns: &[&str], window: usize) -> Result<Dataset> {
    let schema = ds.batch.schema();
    let mut arrays: Vec<ArrayRef> = ds.batch.columns().to_vec();

    for name in columns {
        let idx = schema
            .index_of(name)
            .with_context(|| format!("{}: no column {}", ds.name, name))?;
        let smoothed = rolling_mean(&ds.f64_values(name)?, window)?;
        arrays[idx] = Arc::new(Float64Array::from(smoothed));
    }

    let batch = RecordBatch::try_new(schema, arrays)
        .with_context(|| format!("building rolling table for {}", ds.name))?;
    Ok(Dataset::new(
        format!("{} ({}-row rolling mean)", ds.name, window),
        ds.date_column.clone(),
        batch,
    ))
}
