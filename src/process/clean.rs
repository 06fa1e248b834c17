use crate::process::Dataset;
use anyhow::{Context, Result};
use arrow::{
    array::{Array, BooleanArray},
    compute::filter_record_batch,
};
use tracing::info;

/// Drop every row that has a missing value in any column.
///
/// The returned dataset has no missing values; the input is untouched.
pub fn drop_missing(ds: &Dataset) -> Result<Dataset> {
    let columns = ds.batch.columns();
    let keep: BooleanArray = (0..ds.num_rows())
        .map(|row| Some(columns.iter().all(|c| c.is_valid(row))))
        .collect();

    let batch = filter_record_batch(&ds.batch, &keep)
        .with_context(|| format!("dropping missing rows from {}", ds.name))?;

    let dropped = ds.num_rows() - batch.num_rows();
    info!(dataset = %ds.name, dropped, remaining = batch.num_rows(), "dropped rows with missing values");
    Ok(ds.with_batch(batch))
}
