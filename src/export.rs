// src/export.rs
use crate::process::Dataset;
use anyhow::{Context, Result};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name for a dataset's export: lowercase, non-alphanumerics → `_`.
pub fn parquet_file_name(ds: &Dataset) -> String {
    let stem: String = ds
        .name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.parquet", stem.trim_matches('_'))
}

/// Write `ds` to `out_dir` as a single Parquet file. The data goes to a
/// `.tmp` file first and is renamed into place once the writer has closed.
pub fn write_parquet(ds: &Dataset, out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating export directory {}", out_dir.display()))?;

    let out_path = out_dir.join(parquet_file_name(ds));
    let temp_path = out_path.with_extension("tmp");

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(&temp_path)
        .with_context(|| format!("creating {}", temp_path.display()))?;
    let mut writer = ArrowWriter::try_new(file, ds.batch.schema(), Some(props))
        .with_context(|| format!("opening parquet writer for {}", ds.name))?;
    writer
        .write(&ds.batch)
        .with_context(|| format!("writing {}", ds.name))?;
    writer
        .close()
        .with_context(|| format!("closing parquet writer for {}", ds.name))?;

    fs::rename(&temp_path, &out_path).with_context(|| {
        format!(
            "renaming {} → {}",
            temp_path.display(),
            out_path.display()
        )
    })?;

    info!(dataset = %ds.name, rows = ds.num_rows(), path = %out_path.display(), "exported");
    Ok(out_path)
}
