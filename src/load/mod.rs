// src/load/mod.rs
use crate::process::{convert, Dataset};
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::{fmt, fs::File, path::Path};
use tracing::{debug, info};

/// A CSV file as read from disk, before any typing.
#[derive(Debug)]
pub struct RawTable {
    /// Path (or other label) the rows came from, for error messages.
    pub source: String,
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Each data row, one String per field.
    pub rows: Vec<Vec<String>>,
}

/// The datasets the walkthrough knows about, each with a fixed file name,
/// date column and the headers it must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Tesla,
    BitcoinSearch,
    BitcoinPrice,
    Unemployment,
    UnemploymentExtended,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Tesla,
        DatasetKind::BitcoinSearch,
        DatasetKind::BitcoinPrice,
        DatasetKind::Unemployment,
        DatasetKind::UnemploymentExtended,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            DatasetKind::Tesla => "TESLA Search Trend vs Price.csv",
            DatasetKind::BitcoinSearch => "Bitcoin Search Trend.csv",
            DatasetKind::BitcoinPrice => "Daily Bitcoin Price.csv",
            DatasetKind::Unemployment => "UE Benefits Search vs UE Rate 2004-19.csv",
            DatasetKind::UnemploymentExtended => "UE Benefits Search vs UE Rate 2004-20.csv",
        }
    }

    pub fn date_column(self) -> &'static str {
        match self {
            DatasetKind::BitcoinPrice => "DATE",
            _ => "MONTH",
        }
    }

    /// Headers that must be present, date column included.
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            DatasetKind::Tesla => &["MONTH", "TSLA_WEB_SEARCH", "TSLA_USD_CLOSE"],
            DatasetKind::BitcoinSearch => &["MONTH", "BTC_NEWS_SEARCH"],
            DatasetKind::BitcoinPrice => &["DATE", "CLOSE"],
            DatasetKind::Unemployment | DatasetKind::UnemploymentExtended => {
                &["MONTH", "UE_BENEFITS_WEB_SEARCH", "UNRATE"]
            }
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DatasetKind::Tesla => "Tesla",
            DatasetKind::BitcoinSearch => "BTC Search",
            DatasetKind::BitcoinPrice => "BTC Price",
            DatasetKind::Unemployment => "U/E",
            DatasetKind::UnemploymentExtended => "U/E incl. 2020",
        };
        f.write_str(name)
    }
}

/// Read a CSV with a header row into a `RawTable`. Rows may be ragged;
/// typing happens later.
pub fn read_raw_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(file);

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        rows.push(record.iter().map(|s| s.to_string()).collect());
    }
    debug!(path = %path.display(), rows = rows.len(), "read raw csv");

    Ok(RawTable {
        source: path.display().to_string(),
        headers,
        rows,
    })
}

/// Load any CSV as a typed `Dataset`. The date column, if named, must exist
/// and is kept as text until dates are normalized.
#[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P, date_column: Option<&str>) -> Result<Dataset> {
    let raw = read_raw_csv(&path)?;
    if let Some(col) = date_column {
        require_columns(&raw, &[col])?;
    }
    let batch = convert::raw_to_batch(&raw, date_column)?;

    let name = path
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| raw.source.clone());
    Ok(Dataset::new(name, date_column.unwrap_or_default(), batch))
}

/// Load one of the known datasets from `data_dir`.
#[tracing::instrument(level = "info", skip(data_dir), fields(dir = %data_dir.as_ref().display()))]
pub fn load_dataset<P: AsRef<Path>>(kind: DatasetKind, data_dir: P) -> Result<Dataset> {
    let path = data_dir.as_ref().join(kind.file_name());
    let raw = read_raw_csv(&path)?;
    require_columns(&raw, kind.required_columns())?;

    let batch = convert::raw_to_batch(&raw, Some(kind.date_column()))?;
    let ds = Dataset::new(kind.to_string(), kind.date_column(), batch);
    info!(dataset = %kind, rows = ds.num_rows(), cols = ds.num_columns(), "loaded");
    Ok(ds)
}

fn require_columns(raw: &RawTable, required: &[&str]) -> Result<()> {
    for col in required {
        if !raw.headers.iter().any(|h| h == col) {
            bail!(
                "{}: expected column {} (found {:?})",
                raw.source,
                col,
                raw.headers
            );
        }
    }
    Ok(())
}
