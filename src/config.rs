use crate::chart::RenderOptions;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        let opts = RenderOptions::default();
        Self {
            width: opts.width,
            height: opts.height,
        }
    }
}

impl From<&ChartConfig> for RenderOptions {
    fn from(c: &ChartConfig) -> Self {
        RenderOptions {
            width: c.width,
            height: c.height,
        }
    }
}

/// Settings for a walkthrough run. Every field has a default, so an empty
/// (or absent) file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the input CSV files.
    pub data_dir: PathBuf,
    /// Where chart SVGs are written.
    pub output_dir: PathBuf,
    /// Months in the trailing mean of the rolling chart.
    pub rolling_window: usize,
    pub chart: ChartConfig,
    pub export_parquet: bool,
    pub export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("charts"),
            rolling_window: 6,
            chart: ChartConfig::default(),
            export_parquet: false,
            export_dir: PathBuf::from("parquet"),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    let config: AppConfig = serde_yaml::from_str(content)?;
    if config.rolling_window == 0 {
        anyhow::bail!("rolling_window must be at least 1");
    }
    Ok(config)
}
