// src/walkthrough/session.rs
use super::Step;
use crate::{
    chart::{comparisons, render, DualAxisChart, RenderOptions},
    config::AppConfig,
    export::write_parquet,
    load::{load_dataset, DatasetKind},
    process::{
        clean::drop_missing,
        dates::{is_chronological, normalize_dates},
        quality::{column_max, column_min, describe, has_missing, missing_counts, shape},
        resample::{month_gaps, resample_monthly_last},
        Dataset,
    },
};
use anyhow::{anyhow, Result};
use std::{io::Write, path::PathBuf};
use tracing::{info, warn};

/// Tables and settings the walkthrough steps operate on. Each step replaces
/// whole tables rather than editing them in place.
pub struct Session<W: Write> {
    pub config: AppConfig,
    pub out: W,
    pub tesla: Dataset,
    pub btc_search: Dataset,
    pub btc_price: Dataset,
    /// Set by the resample step.
    pub btc_monthly: Option<Dataset>,
    pub unemployment: Dataset,
    /// Every chart file written so far.
    pub charts: Vec<PathBuf>,
}

impl<W: Write> Session<W> {
    /// Load the four base tables from `config.data_dir`.
    pub fn load(config: AppConfig, out: W) -> Result<Self> {
        let dir = config.data_dir.clone();
        Ok(Self {
            tesla: load_dataset(DatasetKind::Tesla, &dir)?,
            btc_search: load_dataset(DatasetKind::BitcoinSearch, &dir)?,
            btc_price: load_dataset(DatasetKind::BitcoinPrice, &dir)?,
            btc_monthly: None,
            unemployment: load_dataset(DatasetKind::Unemployment, &dir)?,
            charts: Vec::new(),
            config,
            out,
        })
    }

    fn render_chart(&mut self, chart: DualAxisChart) -> Result<()> {
        let opts = RenderOptions::from(&self.config.chart);
        let path = render(&chart, &self.config.output_dir, &opts)?;
        writeln!(self.out, "Chart written to {}", path.display())?;
        self.charts.push(path);
        Ok(())
    }
}

/// The walkthrough in its fixed order. With `config.export_parquet` an extra
/// step writes the tables out at the end.
pub fn challenge_steps<'a, W: Write + 'a>(config: &AppConfig) -> Vec<Step<'a, Session<W>>> {
    let mut steps = vec![
        Step::new("Explore datasets and summary statistics", explore::<W>),
        Step::new("Check for missing values", check_missing::<W>),
        Step::new("Clean Bitcoin price data (drop NA)", clean::<W>),
        Step::new("Convert date columns to datetime", convert_dates::<W>),
        Step::new("Resample BTC price monthly", resample_btc::<W>),
        Step::new("Plot Tesla Web Search vs Stock Price", |s: &mut Session<W>| {
            let chart = comparisons::tesla_search_vs_price(&s.tesla)?;
            s.render_chart(chart)
        }),
        Step::new("Plot Bitcoin News Search vs Price", |s: &mut Session<W>| {
            let monthly = s
                .btc_monthly
                .as_ref()
                .ok_or_else(|| anyhow!("BTC price resample step has not run"))?;
            let chart = comparisons::bitcoin_search_vs_price(&s.btc_search, monthly)?;
            s.render_chart(chart)
        }),
        Step::new(
            "Plot Unemployment Web Search vs Unemployment Rate",
            |s: &mut Session<W>| {
                let chart = comparisons::unemployment_search_vs_rate(&s.unemployment)?;
                s.render_chart(chart)
            },
        ),
        Step::new(
            format!(
                "Plot {}-month rolling average of UE search + rate",
                config.rolling_window
            ),
            |s: &mut Session<W>| {
                let chart =
                    comparisons::unemployment_rolling(&s.unemployment, s.config.rolling_window)?;
                s.render_chart(chart)
            },
        ),
        Step::new("Plot updated 2020 unemployment data", plot_2020::<W>),
    ];
    if config.export_parquet {
        steps.push(Step::new("Export tables to Parquet", export::<W>));
    }
    steps
}

fn display_opt(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "n/a".into())
}

fn explore<W: Write>(s: &mut Session<W>) -> Result<()> {
    let out = &mut s.out;
    writeln!(out, "{:?}", shape(&s.tesla))?;
    writeln!(
        out,
        "Largest Tesla Web Search: {}",
        display_opt(column_max(&s.tesla, "TSLA_WEB_SEARCH")?)
    )?;
    writeln!(
        out,
        "Smallest Tesla Web Search: {}",
        display_opt(column_min(&s.tesla, "TSLA_WEB_SEARCH")?)
    )?;
    write!(out, "{}", describe(&s.tesla))?;

    writeln!(out, "{:?}", shape(&s.unemployment))?;
    writeln!(
        out,
        "Largest Unemployment Web Search: {}",
        display_opt(column_max(&s.unemployment, "UE_BENEFITS_WEB_SEARCH")?)
    )?;

    writeln!(out, "{:?}", shape(&s.btc_price))?;
    writeln!(out, "{:?}", shape(&s.btc_search))?;
    writeln!(
        out,
        "Largest BTC News Search: {}",
        display_opt(column_max(&s.btc_search, "BTC_NEWS_SEARCH")?)
    )?;
    Ok(())
}

fn check_missing<W: Write>(s: &mut Session<W>) -> Result<()> {
    let tables = [
        ("Tesla", &s.tesla),
        ("U/E", &s.unemployment),
        ("BTC Search", &s.btc_search),
        ("BTC Price", &s.btc_price),
    ];
    for (label, ds) in tables {
        writeln!(s.out, "Missing values for {}?: {}", label, has_missing(ds))?;
        for (column, n) in missing_counts(ds).into_iter().filter(|(_, n)| *n > 0) {
            writeln!(s.out, "  {}: {} missing", column, n)?;
        }
    }
    Ok(())
}

fn clean<W: Write>(s: &mut Session<W>) -> Result<()> {
    let before = s.btc_price.num_rows();
    s.btc_price = drop_missing(&s.btc_price)?;
    writeln!(
        s.out,
        "Dropped {} rows; missing values for BTC Price?: {}",
        before - s.btc_price.num_rows(),
        has_missing(&s.btc_price)
    )?;
    Ok(())
}

fn normalize_checked(ds: &Dataset) -> Result<Dataset> {
    let norm = normalize_dates(ds)?;
    if !is_chronological(&norm)? {
        warn!(dataset = %norm.name, "rows are not in chronological order");
    }
    Ok(norm)
}

fn convert_dates<W: Write>(s: &mut Session<W>) -> Result<()> {
    s.tesla = normalize_checked(&s.tesla)?;
    s.btc_search = normalize_checked(&s.btc_search)?;
    s.unemployment = normalize_checked(&s.unemployment)?;
    s.btc_price = normalize_checked(&s.btc_price)?;
    for ds in [&s.tesla, &s.btc_search, &s.unemployment, &s.btc_price] {
        writeln!(s.out, "{}: {} converted", ds.name, ds.date_column)?;
    }
    Ok(())
}

fn resample_btc<W: Write>(s: &mut Session<W>) -> Result<()> {
    let monthly = resample_monthly_last(&s.btc_price)?;
    let gaps = month_gaps(&monthly)?;
    if !gaps.is_empty() {
        warn!(
            dataset = %monthly.name,
            missing_months = gaps.len(),
            first = %gaps[0],
            "monthly series has gaps"
        );
    }
    writeln!(s.out, "{:?}", shape(&monthly))?;
    s.btc_monthly = Some(monthly);
    Ok(())
}

fn plot_2020<W: Write>(s: &mut Session<W>) -> Result<()> {
    let ue_2020 = load_dataset(DatasetKind::UnemploymentExtended, &s.config.data_dir)?;
    let ue_2020 = normalize_checked(&ue_2020)?;
    let chart = comparisons::unemployment_extended(&ue_2020)?;
    s.render_chart(chart)
}

fn export<W: Write>(s: &mut Session<W>) -> Result<()> {
    let mut tables = vec![&s.tesla, &s.btc_search, &s.btc_price, &s.unemployment];
    if let Some(monthly) = &s.btc_monthly {
        tables.push(monthly);
    }
    for ds in tables {
        let path = write_parquet(ds, &s.config.export_dir)?;
        writeln!(s.out, "Exported {} to {}", ds.name, path.display())?;
    }
    info!(dir = %s.config.export_dir.display(), "export finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::init_test_logging;
    use crate::walkthrough::{run_steps, AutoConfirm};
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn write_fixtures(dir: &Path) -> Result<()> {
        fs::write(
            dir.join(DatasetKind::Tesla.file_name()),
            "MONTH,TSLA_WEB_SEARCH,TSLA_USD_CLOSE\n2010-06-01,3,4.766\n2010-07-01,3,3.988\n2010-08-01,2,3.896\n2010-09-01,2,4.082\n",
        )?;
        fs::write(
            dir.join(DatasetKind::BitcoinSearch.file_name()),
            "MONTH,BTC_NEWS_SEARCH\n2014-09,5\n2014-10,4\n2014-11,4\n",
        )?;
        fs::write(
            dir.join(DatasetKind::BitcoinPrice.file_name()),
            "DATE,CLOSE,VOLUME\n2014-09-17,457.334,21056800\n2014-09-30,386.944,34707300\n2014-10-15,,\n2014-10-31,338.321,12545400\n2014-11-30,378.047,9194440\n",
        )?;
        let mut ue = String::from("MONTH,UE_BENEFITS_WEB_SEARCH,UNRATE\n");
        for i in 0..12 {
            ue.push_str(&format!("2004-{:02},{},{}\n", i + 1, 30 + i, 5.7 - i as f64 / 20.0));
        }
        fs::write(dir.join(DatasetKind::Unemployment.file_name()), &ue)?;
        ue.push_str("2020-04,100,14.7\n");
        fs::write(dir.join(DatasetKind::UnemploymentExtended.file_name()), &ue)?;
        Ok(())
    }

    fn session_in(dir: &Path, export_parquet: bool) -> Result<Session<Vec<u8>>> {
        write_fixtures(dir)?;
        let config = AppConfig {
            data_dir: dir.to_path_buf(),
            output_dir: dir.join("charts"),
            export_dir: dir.join("parquet"),
            export_parquet,
            rolling_window: 3,
            ..AppConfig::default()
        };
        Session::load(config, Vec::new())
    }

    #[test]
    fn full_walkthrough_writes_five_charts() -> Result<()> {
        init_test_logging();
        let dir = tempdir()?;
        let mut session = session_in(dir.path(), false)?;

        let steps = challenge_steps(&session.config);
        assert_eq!(steps.len(), 10);
        assert_eq!(
            steps[8].description,
            "Plot 3-month rolling average of UE search + rate"
        );
        let mut printed: Vec<u8> = Vec::new();
        run_steps(&mut session, steps, &mut AutoConfirm, &mut printed)?;

        assert_eq!(session.charts.len(), 5);
        assert!(session.charts.iter().all(|p| p.exists()));
        assert!(!has_missing(&session.btc_price));
        assert!(session.tesla.dates_normalized());

        let monthly = session.btc_monthly.as_ref().unwrap();
        assert_eq!(monthly.num_rows(), 3);
        assert_eq!(
            monthly.f64_values("CLOSE")?,
            vec![Some(386.944), Some(338.321), Some(378.047)]
        );

        let out = String::from_utf8(session.out)?;
        assert!(out.contains("Largest Tesla Web Search: 3"));
        assert!(out.contains("Smallest Tesla Web Search: 2"));
        assert!(out.contains("Missing values for BTC Price?: true"));
        assert!(out.contains("Missing values for Tesla?: false"));
        assert!(out.contains("Largest BTC News Search: 5"));
        assert!(String::from_utf8(printed)?.contains("Challenge: Resample BTC price monthly"));
        Ok(())
    }

    #[test]
    fn default_rolling_step_reads_six_month() {
        let steps = challenge_steps::<Vec<u8>>(&AppConfig::default());
        assert!(steps
            .iter()
            .any(|s| s.description == "Plot 6-month rolling average of UE search + rate"));
    }

    #[test]
    fn bitcoin_chart_before_resample_fails() -> Result<()> {
        let dir = tempdir()?;
        let mut session = session_in(dir.path(), false)?;
        let steps: Vec<_> = challenge_steps(&session.config)
            .into_iter()
            .filter(|s| s.description == "Plot Bitcoin News Search vs Price")
            .collect();

        let err = run_steps(&mut session, steps, &mut AutoConfirm, &mut std::io::sink())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("resample step has not run"));
        assert!(session.charts.is_empty());
        Ok(())
    }

    #[test]
    fn charts_before_date_conversion_fail() -> Result<()> {
        let dir = tempdir()?;
        let mut session = session_in(dir.path(), false)?;
        let steps: Vec<_> = challenge_steps(&session.config)
            .into_iter()
            .filter(|s| s.description == "Plot Tesla Web Search vs Stock Price")
            .collect();

        assert!(run_steps(&mut session, steps, &mut AutoConfirm, &mut std::io::sink()).is_err());
        Ok(())
    }

    #[test]
    fn export_step_writes_parquet_files() -> Result<()> {
        let dir = tempdir()?;
        let mut session = session_in(dir.path(), true)?;
        let steps = challenge_steps(&session.config);
        assert_eq!(steps.len(), 11);
        run_steps(&mut session, steps, &mut AutoConfirm, &mut std::io::sink())?;

        let written: Vec<_> = fs::read_dir(dir.path().join("parquet"))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|x| x == "parquet"))
            .collect();
        assert_eq!(written.len(), 5);
        Ok(())
    }
}
