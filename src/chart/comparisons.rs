//! The five search-interest comparisons drawn by the walkthrough.

use super::{
    Axis, DualAxisChart, LineKind, Series, SeriesStyle, BITCOIN_ORANGE, FRED_PURPLE, SKY_BLUE,
    TESLA_RED,
};
use crate::process::{date_parser, dates::date_span, resample, rolling::rolling_dataset, Dataset};
use anyhow::Result;
use chrono::NaiveDate;
use tracing::warn;

fn series(ds: &Dataset, column: &str, style: SeriesStyle) -> Result<Series> {
    Ok(Series {
        label: column.to_string(),
        points: ds.dated_values(column)?,
        style,
    })
}

fn union_span(
    a: Option<(NaiveDate, NaiveDate)>,
    b: Option<(NaiveDate, NaiveDate)>,
) -> Option<(NaiveDate, NaiveDate)> {
    match (a, b) {
        (Some((a0, a1)), Some((b0, b1))) => Some((a0.min(b0), a1.max(b1))),
        (a, b) => a.or(b),
    }
}

/// Tesla close price (0–600) against Tesla web search interest.
pub fn tesla_search_vs_price(tesla: &Dataset) -> Result<DualAxisChart> {
    Ok(DualAxisChart {
        title: "Tesla Web Search vs Price".into(),
        primary: Axis {
            label: "TSLA Stock Price".into(),
            range: Some((0.0, 600.0)),
            series: series(tesla, "TSLA_USD_CLOSE", SeriesStyle::solid(TESLA_RED))?,
        },
        secondary: Axis {
            label: "Search Trend".into(),
            range: None,
            series: series(tesla, "TSLA_WEB_SEARCH", SeriesStyle::solid(SKY_BLUE))?,
        },
        x_range: date_span(tesla)?,
        grid: false,
    })
}

/// Month-end Bitcoin close (0–15000, dashed) against Bitcoin news search
/// (with markers).
///
/// Search months are moved to their month-end so both series share one x
/// value per month. Each keeps its own rows, so a month missing from one
/// table cannot shift the other; mismatched months are logged.
pub fn bitcoin_search_vs_price(search: &Dataset, monthly_price: &Dataset) -> Result<DualAxisChart> {
    let (only_price, only_search) = resample::month_mismatch(monthly_price, search)?;
    if !only_price.is_empty() || !only_search.is_empty() {
        warn!(
            price_only = only_price.len(),
            search_only = only_search.len(),
            "bitcoin price and search cover different months"
        );
    }

    let mut search_series = series(
        search,
        "BTC_NEWS_SEARCH",
        SeriesStyle::solid(SKY_BLUE).with_markers(),
    )?;
    for (d, _) in search_series.points.iter_mut() {
        *d = date_parser::month_end(*d);
    }
    let search_span = search_series
        .points
        .iter()
        .map(|(d, _)| *d)
        .min()
        .zip(search_series.points.iter().map(|(d, _)| *d).max());

    Ok(DualAxisChart {
        title: "Bitcoin News Search vs Resampled Price".into(),
        primary: Axis {
            label: "BTC Price".into(),
            range: Some((0.0, 15000.0)),
            series: series(
                monthly_price,
                "CLOSE",
                SeriesStyle::solid(BITCOIN_ORANGE).with_line(LineKind::Dashed),
            )?,
        },
        secondary: Axis {
            label: "Search Trend".into(),
            range: None,
            series: search_series,
        },
        x_range: union_span(date_span(monthly_price)?, search_span),
        grid: false,
    })
}

/// Unemployment rate (3–10.5, dashed) against "unemployment benefits"
/// searches, on a grey grid.
pub fn unemployment_search_vs_rate(ue: &Dataset) -> Result<DualAxisChart> {
    Ok(DualAxisChart {
        title: "Monthly Search of \"Unemployment Benefits\" vs U/E Rate".into(),
        primary: Axis {
            label: "FRED U/E Rate".into(),
            range: Some((3.0, 10.5)),
            series: series(
                ue,
                "UNRATE",
                SeriesStyle::solid(FRED_PURPLE).with_line(LineKind::Dashed),
            )?,
        },
        secondary: Axis {
            label: "Search Trend".into(),
            range: None,
            series: series(ue, "UE_BENEFITS_WEB_SEARCH", SeriesStyle::solid(SKY_BLUE))?,
        },
        x_range: date_span(ue)?,
        grid: true,
    })
}

/// Same comparison as [`unemployment_search_vs_rate`] after a trailing
/// `window`-month mean of both series.
pub fn unemployment_rolling(ue: &Dataset, window: usize) -> Result<DualAxisChart> {
    let rolled = rolling_dataset(ue, &["UE_BENEFITS_WEB_SEARCH", "UNRATE"], window)?;

    Ok(DualAxisChart {
        title: "Rolling Monthly \"Unemployment Benefits\" Web Searches vs UNRATE".into(),
        primary: Axis {
            label: "FRED U/E Rate".into(),
            range: Some((3.0, 10.5)),
            series: series(
                &rolled,
                "UNRATE",
                SeriesStyle::solid(FRED_PURPLE).with_line(LineKind::ShortDashed),
            )?,
        },
        secondary: Axis {
            label: "Search Trend".into(),
            range: None,
            series: series(&rolled, "UE_BENEFITS_WEB_SEARCH", SeriesStyle::solid(SKY_BLUE))?,
        },
        x_range: date_span(ue)?,
        grid: false,
    })
}

/// Unemployment comparison over the extended range that includes 2020.
/// Both y ranges follow the data.
pub fn unemployment_extended(ue_2020: &Dataset) -> Result<DualAxisChart> {
    Ok(DualAxisChart {
        title: "Monthly \"Unemployment Benefits\" Web Search vs UNRATE incl. 2020".into(),
        primary: Axis {
            label: "FRED U/E Rate".into(),
            range: None,
            series: series(ue_2020, "UNRATE", SeriesStyle::solid(FRED_PURPLE))?,
        },
        secondary: Axis {
            label: "Search Trend".into(),
            range: None,
            series: series(ue_2020, "UE_BENEFITS_WEB_SEARCH", SeriesStyle::solid(SKY_BLUE))?,
        },
        x_range: date_span(ue_2020)?,
        grid: false,
    })
}
