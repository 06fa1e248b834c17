use crate::process::{date_parser, Dataset};
use anyhow::{anyhow, bail, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Date32Builder, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use std::{fmt, sync::Arc};
use tracing::debug;

/// Convert the dataset's date column from text to `Date32`.
///
/// Missing cells stay missing; text that is not a date is an error. A column
/// that is already `Date32` is returned as is, so normalizing twice is the
/// same as normalizing once.
pub fn normalize_dates(ds: &Dataset) -> Result<Dataset> {
    let schema = ds.batch.schema();
    let idx = schema
        .index_of(&ds.date_column)
        .with_context(|| format!("{}: no date column {}", ds.name, ds.date_column))?;

    let col = ds.batch.column(idx);
    match col.data_type() {
        DataType::Date32 => {
            debug!(dataset = %ds.name, "dates already normalized");
            return Ok(ds.clone());
        }
        DataType::Utf8 => {}
        other => bail!(
            "{}: date column {} has unsupported type {:?}",
            ds.name,
            ds.date_column,
            other
        ),
    }

    let text = col
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("{}: date column is not a StringArray", ds.name))?;

    let mut b = Date32Builder::with_capacity(text.len());
    for (row, cell) in text.iter().enumerate() {
        match cell {
            None => b.append_null(),
            Some(s) => {
                let d = date_parser::parse_date(s).ok_or_else(|| {
                    anyhow!(
                        "{}: cannot parse {:?} in column {} (row {}) as a date",
                        ds.name,
                        s,
                        ds.date_column,
                        row
                    )
                })?;
                b.append_value(date_parser::to_epoch_days(d));
            }
        }
    }

    let mut columns: Vec<ArrayRef> = ds.batch.columns().to_vec();
    columns[idx] = Arc::new(b.finish());

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| {
            if i == idx {
                Field::new(f.name(), DataType::Date32, true)
            } else {
                f.as_ref().clone()
            }
        })
        .collect();

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .with_context(|| format!("rebuilding {} with Date32 dates", ds.name))?;
    Ok(ds.with_batch(batch))
}

/// True if the (normalized) date column never decreases. Missing dates are
/// ignored.
pub fn is_chronological(ds: &Dataset) -> Result<bool> {
    let dates: Vec<_> = ds.dates()?.into_iter().flatten().collect();
    Ok(dates.windows(2).all(|w| w[0] <= w[1]))
}

/// Earliest and latest date of a normalized table; `None` when no row has a
/// date.
pub fn date_span(ds: &Dataset) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let dates: Vec<NaiveDate> = ds.dates()?.into_iter().flatten().collect();
    Ok(dates.iter().min().copied().zip(dates.iter().max().copied()))
}

/// Date range and ordering of a normalized table.
#[derive(Debug, Clone, PartialEq)]
pub struct DateCoverage {
    pub span: Option<(NaiveDate, NaiveDate)>,
    pub chronological: bool,
}

pub fn date_coverage(ds: &Dataset) -> Result<DateCoverage> {
    Ok(DateCoverage {
        span: date_span(ds)?,
        chronological: is_chronological(ds)?,
    })
}

impl fmt::Display for DateCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some((first, last)) => writeln!(f, "dates: {} → {}", first, last)?,
            None => writeln!(f, "dates: none")?,
        }
        writeln!(f, "chronological: {}", self.chronological)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::test_support::dataset_from_csv;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_strings_become_dates() -> Result<()> {
        let ds = dataset_from_csv("MONTH,BTC_NEWS_SEARCH\n2014-09,5\n2014-10,4\n", "MONTH")?;
        let norm = normalize_dates(&ds)?;

        assert!(norm.dates_normalized());
        assert_eq!(norm.dates()?, vec![Some(ymd(2014, 9, 1)), Some(ymd(2014, 10, 1))]);
        // other columns untouched
        assert_eq!(norm.f64_values("BTC_NEWS_SEARCH")?, vec![Some(5.0), Some(4.0)]);
        Ok(())
    }

    #[test]
    fn normalizing_twice_is_a_no_op() -> Result<()> {
        let ds = dataset_from_csv("DATE,CLOSE\n2017-01-01,1\n2017-01-02,2\n", "DATE")?;
        let once = normalize_dates(&ds)?;
        let twice = normalize_dates(&once)?;
        assert_eq!(once.batch, twice.batch);
        Ok(())
    }

    #[test]
    fn unparseable_date_is_an_error() -> Result<()> {
        let ds = dataset_from_csv("DATE,CLOSE\n2017-01-01,1\nyesterday,2\n", "DATE")?;
        let err = normalize_dates(&ds).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
        Ok(())
    }

    #[test]
    fn missing_dates_stay_missing() -> Result<()> {
        let ds = dataset_from_csv("DATE,CLOSE\n,1\n2017-01-02,2\n", "DATE")?;
        let norm = normalize_dates(&ds)?;
        assert_eq!(norm.dates()?, vec![None, Some(ymd(2017, 1, 2))]);
        Ok(())
    }

    #[test]
    fn chronological_order_check() -> Result<()> {
        let sorted = normalize_dates(&dataset_from_csv(
            "DATE,CLOSE\n2017-01-01,1\n2017-01-01,2\n2017-01-03,3\n",
            "DATE",
        )?)?;
        assert!(is_chronological(&sorted)?);

        let unsorted = normalize_dates(&dataset_from_csv(
            "DATE,CLOSE\n2017-01-03,1\n2017-01-01,2\n",
            "DATE",
        )?)?;
        assert!(!is_chronological(&unsorted)?);
        Ok(())
    }

    #[test]
    fn coverage_reports_span_and_order() -> Result<()> {
        let ds = normalize_dates(&dataset_from_csv(
            "DATE,CLOSE\n2017-01-03,1\n2017-01-01,2\n,3\n2017-02-10,4\n",
            "DATE",
        )?)?;
        let coverage = date_coverage(&ds)?;
        assert_eq!(coverage.span, Some((ymd(2017, 1, 1), ymd(2017, 2, 10))));
        assert!(!coverage.chronological);
        assert_eq!(
            coverage.to_string(),
            "dates: 2017-01-01 → 2017-02-10\nchronological: false\n"
        );
        Ok(())
    }

    #[test]
    fn coverage_of_undated_table() -> Result<()> {
        let ds = normalize_dates(&dataset_from_csv("DATE,CLOSE\n,1\n", "DATE")?)?;
        let coverage = date_coverage(&ds)?;
        assert_eq!(coverage.span, None);
        assert!(coverage.to_string().starts_with("dates: none"));
        Ok(())
    }
}
