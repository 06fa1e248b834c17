use crate::process::{date_parser, Dataset};
use anyhow::{bail, Context, Result};
use arrow::{
    array::{ArrayRef, Date32Array, UInt32Array},
    compute::take,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use chrono::{Datelike, NaiveDate};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info};

/// Reduce a date-normalized table to one row per calendar month: the last
/// chronological row of that month. The date column of the result holds the
/// month-end date.
///
/// Rows without a date are dropped. Months with no rows produce no output
/// row; see [`month_gaps`] to find them.
pub fn resample_monthly_last(ds: &Dataset) -> Result<Dataset> {
    if !ds.dates_normalized() {
        bail!(
            "{}: cannot resample before dates are normalized (column {})",
            ds.name,
            ds.date_column
        );
    }

    // (date, row) for every dated row; stable sort keeps file order on ties
    let mut dated: Vec<(NaiveDate, usize)> = ds
        .dates()?
        .into_iter()
        .enumerate()
        .filter_map(|(row, d)| d.map(|d| (d, row)))
        .collect();
    dated.sort_by_key(|(d, _)| *d);

    // later rows of a month overwrite earlier ones
    let mut last_in_month: BTreeMap<(i32, u32), (NaiveDate, usize)> = BTreeMap::new();
    for (d, row) in dated {
        last_in_month.insert(date_parser::month_key(d), (d, row));
    }

    let indices = UInt32Array::from(
        last_in_month
            .values()
            .map(|(_, row)| *row as u32)
            .collect::<Vec<u32>>(),
    );
    let month_ends = Date32Array::from(
        last_in_month
            .values()
            .map(|(d, _)| date_parser::to_epoch_days(date_parser::month_end(*d)))
            .collect::<Vec<i32>>(),
    );

    let schema = ds.batch.schema();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(ds.num_columns());
    let mut fields: Vec<Field> = Vec::with_capacity(ds.num_columns());
    for (field, col) in schema.fields().iter().zip(ds.batch.columns()) {
        if field.name() == &ds.date_column {
            columns.push(Arc::new(month_ends.clone()));
            fields.push(Field::new(field.name(), DataType::Date32, false));
        } else {
            let picked = take(col.as_ref(), &indices, None)
                .with_context(|| format!("selecting monthly rows of {}", field.name()))?;
            columns.push(picked);
            fields.push(field.as_ref().clone());
        }
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .with_context(|| format!("building monthly table for {}", ds.name))?;
    info!(
        dataset = %ds.name,
        rows_in = ds.num_rows(),
        months = batch.num_rows(),
        "resampled to month-end"
    );

    Ok(Dataset::new(
        format!("{} (monthly)", ds.name),
        ds.date_column.clone(),
        batch,
    ))
}

/// First day of every calendar month between the earliest and latest date of
/// `ds` that has no observation.
pub fn month_gaps(ds: &Dataset) -> Result<Vec<NaiveDate>> {
    let present: BTreeMap<(i32, u32), ()> = ds
        .dates()?
        .into_iter()
        .flatten()
        .map(|d| (date_parser::month_key(d), ()))
        .collect();

    let (Some(first), Some(last)) = (present.keys().next(), present.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut gaps = Vec::new();
    let (mut y, mut m) = *first;
    while (y, m) < *last {
        if !present.contains_key(&(y, m)) {
            if let Some(d) = NaiveDate::from_ymd_opt(y, m, 1) {
                gaps.push(d);
            }
        }
        if m == 12 {
            y += 1;
            m = 1;
        } else {
            m += 1;
        }
    }
    debug!(dataset = %ds.name, gaps = gaps.len(), "checked month coverage");
    Ok(gaps)
}

/// Months present in `a` but not `b` and vice versa, as `(only_a, only_b)`.
pub fn month_mismatch(a: &Dataset, b: &Dataset) -> Result<(Vec<NaiveDate>, Vec<NaiveDate>)> {
    let months = |ds: &Dataset| -> Result<BTreeMap<(i32, u32), NaiveDate>> {
        Ok(ds
            .dates()?
            .into_iter()
            .flatten()
            .map(|d| (date_parser::month_key(d), d.with_day(1).unwrap_or(d)))
            .collect())
    };
    let ma = months(a)?;
    let mb = months(b)?;

    let only_a = ma
        .iter()
        .filter(|(k, _)| !mb.contains_key(k))
        .map(|(_, d)| *d)
        .collect();
    let only_b = mb
        .iter()
        .filter(|(k, _)| !ma.contains_key(k))
        .map(|(_, d)| *d)
        .collect();
    Ok((only_a, only_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::dates::normalize_dates;
    use crate::process::test_support::{dataset_from_csv, init_test_logging};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn normalized(csv: &str, date_column: &str) -> Result<Dataset> {
        normalize_dates(&dataset_from_csv(csv, date_column)?)
    }

    #[test]
    fn january_collapses_to_last_close() -> Result<()> {
        init_test_logging();
        let mut csv = String::from("DATE,CLOSE,VOLUME\n");
        for day in 1..=31 {
            let close = if day == 31 { 970.4 } else { 900.0 + day as f64 };
            csv.push_str(&format!("2017-01-{:02},{},{}\n", day, close, day * 1000));
        }
        let monthly = resample_monthly_last(&normalized(&csv, "DATE")?)?;

        assert_eq!(monthly.num_rows(), 1);
        assert_eq!(monthly.dates()?, vec![Some(ymd(2017, 1, 31))]);
        assert_eq!(monthly.f64_values("CLOSE")?, vec![Some(970.4)]);
        assert_eq!(monthly.f64_values("VOLUME")?, vec![Some(31000.0)]);
        assert_eq!(monthly.name, "fixture (monthly)");
        Ok(())
    }

    #[test]
    fn picks_chronologically_last_row_even_if_unsorted() -> Result<()> {
        let ds = normalized(
            "DATE,CLOSE\n2017-02-27,10\n2017-01-15,1\n2017-02-03,8\n2017-01-02,2\n",
            "DATE",
        )?;
        let monthly = resample_monthly_last(&ds)?;

        assert_eq!(
            monthly.dates()?,
            vec![Some(ymd(2017, 1, 31)), Some(ymd(2017, 2, 28))]
        );
        assert_eq!(monthly.f64_values("CLOSE")?, vec![Some(1.0), Some(10.0)]);
        Ok(())
    }

    #[test]
    fn missing_months_are_not_filled() -> Result<()> {
        let ds = normalized("DATE,CLOSE\n2017-01-05,1\n2017-04-05,4\n", "DATE")?;
        let monthly = resample_monthly_last(&ds)?;
        assert_eq!(monthly.num_rows(), 2);
        assert_eq!(month_gaps(&ds)?, vec![ymd(2017, 2, 1), ymd(2017, 3, 1)]);
        assert_eq!(month_gaps(&monthly)?.len(), 2);
        Ok(())
    }

    #[test]
    fn gaps_across_year_boundary() -> Result<()> {
        let ds = normalized("DATE,CLOSE\n2016-11-30,1\n2017-02-01,2\n", "DATE")?;
        assert_eq!(month_gaps(&ds)?, vec![ymd(2016, 12, 1), ymd(2017, 1, 1)]);
        Ok(())
    }

    #[test]
    fn resampling_requires_dates() -> Result<()> {
        let ds = dataset_from_csv("DATE,CLOSE\n2017-01-05,1\n", "DATE")?;
        assert!(resample_monthly_last(&ds).is_err());
        Ok(())
    }

    #[test]
    fn month_mismatch_between_tables() -> Result<()> {
        let a = normalized("MONTH,X\n2014-09,1\n2014-10,2\n2014-11,3\n", "MONTH")?;
        let b = normalized("DATE,Y\n2014-10-31,1\n2014-11-30,2\n2014-12-31,3\n", "DATE")?;
        let (only_a, only_b) = month_mismatch(&a, &b)?;
        assert_eq!(only_a, vec![ymd(2014, 9, 1)]);
        assert_eq!(only_b, vec![ymd(2014, 12, 1)]);
        Ok(())
    }
}
