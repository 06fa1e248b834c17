use chrono::{Datelike, NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a date cell. Accepts full dates, datetimes (time is dropped) and
/// `YYYY-MM` / `YYYY/MM`, which resolve to the first of the month.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().trim_matches('"');

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // year-month only: "YYYY-MM" or "YYYY/MM"
    let b = s.as_bytes();
    if b.len() == 7 && (b[4] == b'-' || b[4] == b'/') {
        let year: i32 = s.get(0..4)?.parse().ok()?;
        let month: u32 = s.get(5..7)?.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    None
}

/// Last calendar day of the month `d` falls in.
pub fn month_end(d: NaiveDate) -> NaiveDate {
    let (y, m) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(d)
}

/// `(year, month)` key used to group observations by calendar month.
pub fn month_key(d: NaiveDate) -> (i32, u32) {
    (d.year(), d.month())
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Days since 1970-01-01, the Arrow `Date32` representation.
pub fn to_epoch_days(d: NaiveDate) -> i32 {
    (d - epoch()).num_days() as i32
}

pub fn from_epoch_days(days: i32) -> NaiveDate {
    epoch() + chrono::Duration::days(days as i64)
}

/// Fractional year, e.g. 2017-07-02 → ~2017.5. Used as the chart x coordinate.
pub fn decimal_year(d: NaiveDate) -> f64 {
    let days_in_year = if NaiveDate::from_ymd_opt(d.year(), 2, 29).is_some() {
        366.0
    } else {
        365.0
    };
    d.year() as f64 + d.ordinal0() as f64 / days_in_year
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_supported_forms() {
        assert_eq!(parse_date("2017-01-31"), Some(ymd(2017, 1, 31)));
        assert_eq!(parse_date("2017/01/31"), Some(ymd(2017, 1, 31)));
        assert_eq!(parse_date("01/31/2017"), Some(ymd(2017, 1, 31)));
        assert_eq!(parse_date("2014-09"), Some(ymd(2014, 9, 1)));
        assert_eq!(parse_date("\"2014/09\""), Some(ymd(2014, 9, 1)));
        assert_eq!(parse_date("2017-01-31 18:02:37"), Some(ymd(2017, 1, 31)));
        assert_eq!(parse_date("2017-01-31T00:00:00"), Some(ymd(2017, 1, 31)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2017-13"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn month_end_handles_december_and_leap_years() {
        assert_eq!(month_end(ymd(2017, 1, 5)), ymd(2017, 1, 31));
        assert_eq!(month_end(ymd(2016, 2, 1)), ymd(2016, 2, 29));
        assert_eq!(month_end(ymd(2019, 12, 31)), ymd(2019, 12, 31));
    }

    #[test]
    fn epoch_days_match_arrow_convention() {
        assert_eq!(to_epoch_days(ymd(1970, 1, 1)), 0);
        assert_eq!(to_epoch_days(ymd(1970, 1, 2)), 1);
        assert_eq!(from_epoch_days(to_epoch_days(ymd(2020, 3, 15))), ymd(2020, 3, 15));
    }

    #[test]
    fn decimal_year_is_monotonic_within_year() {
        assert_eq!(decimal_year(ymd(2010, 1, 1)), 2010.0);
        assert!(decimal_year(ymd(2010, 7, 1)) > 2010.49);
        assert!(decimal_year(ymd(2010, 12, 31)) < 2011.0);
    }
}
