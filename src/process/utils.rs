use arrow::datatypes::DataType;

/// Cell values read as missing, after `clean_str`.
const MISSING_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// 1) Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// 2) True if a raw CSV cell stands for a missing value. Numbers that parse
///    to NaN or infinity ("NAN", "inf", ...) count as missing too.
pub fn is_missing(raw: &str) -> bool {
    let cell = clean_str(raw);
    MISSING_MARKERS.contains(&cell) || parse_raw_number(cell).is_some_and(|v| !v.is_finite())
}

fn parse_raw_number(cell: &str) -> Option<f64> {
    cell.replace(',', "").parse::<f64>().ok()
}

/// 3) Parse a raw cell into a finite number; `None` for missing or
///    non-numeric cells.
pub fn parse_number(raw: &str) -> Option<f64> {
    if is_missing(raw) {
        return None;
    }
    parse_raw_number(clean_str(raw))
}

/// 4) Infer the Arrow dtype of a whole column: Float64 when every present cell
///    is numeric (and at least one is present), Utf8 otherwise.
pub fn infer_column_dtype<'a, I>(cells: I) -> DataType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen_value = false;
    for cell in cells {
        if is_missing(cell) {
            continue;
        }
        if parse_number(cell).is_none() {
            return DataType::Utf8;
        }
        seen_value = true;
    }
    if seen_value {
        DataType::Float64
    } else {
        DataType::Utf8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_strips_quotes_and_whitespace() {
        assert_eq!(clean_str("  \"2017-01-31\" "), "2017-01-31");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(" 42 "), "42");
    }

    #[test]
    fn missing_markers() {
        assert!(is_missing(""));
        assert!(is_missing("  "));
        assert!(is_missing("NaN"));
        assert!(is_missing("\"NA\""));
        assert!(!is_missing("0"));
    }

    #[test]
    fn non_finite_and_pandas_markers_are_missing() {
        for cell in ["NAN", "-nan", "inf", "-Infinity", "#N/A", "<NA>", "None", "n/a", "-NaN"] {
            assert!(is_missing(cell), "{cell} should be missing");
            assert_eq!(parse_number(cell), None);
        }
        assert_eq!(infer_column_dtype(["1.5", "inf", "3"]), DataType::Float64);
    }

    #[test]
    fn numbers_with_thousands_separator() {
        assert_eq!(parse_number("\"1,234.5\""), Some(1234.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("null"), None);
    }

    #[test]
    fn column_dtype_ignores_missing_cells() {
        assert_eq!(infer_column_dtype(["1.5", "", "3"]), DataType::Float64);
        assert_eq!(infer_column_dtype(["1.5", "x"]), DataType::Utf8);
        assert_eq!(infer_column_dtype(["", "NaN"]), DataType::Utf8);
    }
}
