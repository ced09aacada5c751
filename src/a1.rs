//! A1-notation helpers for column letters and ranges

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum A1Error {
    #[error("Invalid column reference: '{0}'")]
    InvalidColumn(String),
}

/// Validate a column reference like `j` or `AA` and return it upper-cased
pub fn parse_column(value: &str) -> Result<String, A1Error> {
    let trimmed = value.trim();
    let re = Regex::new(r"^[A-Za-z]{1,3}$").map_err(|_| A1Error::InvalidColumn(value.to_string()))?;
    if !re.is_match(trimmed) {
        return Err(A1Error::InvalidColumn(value.to_string()));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Column letters to a 1-based index: `A` -> 1, `J` -> 10, `AA` -> 27
pub fn column_index(column: &str) -> Result<usize, A1Error> {
    let column = parse_column(column)?;
    Ok(column
        .bytes()
        .fold(0, |acc, b| acc * 26 + (b - b'A' + 1) as usize))
}

/// Single-column range, e.g. `column_range("A", 2, 4)` -> `A2:A4`
pub fn column_range(column: &str, first_row: usize, last_row: usize) -> String {
    format!("{column}{first_row}:{column}{last_row}")
}

/// Prefix a range with its sheet name, quoting the name for the Sheets API
pub fn sheet_range(sheet_name: &str, range: &str) -> String {
    format!("'{}'!{}", sheet_name.replace('\'', "''"), range)
}
