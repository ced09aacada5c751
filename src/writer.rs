use thiserror::Error;
use tracing::{info, instrument};

use crate::a1;
use crate::extractor::ExtractedFields;
use crate::sheets::{CellValue, RangeSink, SheetError};

/// Row 1 holds the headers
pub const HEADER_ROW: usize = 1;
pub const DEFAULT_START_ROW: usize = 2;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Start row {0} would overwrite the header row")]
    HeaderRow(usize),

    #[error(transparent)]
    Sheet(#[from] SheetError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputField {
    County,
    StreetAddress,
    City,
    Latitude,
    Longitude,
    ZipCode,
}

impl OutputField {
    pub fn cell(&self, fields: &ExtractedFields) -> CellValue {
        match self {
            OutputField::County => fields.county.clone().into(),
            OutputField::StreetAddress => fields.street_address.clone().into(),
            OutputField::City => fields.city.clone().into(),
            OutputField::Latitude => fields.latitude.into(),
            OutputField::Longitude => fields.longitude.into(),
            OutputField::ZipCode => fields.zip_code.clone().into(),
        }
    }
}

/// Output column for each field, in write order.
/// Columns B, C and F belong to other data and are never written.
pub const COLUMN_LAYOUT: [(OutputField, &str); 6] = [
    (OutputField::County, "A"),
    (OutputField::City, "E"),
    (OutputField::Latitude, "G"),
    (OutputField::Longitude, "H"),
    (OutputField::ZipCode, "I"),
    (OutputField::StreetAddress, "D"),
];

/// Write each field as one bulk range update covering
/// `start_row ..= start_row + rows.len() - 1`. Returns the ranges written.
#[instrument(skip(sink, rows), fields(rows = rows.len()))]
pub async fn write_rows<S: RangeSink>(
    sink: &S,
    start_row: usize,
    rows: &[ExtractedFields],
) -> Result<Vec<String>, WriteError> {
    if start_row <= HEADER_ROW {
        return Err(WriteError::HeaderRow(start_row));
    }
    if rows.is_empty() {
        info!("No rows to write");
        return Ok(Vec::new());
    }

    let last_row = start_row + rows.len() - 1;
    let mut written = Vec::with_capacity(COLUMN_LAYOUT.len());

    for (field, column) in COLUMN_LAYOUT {
        let range = a1::column_range(column, start_row, last_row);
        let values: Vec<Vec<CellValue>> = rows.iter().map(|row| vec![field.cell(row)]).collect();

        sink.write_range(&range, &values).await?;
        info!("Wrote {:?} to {}", field, range);
        written.push(range);
    }

    Ok(written)
}
