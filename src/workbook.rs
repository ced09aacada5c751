use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::{debug, info, instrument};

use crate::a1;
use crate::sheets::{ColumnSource, SheetError};

/// Read-only column source backed by a local `.xlsx` export
#[derive(Debug, Clone)]
pub struct XlsxWorkbook {
    path: PathBuf,
    sheet_name: String,
}

impl XlsxWorkbook {
    pub fn new(path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// Synchronous read; callers on the runtime go through `read_column`
    pub fn read_column_blocking(&self, column_index: usize) -> Result<Vec<String>, SheetError> {
        let mut workbook: Xlsx<BufReader<File>> =
            open_workbook(&self.path).map_err(|e: calamine::XlsxError| SheetError::Workbook(e.to_string()))?;

        let range = workbook
            .worksheet_range(&self.sheet_name)
            .map_err(|e| SheetError::Workbook(format!("sheet '{}': {e}", self.sheet_name)))?;

        Ok(column_values(&range, column_index))
    }
}

/// Render the cells of one column (1-based index) as text, from the first
/// sheet row down to the last non-empty cell
pub fn column_values(range: &Range<Data>, column_index: usize) -> Vec<String> {
    let Some((_, end_col)) = range.end() else {
        return Vec::new();
    };
    let Some(col) = column_index.checked_sub(1).map(|c| c as u32) else {
        return Vec::new();
    };
    if col > end_col {
        return Vec::new();
    }

    let last_row = range.end().map(|(row, _)| row).unwrap_or_default();
    let mut values: Vec<String> = (0..=last_row)
        .map(|row| match range.get_value((row, col)) {
            Some(Data::Empty) | None => String::new(),
            Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
            Some(cell) => cell.to_string(),
        })
        .collect();

    while values.last().is_some_and(|v| v.is_empty()) {
        values.pop();
    }
    values
}

impl ColumnSource for XlsxWorkbook {
    #[instrument(skip(self), fields(path = %self.path.display(), sheet = %self.sheet_name))]
    async fn read_column(&self, column: &str) -> Result<Vec<String>, SheetError> {
        let index = a1::column_index(column)?;
        let workbook = self.clone();

        debug!("Reading column {} from local workbook", column);
        let values = tokio::task::spawn_blocking(move || workbook.read_column_blocking(index))
            .await
            .map_err(|e| SheetError::Workbook(e.to_string()))??;

        info!("Read {} cells from {}", values.len(), self.path.display());
        Ok(values)
    }
}
