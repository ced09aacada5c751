use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::a1::{self, A1Error};

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com";

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Sheets API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid range: {0}")]
    Range(#[from] A1Error),

    #[error("Invalid Sheets API base URL '{0}'")]
    BaseUrl(String),

    #[error("Failed to read workbook: {0}")]
    Workbook(String),
}

/// One cell of a write payload. `Empty` serializes to `null`, which the
/// Sheets API treats as "leave this cell as it is".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::Text).unwrap_or(CellValue::Empty)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map(CellValue::Number).unwrap_or(CellValue::Empty)
    }
}

/// Reads a whole column of a worksheet, header row included
#[allow(async_fn_in_trait)]
pub trait ColumnSource {
    async fn read_column(&self, column: &str) -> Result<Vec<String>, SheetError>;
}

/// Accepts bulk writes of a 2-D values payload into an A1 range
#[allow(async_fn_in_trait)]
pub trait RangeSink {
    async fn write_range(&self, range: &str, values: &[Vec<CellValue>]) -> Result<(), SheetError>;
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeUpdate<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a [Vec<CellValue>],
}

/// Minimal Google Sheets v4 client over reqwest, bound to one worksheet
#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    access_token: String,
}

impl GoogleSheetsClient {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self::with_base_url(DEFAULT_SHEETS_URL, spreadsheet_id, sheet_name, access_token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            access_token: access_token.into(),
        }
    }

    /// Values endpoint for a sheet-qualified range. The range is pushed as a
    /// single path segment so characters like `#`, `?` and `/` in the sheet
    /// name are percent-encoded.
    fn values_url(&self, range: &str) -> Result<Url, SheetError> {
        let invalid = || SheetError::BaseUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        let qualified = a1::sheet_range(&self.sheet_name, range);

        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                qualified.as_str(),
            ]);
        Ok(url)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SheetError::Status { status, body })
        }
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl ColumnSource for GoogleSheetsClient {
    #[instrument(skip(self), fields(sheet = %self.sheet_name))]
    async fn read_column(&self, column: &str) -> Result<Vec<String>, SheetError> {
        let column = a1::parse_column(column)?;
        let url = self.values_url(&format!("{column}:{column}"))?;

        debug!("Reading column {}", column);
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&[("majorDimension", "COLUMNS")])
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let range: ValueRange = response.json().await?;
        let values: Vec<String> = range
            .values
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(cell_to_string)
            .collect();

        debug!("Read {} cells from column {}", values.len(), column);
        Ok(values)
    }
}

impl RangeSink for GoogleSheetsClient {
    #[instrument(skip(self, values), fields(sheet = %self.sheet_name, rows = values.len()))]
    async fn write_range(&self, range: &str, values: &[Vec<CellValue>]) -> Result<(), SheetError> {
        let full_range = a1::sheet_range(&self.sheet_name, range);
        let body = ValueRangeUpdate {
            range: &full_range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .client
            .put(self.values_url(range)?)
            .bearer_auth(&self.access_token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;
        Self::check_status(response).await?;

        debug!("Updated range {}", full_range);
        Ok(())
    }
}

/// Sink that prints what would be written and touches nothing
#[derive(Debug, Default, Clone)]
pub struct DryRunSink;

impl RangeSink for DryRunSink {
    async fn write_range(&self, range: &str, values: &[Vec<CellValue>]) -> Result<(), SheetError> {
        info!("Dry run: would write {} rows to {}", values.len(), range);
        for row in values {
            let rendered: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    CellValue::Text(s) => s.clone(),
                    CellValue::Number(n) => n.to_string(),
                    CellValue::Empty => "-".to_string(),
                })
                .collect();
            println!("  {range}: {}", rendered.join(", "));
        }
        Ok(())
    }
}
