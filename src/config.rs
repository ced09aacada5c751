use std::env;
use thiserror::Error;

use crate::a1::{self, A1Error};
use crate::geocoder::DEFAULT_GEOCODING_URL;
use crate::sheets::DEFAULT_SHEETS_URL;
use crate::writer::{DEFAULT_START_ROW, HEADER_ROW};

pub const DEFAULT_SHEET_NAME: &str = "Sheet1";
/// Column J, the 10th column, holds the full address
pub const DEFAULT_INPUT_COLUMN: &str = "J";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid INPUT_COLUMN: {0}")]
    InputColumn(#[from] A1Error),

    #[error("START_ROW must be at least 2 (row 1 is the header), got {0}")]
    StartRow(usize),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub geocoding_api_key: String,
    pub geocoding_api_url: String,
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
    pub service_account_file: Option<String>,
    pub sheets_api_url: String,
    pub input_column: String,
    pub start_row: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Config {
            geocoding_api_key: get("GEOCODING_API_KEY").ok_or(ConfigError::Missing("GEOCODING_API_KEY"))?,
            geocoding_api_url: get("GEOCODING_API_URL").unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            spreadsheet_id: get("SPREADSHEET_ID"),
            sheet_name: get("SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string()),
            service_account_file: get("SERVICE_ACCOUNT_FILE"),
            sheets_api_url: get("SHEETS_API_URL").unwrap_or_else(|| DEFAULT_SHEETS_URL.to_string()),
            input_column: a1::parse_column(
                &get("INPUT_COLUMN").unwrap_or_else(|| DEFAULT_INPUT_COLUMN.to_string()),
            )?,
            start_row: get("START_ROW")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_START_ROW),
        };

        if config.start_row <= HEADER_ROW {
            return Err(ConfigError::StartRow(config.start_row));
        }
        Ok(config)
    }

    pub fn spreadsheet_id(&self) -> Result<&str, ConfigError> {
        self.spreadsheet_id
            .as_deref()
            .ok_or(ConfigError::Missing("SPREADSHEET_ID"))
    }

    pub fn service_account_file(&self) -> Result<&str, ConfigError> {
        self.service_account_file
            .as_deref()
            .ok_or(ConfigError::Missing("SERVICE_ACCOUNT_FILE"))
    }
}
