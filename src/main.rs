use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sheet_geocoder::a1;
use sheet_geocoder::auth::{ServiceAccountKey, SHEETS_SCOPES};
use sheet_geocoder::batch::{run_batch, ConsoleProgress};
use sheet_geocoder::config::{Config, ConfigError};
use sheet_geocoder::geocoder::GeocodingClient;
use sheet_geocoder::sheets::{DryRunSink, GoogleSheetsClient};
use sheet_geocoder::workbook::XlsxWorkbook;
use sheet_geocoder::writer::HEADER_ROW;

#[derive(Parser)]
#[command(name = "sheet-geocoder")]
#[command(about = "Geocode a column of addresses and write county, city, zip and coordinates back to the sheet", long_about = None)]
struct Cli {
    /// Worksheet name (overrides SHEET_NAME)
    #[arg(long)]
    sheet_name: Option<String>,

    /// Column holding the addresses, e.g. "J" (overrides INPUT_COLUMN)
    #[arg(long)]
    input_column: Option<String>,

    /// First row to write results to (overrides START_ROW)
    #[arg(long)]
    start_row: Option<usize>,

    /// Read addresses from a local .xlsx export instead of Google Sheets
    #[arg(long, requires = "dry_run")]
    workbook: Option<PathBuf>,

    /// Print the ranges that would be written instead of writing them
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) -> Result<(), ConfigError> {
        if let Some(sheet_name) = &self.sheet_name {
            config.sheet_name = sheet_name.clone();
        }
        if let Some(column) = &self.input_column {
            config.input_column = a1::parse_column(column)?;
        }
        if let Some(start_row) = self.start_row {
            if start_row <= HEADER_ROW {
                return Err(ConfigError::StartRow(start_row));
            }
            config.start_row = start_row;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config)?;

    info!(
        "Geocoding column {} of sheet '{}', writing from row {}",
        config.input_column, config.sheet_name, config.start_row
    );

    let geocoder = GeocodingClient::with_base_url(
        config.geocoding_api_url.clone(),
        config.geocoding_api_key.clone(),
    );
    let mut progress = ConsoleProgress::new();

    let report = if let Some(path) = &cli.workbook {
        info!("Reading addresses from local workbook {}", path.display());
        let source = XlsxWorkbook::new(path, config.sheet_name.clone());
        run_batch(
            &source,
            &geocoder,
            &DryRunSink,
            &mut progress,
            &config.input_column,
            config.start_row,
        )
        .await?
    } else {
        let key = ServiceAccountKey::from_file(config.service_account_file()?)?;
        let token = key.fetch_access_token(&SHEETS_SCOPES).await?;
        let sheets = GoogleSheetsClient::with_base_url(
            config.sheets_api_url.clone(),
            config.spreadsheet_id()?,
            config.sheet_name.clone(),
            token,
        );

        if cli.dry_run {
            run_batch(
                &sheets,
                &geocoder,
                &DryRunSink,
                &mut progress,
                &config.input_column,
                config.start_row,
            )
            .await?
        } else {
            run_batch(
                &sheets,
                &geocoder,
                &sheets,
                &mut progress,
                &config.input_column,
                config.start_row,
            )
            .await?
        }
    };

    info!(
        "Wrote {} ranges for {} rows",
        report.ranges_written.len(),
        report.rows.len()
    );

    Ok(())
}
