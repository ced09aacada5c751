use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::extractor::{extract_fields, ExtractedFields};
use crate::geocoder::{GeocodeError, Geocoder};
use crate::sheets::{ColumnSource, RangeSink, SheetError};
use crate::writer::{write_rows, WriteError};

/// A progress line is emitted every this many addresses
pub const PROGRESS_INTERVAL: usize = 10;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to read addresses: {0}")]
    Read(#[from] SheetError),

    #[error("Geocoding failed at row {row}: {source}")]
    Geocode {
        row: usize,
        #[source]
        source: GeocodeError,
    },

    #[error("Failed to write results: {0}")]
    Write(#[from] WriteError),
}

/// Receives progress from the geocoding loop
pub trait ProgressReporter {
    fn start(&mut self, total: usize);
    fn advance(&mut self);
    fn checkpoint(&mut self, processed: usize, total: usize);
    fn finish(&mut self, elapsed: Duration);
}

/// True after every tenth address and after the last one
pub fn is_checkpoint(index: usize, total: usize) -> bool {
    (index + 1) % PROGRESS_INTERVAL == 0 || index + 1 == total
}

/// Terminal progress bar. Checkpoint and summary lines go to `out`
/// (stdout by default) whether or not the bar itself is drawn.
pub struct ConsoleProgress<W: Write = io::Stdout> {
    bar: ProgressBar,
    out: W,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleProgress<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            bar: ProgressBar::hidden(),
            out,
        }
    }

    pub fn into_writer(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressReporter for ConsoleProgress<W> {
    fn start(&mut self, total: usize) {
        self.bar = ProgressBar::new(total as u64);
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.set_message("Geocoding...");
    }

    fn advance(&mut self) {
        self.bar.inc(1);
    }

    fn checkpoint(&mut self, processed: usize, total: usize) {
        let out = &mut self.out;
        self.bar.suspend(|| {
            writeln!(out, "Processed {processed}/{total} addresses").ok();
        });
    }

    fn finish(&mut self, elapsed: Duration) {
        self.bar.finish_and_clear();
        writeln!(
            self.out,
            "Run completed in {:.2} seconds.",
            elapsed.as_secs_f64()
        )
        .ok();
    }
}

/// Read the input column and drop the header row
#[instrument(skip(source))]
pub async fn read_addresses<S: ColumnSource>(
    source: &S,
    column: &str,
) -> Result<Vec<String>, SheetError> {
    let values = source.read_column(column).await?;
    let addresses: Vec<String> = values.into_iter().skip(1).collect();
    info!("Loaded {} addresses from column {}", addresses.len(), column);
    Ok(addresses)
}

/// Geocode each address in order, one request at a time. The returned rows
/// line up with `addresses` by index. The first error aborts the loop.
pub async fn geocode_all<G: Geocoder, P: ProgressReporter>(
    geocoder: &G,
    addresses: &[String],
    progress: &mut P,
) -> Result<Vec<ExtractedFields>, BatchError> {
    let total = addresses.len();
    let mut rows = Vec::with_capacity(total);

    for (i, address) in addresses.iter().enumerate() {
        let result = geocoder
            .geocode(address)
            .await
            .map_err(|source| BatchError::Geocode { row: i + 2, source })?;
        let fields = extract_fields(result.as_ref());
        debug!(
            "Row {}: '{}' -> {} {:?}",
            i + 2,
            address,
            result
                .as_ref()
                .and_then(|r| r.formatted_address.as_deref())
                .unwrap_or("no match"),
            fields
        );
        rows.push(fields);

        progress.advance();
        if is_checkpoint(i, total) {
            progress.checkpoint(i + 1, total);
        }
    }

    Ok(rows)
}

#[derive(Debug)]
pub struct BatchReport {
    pub rows: Vec<ExtractedFields>,
    pub ranges_written: Vec<String>,
    pub elapsed: Duration,
}

/// Full run: read addresses, geocode them, write the six output columns
/// starting at `start_row`. Nothing is written unless every lookup succeeds.
pub async fn run_batch<S, G, W, P>(
    source: &S,
    geocoder: &G,
    sink: &W,
    progress: &mut P,
    input_column: &str,
    start_row: usize,
) -> Result<BatchReport, BatchError>
where
    S: ColumnSource,
    G: Geocoder,
    W: RangeSink,
    P: ProgressReporter,
{
    let addresses = read_addresses(source, input_column).await?;

    // Timed from the first lookup; the column read is not included
    let started = Instant::now();
    progress.start(addresses.len());

    let rows = geocode_all(geocoder, &addresses, progress).await?;
    let ranges_written = write_rows(sink, start_row, &rows).await?;

    let elapsed = started.elapsed();
    progress.finish(elapsed);
    info!(
        "Geocoded {} addresses in {:.2}s",
        rows.len(),
        elapsed.as_secs_f64()
    );

    Ok(BatchReport {
        rows,
        ranges_written,
        elapsed,
    })
}
