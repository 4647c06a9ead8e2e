//! Price file and listings parsing
//!
//! Price files hold one bar per line: `date,open,high,low,close,adj close,volume`.
//! Lines that fail to parse are logged and skipped.

use chrono::NaiveDate;
use std::io::Read;
use std::path::Path;

use super::{IngestError, PriceBar, StockHistory};

const FIELDS_PER_RECORD: usize = 7;

/// Result of parsing one price file
#[derive(Debug)]
pub struct ParsedPrices {
    /// Bars that parsed successfully
    pub history: StockHistory,
    /// Lines that were skipped
    pub malformed: Vec<IngestError>,
}

/// Parse price records for `symbol` from any reader
pub fn parse_price_records<R: Read>(symbol: &str, reader: R) -> ParsedPrices {
    let mut history = StockHistory::new(symbol);
    let mut malformed = Vec::new();

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    for (index, record) in csv_reader.records().enumerate() {
        let line = index as u64 + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(line);
                malformed.push(skip(symbol, line, e.to_string()));
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(line);

        match parse_record(&record) {
            Some((date, bar)) => history.insert(date, bar),
            None => {
                let content = record.iter().collect::<Vec<_>>().join(",");
                malformed.push(skip(symbol, line, content));
            }
        }
    }

    ParsedPrices { history, malformed }
}

fn skip(symbol: &str, line: u64, content: String) -> IngestError {
    tracing::warn!(symbol, line, content = %content, "Skipping malformed price record");
    IngestError::MalformedRecord { line, content }
}

fn parse_record(record: &csv::StringRecord) -> Option<(NaiveDate, PriceBar)> {
    if record.len() < FIELDS_PER_RECORD {
        return None;
    }

    let date = NaiveDate::parse_from_str(record.get(0)?.trim(), "%Y-%m-%d").ok()?;
    let number = |i: usize| record.get(i)?.trim().parse::<f64>().ok();

    let bar = PriceBar {
        open: number(1)?,
        high: number(2)?,
        low: number(3)?,
        close: number(4)?,
        adj_close: number(5)?,
        volume: number(6)?,
    };
    Some((date, bar))
}

/// Parse a listings file body: one symbol per line, order preserved
pub fn parse_listings(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read the ordered symbol listings
pub fn read_listings(path: impl AsRef<Path>) -> Result<Vec<String>, IngestError> {
    let path = path.as_ref();
    let content =
        std::fs::read_to_string(path).map_err(|source| IngestError::IngestionFailure {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parse_listings(&content))
}
