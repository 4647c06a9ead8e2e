//! Price sources
//!
//! Loading is async so a universe of files can be read concurrently;
//! results always come back in the order the symbols were requested.

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;

use super::{parse_price_records, IngestError, StockHistory};

/// Concurrent loads issued by [`load_universe`]
const LOAD_CONCURRENCY: usize = 32;

/// Outcome of loading one symbol
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// Parsed history, empty when loading failed
    pub history: StockHistory,
    /// False when the source could not be read
    pub loaded: bool,
}

impl LoadOutcome {
    pub fn loaded(history: StockHistory) -> Self {
        Self {
            history,
            loaded: true,
        }
    }

    /// A failed load yields an empty history for the symbol
    pub fn failed(symbol: &str) -> Self {
        Self {
            history: StockHistory::new(symbol),
            loaded: false,
        }
    }
}

/// Provides daily price history per symbol
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Load one symbol; never fails, see [`LoadOutcome::loaded`]
    async fn load(&self, symbol: &str) -> LoadOutcome;
}

/// Reads `<dir>/<SYMBOL><extension>` price files
#[derive(Debug, Clone)]
pub struct FilePriceSource {
    dir: PathBuf,
    extension: String,
}

impl FilePriceSource {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// File path for a symbol
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}{}", symbol, self.extension))
    }
}

#[async_trait]
impl PriceSource for FilePriceSource {
    async fn load(&self, symbol: &str) -> LoadOutcome {
        let path = self.path_for(symbol);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let parsed = parse_price_records(symbol, bytes.as_slice());
                tracing::debug!(
                    symbol,
                    bars = parsed.history.len(),
                    skipped = parsed.malformed.len(),
                    "Loaded price file"
                );
                LoadOutcome::loaded(parsed.history)
            }
            Err(source) => {
                let error = IngestError::IngestionFailure { path, source };
                tracing::warn!(symbol, error = %error, "Price source unreadable, treating as empty");
                LoadOutcome::failed(symbol)
            }
        }
    }
}

/// In-memory source, mainly for tests and benchmarks
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    histories: HashMap<String, StockHistory>,
}

impl MemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, history: StockHistory) {
        self.histories
            .insert(history.symbol().to_string(), history);
    }
}

impl FromIterator<StockHistory> for MemoryPriceSource {
    fn from_iter<I: IntoIterator<Item = StockHistory>>(iter: I) -> Self {
        let mut source = Self::new();
        for history in iter {
            source.insert(history);
        }
        source
    }
}

#[async_trait]
impl PriceSource for MemoryPriceSource {
    async fn load(&self, symbol: &str) -> LoadOutcome {
        match self.histories.get(symbol) {
            Some(history) => LoadOutcome::loaded(history.clone()),
            None => LoadOutcome::failed(symbol),
        }
    }
}

/// Load many symbols concurrently, preserving input order
pub async fn load_universe<S>(source: &S, symbols: &[String]) -> Vec<LoadOutcome>
where
    S: PriceSource + ?Sized,
{
    stream::iter(symbols)
        .map(|symbol| source.load(symbol))
        .buffered(LOAD_CONCURRENCY)
        .collect::<Vec<_>>()
        .await
}
