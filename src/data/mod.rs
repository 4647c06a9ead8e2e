//! Market data module
//!
//! Price history types, file ingestion and result persistence

mod reader;
mod series;
mod source;
mod types;
mod writer;

pub use reader::{parse_listings, parse_price_records, read_listings, ParsedPrices};
pub use series::{DateSeries, PriceBar, PriceField, PriceSeries, StockHistory};
pub use source::{load_universe, FilePriceSource, LoadOutcome, MemoryPriceSource, PriceSource};
pub use types::{IngestError, PersistError};
pub use writer::{ResultWriter, SummaryRow, SummaryWriter, SUMMARY_HEADER};
