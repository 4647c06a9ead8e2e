//! Daily price history types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use super::IngestError;

/// Date-keyed values in ascending date order
pub type DateSeries = BTreeMap<NaiveDate, f64>;

/// One trading day of price data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl PriceBar {
    /// Value of a single column
    pub fn get(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
            PriceField::AdjClose => self.adj_close,
            PriceField::Volume => self.volume,
        }
    }
}

/// Price bar column used to build a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PriceField {
    #[serde(rename = "open")]
    Open,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "close")]
    Close,
    #[default]
    #[serde(rename = "adj close")]
    AdjClose,
    #[serde(rename = "volume")]
    Volume,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::AdjClose => "adj close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceField {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(PriceField::Open),
            "high" => Ok(PriceField::High),
            "low" => Ok(PriceField::Low),
            "close" => Ok(PriceField::Close),
            "adj close" | "adj_close" | "adjclose" => Ok(PriceField::AdjClose),
            "volume" => Ok(PriceField::Volume),
            other => Err(IngestError::UnknownPriceField(other.to_string())),
        }
    }
}

/// Full daily history of one symbol
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StockHistory {
    symbol: String,
    bars: BTreeMap<NaiveDate, PriceBar>,
}

impl StockHistory {
    /// Create an empty history
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: BTreeMap::new(),
        }
    }

    /// Build a history from dated bars; a repeated date keeps the last bar
    pub fn from_bars(
        symbol: impl Into<String>,
        bars: impl IntoIterator<Item = (NaiveDate, PriceBar)>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            bars: bars.into_iter().collect(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Insert or replace the bar for a date
    pub fn insert(&mut self, date: NaiveDate, bar: PriceBar) {
        self.bars.insert(date, bar);
    }

    pub fn bar(&self, date: NaiveDate) -> Option<&PriceBar> {
        self.bars.get(&date)
    }

    pub fn bars(&self) -> &BTreeMap<NaiveDate, PriceBar> {
        &self.bars
    }

    /// Bars whose date falls inside `start..=end`
    pub fn bars_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = (&NaiveDate, &PriceBar)> {
        let range: Option<RangeInclusive<NaiveDate>> = (start <= end).then(|| start..=end);
        range
            .into_iter()
            .flat_map(move |r| self.bars.range(r))
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Extract one column over the whole history
    pub fn series(&self, field: PriceField) -> PriceSeries {
        PriceSeries::from_values(
            self.symbol.clone(),
            self.bars.iter().map(|(date, bar)| (*date, bar.get(field))),
        )
    }

    /// Extract one column between two dates, both inclusive
    pub fn series_in_range(&self, field: PriceField, start: NaiveDate, end: NaiveDate) -> PriceSeries {
        PriceSeries::from_values(
            self.symbol.clone(),
            self.bars_in_range(start, end)
                .map(|(date, bar)| (*date, bar.get(field))),
        )
    }
}

/// Single price column of one symbol, one value per date
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PriceSeries {
    symbol: String,
    values: DateSeries,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            values: DateSeries::new(),
        }
    }

    pub fn from_values(
        symbol: impl Into<String>,
        values: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            values: values.into_iter().collect(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn insert(&mut self, date: NaiveDate, value: f64) {
        self.values.insert(date, value);
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }

    pub fn values(&self) -> &DateSeries {
        &self.values
    }

    /// Earliest date and its value
    pub fn earliest(&self) -> Option<(NaiveDate, f64)> {
        self.values.first_key_value().map(|(d, v)| (*d, *v))
    }

    /// Latest date and its value
    pub fn latest(&self) -> Option<(NaiveDate, f64)> {
        self.values.last_key_value().map(|(d, v)| (*d, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> DateSeries {
        self.values
    }
}
