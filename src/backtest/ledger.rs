//! Trades and the open-position state

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A completed round trip on both legs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    /// Entry price per symbol
    pub entry_prices: BTreeMap<String, f64>,
    /// Exit price per symbol
    pub exit_prices: BTreeMap<String, f64>,
    pub profit_loss: Decimal,
    /// Closed at the end of the window rather than by the exit rule
    #[serde(default)]
    pub forced: bool,
}

/// Append-only, chronological list of trades
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn total_profit_loss(&self) -> Decimal {
        self.trades.iter().map(|t| t.profit_loss).sum()
    }

    pub(crate) fn clear(&mut self) {
        self.trades.clear();
    }
}

impl<'a> IntoIterator for &'a TradeLedger {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}

/// Prices of one leg at entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegEntry {
    pub price: f64,
    /// Reference-normalized price, decides long vs short
    pub normalized: f64,
}

/// Open pair position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPosition {
    pub entry_date: NaiveDate,
    pub leg_a: LegEntry,
    pub leg_b: LegEntry,
}

impl OpenPosition {
    /// Leg A looked rich at entry, so it is the short side
    pub fn short_a(&self) -> bool {
        self.leg_a.normalized > self.leg_b.normalized
    }
}

/// Simulator state
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl Position {
    pub fn is_open(&self) -> bool {
        matches!(self, Position::Open(_))
    }
}
