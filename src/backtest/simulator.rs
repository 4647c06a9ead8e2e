//! Pairs-trading backtest
//!
//! Walks leg A's dates in order. A date leg B lacks is skipped. The spread is
//! the difference of the two legs' reference-normalized prices; a flat book
//! opens when `|spread| > entry` and funds allow, an open book closes when
//! `|spread| < exit`, and anything still open after the last date is closed
//! at that date's prices.
//!
//! Money arithmetic is checked. A price the ledger cannot carry, or a result
//! past `Decimal`'s range, fails the run with a [`BackTestError`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    BackTest, BackTestConfig, LegEntry, OpenPosition, PerformanceMetrics, Position, Trade,
    TradeLedger,
};
use crate::analysis::{reference_normalize, AnalysisError, NormalizedSeries};
use crate::data::DateSeries;
use crate::telemetry::{increment_counter, CounterMetric};

/// Backtest setup and run errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackTestError {
    #[error("cannot normalize {symbol}: {source}")]
    Normalization {
        symbol: String,
        #[source]
        source: AnalysisError,
    },

    #[error("initial balance must be positive, got {0}")]
    InvalidBalance(Decimal),

    #[error("invalid backtest config: {0}")]
    InvalidConfig(String),

    #[error("no price history loaded for {symbol}")]
    MissingHistory { symbol: String },

    #[error("unusable price {price} for {symbol} on {date}")]
    InvalidPrice {
        symbol: String,
        date: NaiveDate,
        price: f64,
    },

    #[error("decimal overflow computing {0}")]
    Overflow(&'static str),
}

/// Decimal places kept on each leg's P&L
const PROFIT_SCALE: u32 = 10;

/// One side of the pair
#[derive(Debug, Clone)]
pub struct PairLeg {
    pub symbol: String,
    /// Prices over the backtest window
    pub prices: DateSeries,
    /// Series whose earliest value normalizes `prices`, usually the selection window
    pub reference: DateSeries,
}

impl PairLeg {
    pub fn new(symbol: impl Into<String>, prices: DateSeries, reference: DateSeries) -> Self {
        Self {
            symbol: symbol.into(),
            prices,
            reference,
        }
    }

    fn normalize(&self) -> Result<NormalizedSeries, BackTestError> {
        reference_normalize(&self.prices, &self.reference).map_err(|source| {
            BackTestError::Normalization {
                symbol: self.symbol.clone(),
                source,
            }
        })
    }
}

/// Prices of both legs on one date
#[derive(Debug, Clone, Copy)]
struct Quote {
    date: NaiveDate,
    price_a: f64,
    price_b: f64,
}

/// Mean-reversion backtest over a single pair
#[derive(Debug, Clone)]
pub struct PairsBackTest {
    leg_a: PairLeg,
    leg_b: PairLeg,
    normalized_a: NormalizedSeries,
    normalized_b: NormalizedSeries,
    initial_balance: Decimal,
    balance: Decimal,
    position: Position,
    ledger: TradeLedger,
}

impl PairsBackTest {
    pub fn new(leg_a: PairLeg, leg_b: PairLeg, initial_balance: Decimal) -> Result<Self, BackTestError> {
        if initial_balance <= Decimal::ZERO {
            return Err(BackTestError::InvalidBalance(initial_balance));
        }
        let normalized_a = leg_a.normalize()?;
        let normalized_b = leg_b.normalize()?;

        Ok(Self {
            leg_a,
            leg_b,
            normalized_a,
            normalized_b,
            initial_balance,
            balance: initial_balance,
            position: Position::Flat,
            ledger: TradeLedger::new(),
        })
    }

    pub fn symbols(&self) -> (&str, &str) {
        (&self.leg_a.symbol, &self.leg_b.symbol)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Spread on a date both legs carry
    pub fn spread(&self, date: NaiveDate) -> Option<f64> {
        Some(self.normalized_a.get(date)? - self.normalized_b.get(date)?)
    }

    fn reset(&mut self) {
        self.balance = self.initial_balance;
        self.position = Position::Flat;
        self.ledger.clear();
    }

    fn validate(config: &BackTestConfig) -> Result<(), BackTestError> {
        if !config.entry_threshold.is_finite() || !config.exit_threshold.is_finite() {
            return Err(BackTestError::InvalidConfig(format!(
                "thresholds must be finite (entry {}, exit {})",
                config.entry_threshold, config.exit_threshold
            )));
        }
        if config.trade_amount <= Decimal::ZERO {
            return Err(BackTestError::InvalidConfig(format!(
                "trade amount must be positive, got {}",
                config.trade_amount
            )));
        }
        Ok(())
    }

    fn open(&mut self, quote: Quote, stake: Decimal) -> Result<(), BackTestError> {
        // spread exists, so both normalized values do
        let (Some(norm_a), Some(norm_b)) = (
            self.normalized_a.get(quote.date),
            self.normalized_b.get(quote.date),
        ) else {
            return Ok(());
        };
        for (symbol, price) in [(&self.leg_a.symbol, quote.price_a), (&self.leg_b.symbol, quote.price_b)] {
            if decimal_price(symbol, quote.date, price)? <= Decimal::ZERO {
                return Err(invalid_price(symbol, quote.date, price));
            }
        }

        self.balance = self
            .balance
            .checked_sub(stake)
            .ok_or(BackTestError::Overflow("balance"))?;
        self.position = Position::Open(OpenPosition {
            entry_date: quote.date,
            leg_a: LegEntry {
                price: quote.price_a,
                normalized: norm_a,
            },
            leg_b: LegEntry {
                price: quote.price_b,
                normalized: norm_b,
            },
        });
        debug!(date = %quote.date, "position opened");
        Ok(())
    }

    fn close(
        &mut self,
        open: OpenPosition,
        quote: Quote,
        config: &BackTestConfig,
        stake: Decimal,
        forced: bool,
    ) -> Result<(), BackTestError> {
        let short_a = open.short_a();
        let (a, b) = (self.leg_a.symbol.clone(), self.leg_b.symbol.clone());
        let profit_a = leg_profit(
            config.trade_amount,
            decimal_price(&a, open.entry_date, open.leg_a.price)?,
            decimal_price(&a, quote.date, quote.price_a)?,
            !short_a,
        )?;
        let profit_b = leg_profit(
            config.trade_amount,
            decimal_price(&b, open.entry_date, open.leg_b.price)?,
            decimal_price(&b, quote.date, quote.price_b)?,
            short_a,
        )?;
        let profit_loss = profit_a
            .checked_add(profit_b)
            .ok_or(BackTestError::Overflow("trade profit"))?;

        self.balance = stake
            .checked_add(profit_loss)
            .and_then(|credit| self.balance.checked_add(credit))
            .ok_or(BackTestError::Overflow("balance"))?;
        self.position = Position::Flat;

        self.ledger.record(Trade {
            entry_date: open.entry_date,
            exit_date: quote.date,
            entry_prices: BTreeMap::from([(a.clone(), open.leg_a.price), (b.clone(), open.leg_b.price)]),
            exit_prices: BTreeMap::from([(a, quote.price_a), (b, quote.price_b)]),
            profit_loss,
            forced,
        });
        increment_counter(CounterMetric::TradesClosed);
        debug!(
            entry = %open.entry_date,
            exit = %quote.date,
            %profit_loss,
            forced,
            "position closed"
        );
        Ok(())
    }
}

fn invalid_price(symbol: &str, date: NaiveDate, price: f64) -> BackTestError {
    warn!(symbol, %date, price, "unusable price");
    BackTestError::InvalidPrice {
        symbol: symbol.to_string(),
        date,
        price,
    }
}

/// A finite price within `Decimal` range
fn decimal_price(symbol: &str, date: NaiveDate, price: f64) -> Result<Decimal, BackTestError> {
    if !price.is_finite() {
        return Err(invalid_price(symbol, date, price));
    }
    Decimal::try_from(price).map_err(|_| invalid_price(symbol, date, price))
}

/// Profit of one leg sized at `amount`; `long` picks the sign
fn leg_profit(amount: Decimal, entry: Decimal, exit: Decimal, long: bool) -> Result<Decimal, BackTestError> {
    let shares = amount
        .checked_div(entry)
        .ok_or(BackTestError::Overflow("leg shares"))?;
    let change = if long {
        exit.checked_sub(entry)
    } else {
        entry.checked_sub(exit)
    }
    .ok_or(BackTestError::Overflow("leg price change"))?;
    shares
        .checked_mul(change)
        .map(|profit| profit.round_dp(PROFIT_SCALE))
        .ok_or(BackTestError::Overflow("leg profit"))
}

impl BackTest for PairsBackTest {
    fn run(&mut self, config: &BackTestConfig) -> Result<&TradeLedger, BackTestError> {
        Self::validate(config)?;
        self.reset();
        let stake = config
            .trade_amount
            .checked_mul(Decimal::TWO)
            .ok_or(BackTestError::Overflow("stake"))?;

        let dates: Vec<(NaiveDate, f64)> = self.leg_a.prices.iter().map(|(d, p)| (*d, *p)).collect();
        let mut last: Option<Quote> = None;

        for (date, price_a) in dates {
            let Some(price_b) = self.leg_b.prices.get(&date).copied() else {
                continue;
            };
            let Some(spread) = self.spread(date) else {
                continue;
            };
            let quote = Quote {
                date,
                price_a,
                price_b,
            };
            last = Some(quote);

            match self.position {
                Position::Flat => {
                    if self.balance >= stake && spread.abs() > config.entry_threshold {
                        self.open(quote, stake)?;
                    }
                }
                Position::Open(open) => {
                    if spread.abs() < config.exit_threshold {
                        self.close(open, quote, config, stake, false)?;
                    }
                }
            }
        }

        if let (Position::Open(open), Some(quote)) = (self.position, last) {
            info!(
                pair = %format!("{}-{}", self.leg_a.symbol, self.leg_b.symbol),
                date = %quote.date,
                "closing open trade at end date"
            );
            self.close(open, quote, config, stake, true)?;
        }

        Ok(&self.ledger)
    }

    fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    fn initial_balance(&self) -> Decimal {
        self.initial_balance
    }

    fn current_balance(&self) -> Decimal {
        self.balance
    }

    fn performance(&self) -> PerformanceMetrics {
        PerformanceMetrics::from_ledger(&self.ledger, self.initial_balance, self.balance)
    }
}
