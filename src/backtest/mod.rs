//! Backtesting module
//!
//! Simulates a mean-reversion rule on a selected pair and derives
//! performance metrics from the resulting trade ledger.

mod analytics;
mod ledger;
mod simulator;

pub use analytics::{cumulative_return, max_drawdown, sharpe_ratio, PerformanceMetrics};
pub use ledger::{LegEntry, OpenPosition, Position, Trade, TradeLedger};
pub use simulator::{BackTestError, PairLeg, PairsBackTest};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Per-run trading rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackTestConfig {
    /// Open when |spread| exceeds this
    pub entry_threshold: f64,
    /// Close when |spread| falls below this
    pub exit_threshold: f64,
    /// Notional per leg
    pub trade_amount: Decimal,
    /// Carried for reporting, not applied to P&L
    pub slippage: Decimal,
}

impl Default for BackTestConfig {
    fn default() -> Self {
        Self {
            entry_threshold: 2.0,
            exit_threshold: 1.0,
            trade_amount: dec!(100),
            slippage: dec!(0),
        }
    }
}

/// Capability shared by backtest strategies
pub trait BackTest {
    /// Simulate from a clean state and return the ledger
    fn run(&mut self, config: &BackTestConfig) -> Result<&TradeLedger, BackTestError>;

    fn ledger(&self) -> &TradeLedger;

    fn initial_balance(&self) -> Decimal;

    fn current_balance(&self) -> Decimal;

    fn performance(&self) -> PerformanceMetrics;
}

/// Available strategies
#[derive(Debug, Clone)]
pub enum Strategy {
    PairsTrading(PairsBackTest),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::PairsTrading(_) => "pairs-trading",
        }
    }
}

impl From<PairsBackTest> for Strategy {
    fn from(backtest: PairsBackTest) -> Self {
        Strategy::PairsTrading(backtest)
    }
}

impl BackTest for Strategy {
    fn run(&mut self, config: &BackTestConfig) -> Result<&TradeLedger, BackTestError> {
        match self {
            Strategy::PairsTrading(inner) => inner.run(config),
        }
    }

    fn ledger(&self) -> &TradeLedger {
        match self {
            Strategy::PairsTrading(inner) => inner.ledger(),
        }
    }

    fn initial_balance(&self) -> Decimal {
        match self {
            Strategy::PairsTrading(inner) => inner.initial_balance(),
        }
    }

    fn current_balance(&self) -> Decimal {
        match self {
            Strategy::PairsTrading(inner) => inner.current_balance(),
        }
    }

    fn performance(&self) -> PerformanceMetrics {
        match self {
            Strategy::PairsTrading(inner) => inner.performance(),
        }
    }
}
