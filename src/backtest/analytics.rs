//! Backtest analytics and reporting

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::TradeLedger;

/// Summary statistics of one backtest run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    /// Sum of trade P&L
    pub total_profit_loss: Decimal,
    /// (final - initial) / initial
    pub cumulative_return: f64,
    /// Mean over population std-dev of per-trade returns, not annualized
    pub sharpe_ratio: f64,
    /// Largest fall from a running peak, as a fraction of the peak
    pub max_drawdown: f64,
    pub trade_count: usize,
}

impl PerformanceMetrics {
    pub fn from_ledger(ledger: &TradeLedger, initial_balance: Decimal, final_balance: Decimal) -> Self {
        Self {
            initial_balance,
            final_balance,
            total_profit_loss: ledger.total_profit_loss(),
            cumulative_return: cumulative_return(initial_balance, final_balance),
            sharpe_ratio: sharpe_ratio(ledger, initial_balance),
            max_drawdown: max_drawdown(ledger, initial_balance),
            trade_count: ledger.len(),
        }
    }

    /// Cumulative return in percent
    pub fn rate_of_return_pct(&self) -> f64 {
        self.cumulative_return * 100.0
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        format!(
            r#"
PERFORMANCE
───────────────────────────────────────────────────────
Initial Balance:  {:.2}
Final Balance:    {:.2}
Net P&L:          {:+.2} ({:+.2}%)
Sharpe Ratio:     {:.4}
Max Drawdown:     {:.2}%
Total Trades:     {}
"#,
            self.initial_balance,
            self.final_balance,
            self.total_profit_loss,
            self.rate_of_return_pct(),
            self.sharpe_ratio,
            self.max_drawdown * 100.0,
            self.trade_count,
        )
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// (final - initial) / initial; 0 for a zero initial balance
pub fn cumulative_return(initial_balance: Decimal, final_balance: Decimal) -> f64 {
    if initial_balance.is_zero() {
        return 0.0;
    }
    to_f64((final_balance - initial_balance) / initial_balance)
}

/// Per-trade Sharpe ratio; 0 for an empty ledger or zero dispersion
pub fn sharpe_ratio(ledger: &TradeLedger, initial_balance: Decimal) -> f64 {
    if ledger.is_empty() || initial_balance.is_zero() {
        return 0.0;
    }
    // Decimal keeps identical returns exactly identical
    let returns: Vec<Decimal> = ledger.iter().map(|t| t.profit_loss / initial_balance).collect();

    let n = Decimal::from(returns.len());
    let mean = returns.iter().sum::<Decimal>() / n;
    let variance = returns
        .iter()
        .map(|r| {
            let deviation = *r - mean;
            deviation * deviation
        })
        .sum::<Decimal>()
        / n;

    if variance.is_zero() {
        0.0
    } else {
        to_f64(mean) / to_f64(variance).sqrt()
    }
}

/// Maximum drawdown from replaying trade P&L on the initial balance
pub fn max_drawdown(ledger: &TradeLedger, initial_balance: Decimal) -> f64 {
    let mut peak = initial_balance;
    let mut running = initial_balance;
    let mut worst = Decimal::ZERO;

    for trade in ledger {
        running += trade.profit_loss;
        if running > peak {
            peak = running;
        }
        if peak > Decimal::ZERO {
            let drawdown = (peak - running) / peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }
    to_f64(worst)
}
