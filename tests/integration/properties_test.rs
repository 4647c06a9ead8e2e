//! Property-based tests for normalization, spreads and metrics

use chrono::{Duration, NaiveDate};
use pairs_screener::analysis::{difference, mean_and_std_dev, self_normalize};
use pairs_screener::backtest::{max_drawdown, sharpe_ratio, BackTest, BackTestConfig, PairLeg, PairsBackTest, Trade, TradeLedger};
use pairs_screener::data::DateSeries;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

fn series(values: &[f64]) -> DateSeries {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (start + Duration::days(i as i64), *v))
        .collect()
}

fn ledger(pnls: &[i64]) -> TradeLedger {
    let date = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let mut ledger = TradeLedger::new();
    for pnl in pnls {
        ledger.record(Trade {
            entry_date: date,
            exit_date: date,
            entry_prices: BTreeMap::new(),
            exit_prices: BTreeMap::new(),
            profit_loss: Decimal::from(*pnl),
            forced: false,
        });
    }
    ledger
}

proptest! {
    /// The earliest normalized value is always exactly one
    #[test]
    fn normalized_series_starts_at_one(values in prop::collection::vec(0.01f64..1000.0, 1..60)) {
        let normalized = self_normalize(&series(&values)).unwrap();
        let (_, first) = normalized.values().first_key_value().unwrap();
        prop_assert_eq!(*first, 1.0);
        prop_assert_eq!(normalized.len(), values.len());
    }

    /// A series minus itself is zero everywhere, with zero dispersion
    #[test]
    fn self_difference_is_flat(values in prop::collection::vec(-1000.0f64..1000.0, 1..60)) {
        let s = series(&values);
        let spread = difference(&s, &s).unwrap();
        prop_assert!(spread.values().all(|v| *v == 0.0));
        let moments = mean_and_std_dev(&spread).unwrap();
        prop_assert_eq!(moments.mean, 0.0);
        prop_assert_eq!(moments.std_dev, 0.0);
    }

    /// Difference is antisymmetric
    #[test]
    fn difference_is_antisymmetric(
        pairs in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 1..40)
    ) {
        let a = series(&pairs.iter().map(|p| p.0).collect::<Vec<_>>());
        let b = series(&pairs.iter().map(|p| p.1).collect::<Vec<_>>());
        let ab = difference(&a, &b).unwrap();
        let ba = difference(&b, &a).unwrap();
        for (x, y) in ab.values().zip(ba.values()) {
            prop_assert_eq!(*x, -*y);
        }
    }

    /// Drawdown stays in [0, 1] while the balance stays positive
    #[test]
    fn drawdown_is_a_fraction(pnls in prop::collection::vec(-40i64..40, 0..25)) {
        let drawdown = max_drawdown(&ledger(&pnls), Decimal::from(1000));
        prop_assert!((0.0..=1.0).contains(&drawdown));
    }

    /// Sharpe ratio is finite and zero for constant returns
    #[test]
    fn sharpe_is_finite(pnls in prop::collection::vec(-40i64..40, 0..25), constant in -40i64..40) {
        prop_assert!(sharpe_ratio(&ledger(&pnls), Decimal::from(1000)).is_finite());
        prop_assert_eq!(sharpe_ratio(&ledger(&[constant; 2]), Decimal::from(1000)), 0.0);
    }

    /// Trades never overlap and the balance reconciles with the ledger
    #[test]
    fn backtest_ledger_reconciles(
        prices in prop::collection::vec((1.0f64..100.0, 1.0f64..100.0), 2..80),
        entry in 0.05f64..0.5,
    ) {
        let a = series(&prices.iter().map(|p| p.0).collect::<Vec<_>>());
        let b = series(&prices.iter().map(|p| p.1).collect::<Vec<_>>());
        let mut backtest = PairsBackTest::new(
            PairLeg::new("AAA", a.clone(), a),
            PairLeg::new("BBB", b.clone(), b),
            Decimal::from(1000),
        ).unwrap();
        let config = BackTestConfig {
            entry_threshold: entry,
            exit_threshold: entry / 2.0,
            ..Default::default()
        };
        let trades = backtest.run(&config).unwrap().trades().to_vec();

        for trade in &trades {
            prop_assert!(trade.entry_date <= trade.exit_date);
        }
        for window in trades.windows(2) {
            prop_assert!(window[0].exit_date < window[1].entry_date);
        }
        prop_assert!(!backtest.position().is_open());
        prop_assert_eq!(
            backtest.current_balance(),
            Decimal::from(1000) + backtest.ledger().total_profit_loss()
        );
    }
}
