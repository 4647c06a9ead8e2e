//! End-to-end integration tests

use chrono::{Duration, NaiveDate};
use pairs_screener::config::Config;
use pairs_screener::data::ResultWriter;
use pairs_screener::pipeline::Pipeline;
use pretty_assertions::assert_eq;
use std::fmt::Write as _;
use std::path::Path;
use tempfile::TempDir;

const DAYS: usize = 120;

fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

/// Write `<dir>/<symbol>.txt` with a header line and one bar per kept day
fn write_prices(dir: &Path, symbol: &str, volume: f64, keep: impl Fn(usize) -> bool, price: impl Fn(usize) -> f64) {
    let mut body = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for i in (0..DAYS).filter(|i| keep(*i)) {
        let date = first_day() + Duration::days(i as i64);
        let p = price(i);
        writeln!(body, "{date},{p},{p},{p},{p},{p},{volume}").unwrap();
    }
    std::fs::write(dir.join(format!("{symbol}.txt")), body).unwrap();
}

fn wave(i: usize) -> f64 {
    1.0 + 0.1 * (i as f64 / 5.0).sin()
}

fn drift(i: usize) -> f64 {
    1.0 + 0.004 * i as f64
}

fn setup(root: &Path) -> Config {
    let stocks = root.join("stocks");
    std::fs::create_dir_all(&stocks).unwrap();

    let all = |_: usize| true;
    write_prices(&stocks, "SPY", 5e7, all, |i| 400.0 + 0.1 * i as f64);
    write_prices(&stocks, "AAA", 1e6, all, |i| 10.0 * wave(i));
    write_prices(&stocks, "BBB", 1e6, all, |i| 30.0 * wave(i) + 0.3 * (i as f64 * 1.7).sin());
    write_prices(&stocks, "CCC", 1e6, all, |i| 50.0 * drift(i));
    write_prices(&stocks, "DDD", 1e6, all, |i| 80.0 * drift(i) + 0.4 * (i as f64 * 1.3).cos());
    write_prices(&stocks, "ILL", 1.0, all, |i| 20.0 * wave(i));
    write_prices(&stocks, "GAP", 1e6, |i| i % 10 != 5, |i| 15.0 * wave(i));

    let listings = root.join("listings.txt");
    std::fs::write(&listings, "AAA\nBBB\nCCC\nDDD\nILL\nGAP\nNOFILE\n").unwrap();

    let toml = format!(
        r#"
        [data]
        listings_file = "{listings}"
        stock_data_dir = "{stocks}"

        [selection]
        start_date = "2023-01-02"
        end_date = "2023-03-02"

        [backtest]
        start_date = "2023-03-03"
        end_date = "2023-05-01"
        entry_std_multiplier = 1.0
        exit_std_multiplier = 0.5
        "#,
        listings = listings.display(),
        stocks = stocks.display(),
    );
    toml::from_str(&toml).unwrap()
}

#[tokio::test]
async fn test_full_run_from_price_files() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let writer = ResultWriter::new(dir.path().join("output"));
    let pipeline = Pipeline::from_config(config);

    let report = pipeline.run(Some(&writer)).await.unwrap();

    let selection = &report.selection;
    assert_eq!(selection.universe, 7);
    assert_eq!(selection.eligible, 4);
    assert_eq!(selection.rejected.get("illiquid"), Some(&1));
    assert_eq!(selection.rejected.get("coverage"), Some(&1));
    assert_eq!(selection.rejected.get("no_data"), Some(&1));
    assert!(selection.unpaired.is_empty());

    let pairs: Vec<String> = report
        .results
        .iter()
        .map(|r| r.statistics.pair.to_string())
        .collect();
    assert_eq!(pairs, vec!["AAA-BBB".to_string(), "CCC-DDD".to_string()]);
    assert!(report.failures.is_empty());
    for result in &report.results {
        assert!(result.metrics.trade_count > 0, "{} never traded", result.statistics.pair);
        assert_eq!(result.metrics.trade_count, result.ledger.len());
        assert!(result.statistics.std_dev < 0.01);
    }

    let summary = std::fs::read_to_string(report.summary_path.as_ref().unwrap()).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Pair,Mean,Standard Deviation,P-value,ADF P-value AIC"));
    assert!(lines[1].starts_with("AAA-BBB,"));
    assert!(lines[2].starts_with("CCC-DDD,"));
    assert_eq!(lines[1].split(',').count(), 16);

    let trades = std::fs::read_to_string(report.trades_path.as_ref().unwrap()).unwrap();
    assert!(trades.starts_with(
        "EntryDate,ExitDate,AAA Entry Price,BBB Entry Price,AAA Exit Price,BBB Exit Price,ProfitLoss\n"
    ));
    assert!(trades.contains("\nAAA-BBB\n"));
    assert!(trades.contains("\nCCC-DDD\n"));
    assert!(trades.ends_with("\n\n"));
}

#[tokio::test]
async fn test_rerun_appends_trades_and_truncates_summary() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let writer = ResultWriter::new(dir.path().join("output"));
    let pipeline = Pipeline::from_config(config);

    let first = pipeline.run(Some(&writer)).await.unwrap();
    let first_trades = std::fs::read_to_string(first.trades_path.as_ref().unwrap()).unwrap();
    let second = pipeline.run(Some(&writer)).await.unwrap();
    assert_ne!(first.run_id, second.run_id);

    let summary = std::fs::read_to_string(second.summary_path.unwrap()).unwrap();
    assert_eq!(summary.lines().count(), 3);

    let trades = std::fs::read_to_string(second.trades_path.unwrap()).unwrap();
    assert_eq!(trades.matches("EntryDate,ExitDate").count(), 1);
    assert_eq!(trades.matches("\nAAA-BBB\n").count(), 2);
    assert!(trades.len() > first_trades.len());
}

#[tokio::test]
async fn test_selection_is_deterministic_in_parallel() {
    let dir = TempDir::new().unwrap();
    let config = setup(dir.path());
    let mut parallel_config = config.clone();
    parallel_config.selection.parallel = true;

    let sequential = Pipeline::from_config(config);
    let parallel = Pipeline::from_config(parallel_config);
    let symbols = sequential.listings();

    let a = sequential.select(&symbols).await.unwrap();
    let b = parallel.select(&symbols).await.unwrap();
    let summary = |run: &pairs_screener::pipeline::SelectionRun| -> Vec<(String, f64, f64)> {
        run.outcome
            .pairs
            .values()
            .map(|s| (s.pair.to_string(), s.mean, s.std_dev))
            .collect()
    };
    assert_eq!(summary(&a), summary(&b));
}

#[test]
fn test_config_example_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.example");
    let config = Config::load(path).unwrap();
    assert_eq!(config.output.trades_file, "Pairs_Backtesting_Results_Trades.txt");
    assert_eq!(config.backtest.entry_std_multiplier, 2.0);
}
