//! Configuration types for pairs-screener

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backtest::BackTestConfig;
use crate::data::PriceField;
use crate::selection::{SelectionConfig, UnitRootConfig};
use crate::telemetry::LogFormat;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub selection: SelectionSection,
    #[serde(default)]
    pub backtest: BackTestSection,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Input files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// One symbol per line
    pub listings_file: PathBuf,
    /// Directory holding `<SYMBOL><file_extension>` price files
    pub stock_data_dir: PathBuf,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default = "default_benchmark_symbol")]
    pub benchmark_symbol: String,
    #[serde(default)]
    pub price_field: PriceField,
}

fn default_file_extension() -> String {
    ".txt".to_string()
}
fn default_benchmark_symbol() -> String {
    "SPY".to_string()
}

/// Pair selection window and screening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionSection {
    #[serde(default = "default_selection_start")]
    pub start_date: NaiveDate,
    #[serde(default = "default_selection_end")]
    pub end_date: NaiveDate,
    #[serde(default = "default_price_volume_threshold")]
    pub price_volume_threshold: f64,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub unit_root: UnitRootConfig,
}

fn default_selection_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 11, 1).unwrap_or_default()
}
fn default_selection_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 1).unwrap_or_default()
}
fn default_price_volume_threshold() -> f64 {
    500_000.0
}

impl Default for SelectionSection {
    fn default() -> Self {
        Self {
            start_date: default_selection_start(),
            end_date: default_selection_end(),
            price_volume_threshold: default_price_volume_threshold(),
            parallel: false,
            unit_root: UnitRootConfig::default(),
        }
    }
}

/// Backtest window and trading rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackTestSection {
    #[serde(default = "default_backtest_start")]
    pub start_date: NaiveDate,
    #[serde(default = "default_backtest_end")]
    pub end_date: NaiveDate,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Decimal,
    #[serde(default = "default_trade_amount")]
    pub trade_amount: Decimal,
    /// Entry threshold in units of the pair's selection std-dev
    #[serde(default = "default_entry_std_multiplier")]
    pub entry_std_multiplier: f64,
    /// Exit threshold in units of the pair's selection std-dev
    #[serde(default = "default_exit_std_multiplier")]
    pub exit_std_multiplier: f64,
    #[serde(default)]
    pub slippage: Decimal,
}

fn default_backtest_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 11, 2).unwrap_or_default()
}
fn default_backtest_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap_or_default()
}
fn default_initial_balance() -> Decimal {
    Decimal::new(1000, 0)
}
fn default_trade_amount() -> Decimal {
    Decimal::new(100, 0)
}
fn default_entry_std_multiplier() -> f64 {
    2.0
}
fn default_exit_std_multiplier() -> f64 {
    1.5
}

impl Default for BackTestSection {
    fn default() -> Self {
        Self {
            start_date: default_backtest_start(),
            end_date: default_backtest_end(),
            initial_balance: default_initial_balance(),
            trade_amount: default_trade_amount(),
            entry_std_multiplier: default_entry_std_multiplier(),
            exit_std_multiplier: default_exit_std_multiplier(),
            slippage: Decimal::ZERO,
        }
    }
}

impl BackTestSection {
    /// Rule parameters for a pair whose selection spread had `std_dev`
    pub fn rule_for(&self, std_dev: f64) -> BackTestConfig {
        BackTestConfig {
            entry_threshold: self.entry_std_multiplier * std_dev,
            exit_threshold: self.exit_std_multiplier * std_dev,
            trade_amount: self.trade_amount,
            slippage: self.slippage,
        }
    }
}

/// Result files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_pairs_file")]
    pub pairs_file: String,
    #[serde(default = "default_trades_file")]
    pub trades_file: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_pairs_file() -> String {
    "Pairs_Backtesting_Results.txt".to_string()
}
fn default_trades_file() -> String {
    "Pairs_Backtesting_Results_Trades.txt".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            pairs_file: default_pairs_file(),
            trades_file: default_trades_file(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus scrape port; no exporter when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Selection parameters assembled from `[data]` and `[selection]`
    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            start: self.selection.start_date,
            end: self.selection.end_date,
            price_field: self.data.price_field,
            price_volume_threshold: self.selection.price_volume_threshold,
            unit_root: self.selection.unit_root,
            parallel: self.selection.parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Trend;
    use rust_decimal_macros::dec;

    #[test]
    fn test_config_deserialize() {
        let toml = r#"
            [data]
            listings_file = "./data/listings.txt"
            stock_data_dir = "./data/stocks/"
            price_field = "close"

            [selection]
            start_date = "2021-01-04"
            end_date = "2021-12-31"
            price_volume_threshold = 1000000.0
            parallel = true

            [selection.unit_root]
            lags = 5
            trend = "c"

            [backtest]
            initial_balance = 5000
            trade_amount = 250.0
            entry_std_multiplier = 2.5

            [output]
            dir = "./results"

            [telemetry]
            log_level = "debug"
            log_format = "json"
            metrics_port = 9090
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.data.price_field, PriceField::Close);
        assert_eq!(config.data.benchmark_symbol, "SPY");
        assert_eq!(config.selection.unit_root.lags, 5);
        assert_eq!(config.selection.unit_root.trend, Trend::Constant);
        assert!(config.selection.parallel);
        assert_eq!(config.backtest.initial_balance, dec!(5000));
        assert_eq!(config.backtest.trade_amount, dec!(250));
        assert_eq!(config.backtest.exit_std_multiplier, 1.5);
        assert_eq!(config.output.pairs_file, "Pairs_Backtesting_Results.txt");
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.telemetry.metrics_port, Some(9090));
    }

    #[test]
    fn test_only_data_section_required() {
        let toml = r#"
            [data]
            listings_file = "listings.txt"
            stock_data_dir = "stocks"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.data.file_extension, ".txt");
        assert_eq!(config.data.price_field, PriceField::AdjClose);
        assert_eq!(
            config.selection.start_date,
            NaiveDate::from_ymd_opt(2022, 11, 1).unwrap()
        );
        assert_eq!(
            config.backtest.end_date,
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
        assert_eq!(config.selection.unit_root.trend, Trend::ConstantTrend);
        assert!(config.telemetry.metrics_port.is_none());
    }

    #[test]
    fn test_missing_data_section_fails() {
        let result: Result<Config, _> = toml::from_str("[output]\ndir = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_rule_scales_with_std_dev() {
        let rule = BackTestSection::default().rule_for(0.2);
        assert!((rule.entry_threshold - 0.4).abs() < 1e-12);
        assert!((rule.exit_threshold - 0.3).abs() < 1e-12);
        assert_eq!(rule.trade_amount, dec!(100));
    }

    #[test]
    fn test_selection_config_mapping() {
        let toml = r#"
            [data]
            listings_file = "l.txt"
            stock_data_dir = "s"
            price_field = "open"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        let selection = config.selection_config();
        assert_eq!(selection.price_field, PriceField::Open);
        assert_eq!(selection.price_volume_threshold, 500_000.0);
        assert_eq!(selection.end, NaiveDate::from_ymd_opt(2023, 11, 1).unwrap());
    }

    #[test]
    fn test_bundled_example_parses() {
        let config: Config = toml::from_str(include_str!("../config.toml.example")).unwrap();
        assert_eq!(config.data.benchmark_symbol, "SPY");
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }
}
