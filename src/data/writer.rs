//! Result persistence
//!
//! The summary file gets one row per backtested pair. The trades file is
//! shared across pairs and across runs: it is appended to, with a header
//! only when it is first created.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::PersistError;
use crate::backtest::{PerformanceMetrics, TradeLedger};
use crate::selection::{PairId, PairStatistics};

/// Summary file columns
pub const SUMMARY_HEADER: [&str; 16] = [
    "Pair",
    "Mean",
    "Standard Deviation",
    "P-value",
    "ADF P-value AIC",
    "ADF P-value BIC",
    "PP Short Rho",
    "PP Long Rho",
    "PP Short Tau",
    "PP Long Tau",
    "KPSS Short",
    "KPSS Long",
    "Rate Return",
    "Trade Count",
    "Max Drawdown",
    "Sharpe Ratio",
];

/// One summary line: selection statistics joined with backtest results
#[derive(Debug, Clone, Copy)]
pub struct SummaryRow<'a> {
    pub statistics: &'a PairStatistics,
    pub metrics: &'a PerformanceMetrics,
}

impl<'a> SummaryRow<'a> {
    pub fn new(statistics: &'a PairStatistics, metrics: &'a PerformanceMetrics) -> Self {
        Self {
            statistics,
            metrics,
        }
    }

    fn record(&self) -> Vec<String> {
        let stats = self.statistics;
        let mut fields = Vec::with_capacity(SUMMARY_HEADER.len());
        fields.push(stats.pair.to_string());
        fields.push(stats.mean.to_string());
        fields.push(stats.std_dev.to_string());
        fields.push(stats.p_value.to_string());
        fields.extend(stats.unit_root.as_array().iter().map(|p| p.to_string()));
        fields.push(self.metrics.rate_of_return_pct().to_string());
        fields.push(self.metrics.trade_count.to_string());
        fields.push(self.metrics.max_drawdown.to_string());
        fields.push(self.metrics.sharpe_ratio.to_string());
        fields
    }
}

/// Writes the per-pair summary file
///
/// The file is truncated on creation and flushed after every row, so a
/// run that dies halfway still leaves the completed pairs on disk.
pub struct SummaryWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

impl SummaryWriter {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;
        let mut writer = csv::Writer::from_writer(file);
        writer
            .write_record(SUMMARY_HEADER)
            .map_err(|source| csv_error(&path, source))?;
        writer.flush().map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    pub fn append(&mut self, row: SummaryRow<'_>) -> Result<(), PersistError> {
        self.writer
            .write_record(row.record())
            .map_err(|source| csv_error(&self.path, source))?;
        self.writer.flush().map_err(|source| PersistError::Io {
            path: self.path.clone(),
            source,
        })?;
        self.rows += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written, excluding the header
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// Writes result files under one output directory
#[derive(Debug, Clone)]
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if it is missing
    pub fn ensure_dir(&self) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| PersistError::Io {
            path: self.output_dir.clone(),
            source,
        })
    }

    pub fn summary(&self, file_name: &str) -> Result<SummaryWriter, PersistError> {
        SummaryWriter::create(self.output_dir.join(file_name))
    }

    /// Append one pair's trade block to `file_name`
    ///
    /// Block layout: the pair id on its own line, one row per trade, then
    /// a blank line. Price columns follow the sorted symbol order, so the
    /// header written on creation matches every later block.
    pub fn append_trades(
        &self,
        file_name: &str,
        pair: &PairId,
        ledger: &TradeLedger,
    ) -> Result<PathBuf, PersistError> {
        let path = self.output_dir.join(file_name);
        let exists = path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| PersistError::Io {
                path: path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(file);
        let mut symbols = [pair.base.as_str(), pair.candidate.as_str()];
        symbols.sort_unstable();

        if !exists {
            writer
                .write_record(trades_header(&symbols))
                .map_err(|source| csv_error(&path, source))?;
        }
        writer
            .write_record([pair.to_string()])
            .map_err(|source| csv_error(&path, source))?;

        for trade in ledger {
            let mut record = vec![trade.entry_date.to_string(), trade.exit_date.to_string()];
            for prices in [&trade.entry_prices, &trade.exit_prices] {
                record.extend(symbols.iter().map(|symbol| {
                    prices
                        .get(*symbol)
                        .map(|p| p.to_string())
                        .unwrap_or_default()
                }));
            }
            record.push(trade.profit_loss.to_string());
            writer
                .write_record(&record)
                .map_err(|source| csv_error(&path, source))?;
        }

        let io_err = |source: std::io::Error| PersistError::Io {
            path: path.clone(),
            source,
        };
        let mut file = writer
            .into_inner()
            .map_err(|e| io_err(e.into_error()))?;
        file.write_all(b"\n").map_err(io_err)?;
        file.flush().map_err(io_err)?;

        Ok(path)
    }
}

fn trades_header(symbols: &[&str; 2]) -> Vec<String> {
    let mut header = vec!["EntryDate".to_string(), "ExitDate".to_string()];
    header.extend(symbols.iter().map(|s| format!("{s} Entry Price")));
    header.extend(symbols.iter().map(|s| format!("{s} Exit Price")));
    header.push("ProfitLoss".to_string());
    header
}

fn csv_error(path: &Path, source: csv::Error) -> PersistError {
    PersistError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::Trade;
    use crate::selection::UnitRootPValues;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn statistics(base: &str, candidate: &str) -> PairStatistics {
        PairStatistics {
            pair: PairId::new(base, candidate),
            mean: 0.5,
            std_dev: 0.25,
            p_value: 0.0455,
            unit_root: UnitRootPValues::failed(),
        }
    }

    fn ledger(a: &str, b: &str) -> TradeLedger {
        let entry = NaiveDate::from_ymd_opt(2023, 11, 6).unwrap();
        let exit = NaiveDate::from_ymd_opt(2023, 11, 9).unwrap();
        let mut ledger = TradeLedger::new();
        ledger.record(Trade {
            entry_date: entry,
            exit_date: exit,
            entry_prices: BTreeMap::from([(a.to_string(), 10.0), (b.to_string(), 20.0)]),
            exit_prices: BTreeMap::from([(a.to_string(), 11.0), (b.to_string(), 19.5)]),
            profit_loss: dec!(12.5),
            forced: false,
        });
        ledger
    }

    #[test]
    fn test_summary_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());
        let mut summary = writer.summary("summary.csv").unwrap();

        let stats = statistics("AAA", "BBB");
        let metrics = PerformanceMetrics {
            cumulative_return: 0.5,
            trade_count: 1,
            ..Default::default()
        };
        summary.append(SummaryRow::new(&stats, &metrics)).unwrap();
        assert_eq!(summary.rows(), 1);

        let content = std::fs::read_to_string(summary.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], SUMMARY_HEADER.join(","));
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[0], "AAA-BBB");
        assert_eq!(fields[4], "-1");
        assert_eq!(fields[12], "50");
        assert_eq!(fields[13], "1");
    }

    #[test]
    fn test_summary_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary.csv");
        std::fs::write(&path, "stale\nstale\n").unwrap();

        SummaryWriter::create(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_trades_header_written_once() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());

        writer
            .append_trades("trades.csv", &PairId::new("BBB", "AAA"), &ledger("BBB", "AAA"))
            .unwrap();
        let path = writer
            .append_trades("trades.csv", &PairId::new("CCC", "DDD"), &TradeLedger::new())
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "EntryDate,ExitDate,AAA Entry Price,BBB Entry Price,AAA Exit Price,BBB Exit Price,ProfitLoss",
                "BBB-AAA",
                "2023-11-06,2023-11-09,20,10,19.5,11,12.5",
                "",
                "CCC-DDD",
                "",
            ]
        );
    }

    #[test]
    fn test_trade_blocks_separated_by_blank_line() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());
        let pair = PairId::new("AAA", "BBB");

        writer
            .append_trades("trades.csv", &pair, &ledger("AAA", "BBB"))
            .unwrap();
        let path = writer
            .append_trades("trades.csv", &pair, &ledger("AAA", "BBB"))
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let blocks: Vec<&str> = content.split("\n\n").collect();
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].ends_with("2023-11-06,2023-11-09,10,20,11,19.5,12.5"));
        assert_eq!(blocks[1], "AAA-BBB\n2023-11-06,2023-11-09,10,20,11,19.5,12.5");
        assert_eq!(blocks[2], "");
    }

    #[test]
    fn test_empty_ledger_still_gets_header() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path());
        let path = writer
            .append_trades("trades.csv", &PairId::new("XYZ", "ABC"), &TradeLedger::new())
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("EntryDate,ExitDate,ABC Entry Price,XYZ Entry Price"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path().join("out").join("run"));
        writer.ensure_dir().unwrap();
        assert!(writer.output_dir().is_dir());
    }
}
