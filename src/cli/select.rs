//! Select command implementation

use clap::Args;
use serde_json::json;

use super::OutputFormat;
use crate::config::Config;
use crate::pipeline::Pipeline;

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Score candidates in parallel, overrides `[selection] parallel`
    #[arg(long)]
    pub parallel: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl SelectArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        config.selection.parallel |= self.parallel;
        let pipeline = Pipeline::from_config(config);
        let symbols = pipeline.listings();
        tracing::info!(symbols = symbols.len(), "Selecting pairs");

        let run = pipeline.select(&symbols).await?;
        let outcome = &run.outcome;

        match self.format {
            OutputFormat::Json => {
                let pairs: Vec<_> = outcome.pairs.values().collect();
                let body = json!({ "report": outcome.report, "pairs": pairs });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Table => {
                println!(
                    "{:<16} {:>10} {:>10} {:>10} {:>10} {:>10}",
                    "PAIR", "MEAN", "STD DEV", "P-VALUE", "ADF AIC", "KPSS S"
                );
                for stats in outcome.pairs.values() {
                    println!(
                        "{:<16} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                        stats.pair.to_string(),
                        stats.mean,
                        stats.std_dev,
                        stats.p_value,
                        stats.unit_root.adf_aic,
                        stats.unit_root.kpss_short,
                    );
                }
                println!(
                    "\n{} pairs from {} eligible of {} symbols ({} unpaired) in {:?}",
                    outcome.report.pairs,
                    outcome.report.eligible,
                    outcome.report.universe,
                    outcome.report.unpaired.len(),
                    outcome.report.elapsed,
                );
            }
        }
        Ok(())
    }
}
