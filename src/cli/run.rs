//! Run command implementation

use clap::Args;
use std::path::PathBuf;

use super::OutputFormat;
use crate::config::Config;
use crate::data::ResultWriter;
use crate::pipeline::Pipeline;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Output directory for results, overrides `[output] dir`
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let output_dir = self
            .output
            .clone()
            .unwrap_or_else(|| config.output.dir.clone());
        tracing::info!(output = %output_dir.display(), "Running pair selection and backtest");

        let writer = ResultWriter::new(output_dir);
        let pipeline = Pipeline::from_config(config);
        let report = pipeline.run(Some(&writer)).await?;

        match self.format {
            OutputFormat::Table => println!("{}", report.format_table()),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }
}
