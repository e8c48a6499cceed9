use crate::strategy::{BatchConfig, PipelineOptions};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Run a card transaction command script through the lifecycle engine
#[derive(Parser, Debug)]
#[command(name = "card-lifecycle-engine")]
#[command(about = "Authorise, capture, refund and void card transactions from a CSV script", long_about = None)]
pub struct CliArgs {
    /// Command-script CSV file path
    #[arg(value_name = "INPUT", help = "Path to the command-script CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy to use
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' runs commands in file order, 'async' runs references concurrently"
    )]
    pub strategy: StrategyType,

    /// Number of commands per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of commands per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Reject list CSV (`card_number,operations`)
    #[arg(long = "rejects", value_name = "PATH")]
    pub rejects: Option<PathBuf>,

    /// Where to write the final ledger snapshot
    #[arg(long = "ledger-output", value_name = "PATH")]
    pub ledger_output: Option<PathBuf>,

    /// Log filter, e.g. `info` or `card_lifecycle_engine=debug`; overrides RUST_LOG
    #[arg(long = "log-level", value_name = "FILTER")]
    pub log_level: Option<String>,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Missing values fall back to defaults; zero values are replaced by
    /// defaults with a warning.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }

    pub fn to_pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            rejects: self.rejects.clone(),
            ledger_output: self.ledger_output.clone(),
        }
    }
}
