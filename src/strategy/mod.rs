//! Processing strategy module for command scripts
//!
//! This module defines the Strategy pattern for complete processing pipelines,
//! from reading the command script through the lifecycle engine to writing the
//! results. Different implementations (sequential, concurrent batches) can be
//! selected at runtime.

use crate::cli::StrategyType;
use crate::core::{BatchProcessor, InMemoryLedgerStore, LedgerStore, LifecycleEngine};
use crate::io::{load_rejects, write_ledger_csv, write_results_csv};
use crate::types::CommandResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncProcessingStrategy, BatchConfig};
pub use sync::SyncProcessingStrategy;

/// Processing strategy trait for complete command-script pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Run every command of `input_path` and write one result row per command
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the command-script CSV
    /// * `output` - Writer receiving the result CSV
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the whole script was run (individual commands may have failed)
    /// * `Err(String)` if a fatal error occurred (file not found, I/O error, etc.)
    ///
    /// Malformed rows and failed commands are logged and do not stop processing.
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String>;
}

/// Settings shared by every strategy
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOptions {
    /// Reject list to load before the first command
    pub rejects: Option<PathBuf>,

    /// Where to write the final ledger snapshot
    pub ledger_output: Option<PathBuf>,
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional configuration for async batch processing (ignored for sync)
/// * `options` - Reject list and ledger snapshot paths
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
    options: PipelineOptions,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy::new(options)),
        StrategyType::Async => {
            let config = config.unwrap_or_default();
            Box::new(AsyncProcessingStrategy::new(config, options))
        }
    }
}

/// Fresh ledger with the configured reject list, and a processor over it
pub(crate) fn build_processor(
    options: &PipelineOptions,
) -> Result<(BatchProcessor, Arc<InMemoryLedgerStore>), String> {
    let store = Arc::new(InMemoryLedgerStore::new());
    if let Some(path) = &options.rejects {
        load_rejects(path, &store)?;
    }

    let engine = Arc::new(LifecycleEngine::new(store.clone()));
    Ok((BatchProcessor::new(engine), store))
}

/// Log the outcome of one command
pub(crate) fn report(result: &CommandResult) {
    match &result.outcome {
        Ok(_) => {}
        Err(error) if error.is_benign() => tracing::info!(
            line = result.line,
            reference = %result.reference,
            "{}", error
        ),
        Err(error) => tracing::warn!(
            line = result.line,
            reference = %result.reference,
            kind = error.kind(),
            "{}", error
        ),
    }
}

/// Write the result CSV and, if requested, the ledger snapshot
pub(crate) async fn finish(
    store: &InMemoryLedgerStore,
    results: &[CommandResult],
    output: &mut dyn Write,
    options: &PipelineOptions,
) -> Result<(), String> {
    write_results_csv(results, output)?;

    if let Some(path) = &options.ledger_output {
        let records = store
            .all_transactions()
            .await
            .map_err(|e| format!("Failed to read ledger: {}", e))?;
        let mut file = std::fs::File::create(path)
            .map_err(|e| format!("Failed to create ledger output '{}': {}", path.display(), e))?;
        write_ledger_csv(&records, &mut file)?;
    }

    Ok(())
}
