//! Concurrent batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Commands are read in batches and each batch is
//! partitioned by reference for parallel execution.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── BatchProcessor (reference partitioning + tokio tasks)
//!         └── LifecycleEngine
//!             └── InMemoryLedgerStore (DashMap, per-transaction locking)
//! ```
//!
//! # Ordering
//!
//! - Batches run one after another, so a reference spanning two batches keeps
//!   its file order
//! - Within a batch, every reference runs as its own task on the multi-threaded
//!   runtime; commands of one reference run sequentially

use crate::io::async_reader::AsyncReader;
use crate::strategy::{build_processor, finish, report, PipelineOptions, ProcessingStrategy};
use std::io::Write;
use std::path::Path;

/// Configuration for batch processing
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Commands read per batch
    pub batch_size: usize,

    /// Worker threads of the runtime
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a configuration, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Runs batches of commands with per-reference parallelism
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
    options: PipelineOptions,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig, options: PipelineOptions) -> Self {
        Self { config, options }
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        runtime.block_on(async {
            let (processor, store) = build_processor(&self.options)?;

            let file = tokio::fs::File::open(input_path)
                .await
                .map_err(|e| format!("Failed to open file '{}': {}", input_path.display(), e))?;

            // csv-async reads futures::io, not tokio::io
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut results = Vec::new();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let batch_results = processor.process_batch(batch).await?;
                batch_results.iter().for_each(report);
                results.extend(batch_results);
            }

            tracing::info!(commands = results.len(), "command script processed");
            finish(&store, &results, output, &self.options).await
        })
    }
}
