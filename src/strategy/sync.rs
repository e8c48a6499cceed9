//! Sequential processing strategy
//!
//! This module provides a single-threaded implementation of the
//! ProcessingStrategy trait. Commands run one after another in file order on a
//! current-thread tokio runtime.
//!
//! # Design
//!
//! The SyncProcessingStrategy focuses on orchestration, delegating:
//! - CSV parsing to `SyncReader` (iterator interface)
//! - Command execution to `BatchProcessor::execute` (engine calls)
//! - CSV output to `csv_format` (format handling)
//!
//! Input is streamed row by row; only the results are kept in memory.

use crate::io::sync_reader::SyncReader;
use crate::strategy::{build_processor, finish, report, PipelineOptions, ProcessingStrategy};
use std::io::Write;
use std::path::Path;

/// Runs every command in file order on one thread
#[derive(Debug, Clone, Default)]
pub struct SyncProcessingStrategy {
    options: PipelineOptions,
}

impl SyncProcessingStrategy {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let (processor, store) = build_processor(&self.options)?;
        let reader = SyncReader::new(input_path)?;

        runtime.block_on(async {
            let mut results = Vec::new();

            for row in reader {
                match row {
                    Ok(command) => {
                        let result = processor.execute(command).await;
                        report(&result);
                        results.push(result);
                    }
                    Err(e) => tracing::warn!(error = %e, "skipping malformed row"),
                }
            }

            finish(&store, &results, output, &self.options).await
        })
    }
}
