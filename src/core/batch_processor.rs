//! Command execution with reference-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which turns parsed
//! commands into engine calls and runs batches of them concurrently.
//!
//! # Design
//!
//! Commands are partitioned by their `ref` column. Different references run as
//! separate tokio tasks; commands sharing a reference keep their file order,
//! so an authorisation is always seen before the captures that follow it.
//!
//! References name transactions. An authorisation binds its reference to the
//! generated transaction id; later commands resolve a bound reference to that
//! id and pass any other reference through as a literal id.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     ├── Arc<LifecycleEngine>               (shared engine)
//!     └── Arc<DashMap<String, TransactionId>> (reference bindings)
//! ```

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::engine::LifecycleEngine;
use crate::types::{Command, CommandResult, Operation, TransactionId};

/// Executes commands against a shared engine
///
/// Cheap to clone; clones share the engine and the reference bindings.
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: Arc<LifecycleEngine>,

    /// Reference label to transaction id, filled by successful authorisations
    references: Arc<DashMap<String, TransactionId>>,
}

impl BatchProcessor {
    pub fn new(engine: Arc<LifecycleEngine>) -> Self {
        Self {
            engine,
            references: Arc::new(DashMap::new()),
        }
    }

    pub fn engine(&self) -> &Arc<LifecycleEngine> {
        &self.engine
    }

    /// Transaction id bound to `reference`, if an authorisation created one
    pub fn bound_id(&self, reference: &str) -> Option<TransactionId> {
        self.references.get(reference).map(|id| *id)
    }

    /// Transaction id text to send to the engine for `reference`
    fn resolve(&self, reference: &str) -> String {
        self.bound_id(reference)
            .map(|id| id.to_string())
            .unwrap_or_else(|| reference.to_string())
    }

    /// Run one command through the engine
    pub async fn execute(&self, command: Command) -> CommandResult {
        let outcome = match command.operation {
            Operation::Authorisation => {
                let outcome = self.engine.authorize(command.authorize_request()).await;
                if let Ok(response) = &outcome {
                    if let Some(id) = response.id {
                        self.references.insert(command.reference.clone(), id);
                    }
                }
                outcome
            }
            Operation::Capture => {
                let id = self.resolve(&command.reference);
                self.engine.capture(command.capture_request(id)).await
            }
            Operation::Refund => {
                let id = self.resolve(&command.reference);
                self.engine.refund(command.refund_request(id)).await
            }
            Operation::Void => {
                let id = self.resolve(&command.reference);
                self.engine.void(command.void_request(id)).await
            }
        };

        CommandResult {
            line: command.line,
            operation: command.operation,
            reference: command.reference,
            outcome,
        }
    }

    /// Group a batch by reference, keeping file order within each group
    pub fn partition_by_reference(&self, batch: Vec<Command>) -> HashMap<String, Vec<Command>> {
        let mut partitions: HashMap<String, Vec<Command>> = HashMap::new();

        for command in batch {
            partitions
                .entry(command.reference.clone())
                .or_default()
                .push(command);
        }

        partitions
    }

    /// Execute the commands of one reference sequentially
    pub async fn process_reference_commands(&self, commands: Vec<Command>) -> Vec<CommandResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            results.push(self.execute(command).await);
        }

        results
    }

    /// Execute a batch, one task per reference
    ///
    /// Results come back in no particular order; each carries its input line.
    ///
    /// # Errors
    ///
    /// Returns `Err(String)` if a reference task panicked or was cancelled;
    /// its commands would otherwise be missing from the results.
    pub async fn process_batch(&self, batch: Vec<Command>) -> Result<Vec<CommandResult>, String> {
        let partitions = self.partition_by_reference(batch);

        let mut tasks = Vec::with_capacity(partitions.len());
        for (_reference, commands) in partitions {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_reference_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            let reference_results = task.await.map_err(|e| {
                tracing::error!(error = %e, "command task failed");
                format!("Command task failed: {}", e)
            })?;
            results.extend(reference_results);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger_store::InMemoryLedgerStore;
    use crate::core::traits::LedgerStore;
    use crate::types::{CardDetails, LifecycleError};
    use rust_decimal::Decimal;

    fn processor() -> (BatchProcessor, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(InMemoryLedgerStore::new());
        let engine = Arc::new(LifecycleEngine::new(store.clone()));
        (BatchProcessor::new(engine), store)
    }

    fn command(line: u64, operation: Operation, reference: &str, amount: Option<i64>) -> Command {
        Command {
            line,
            operation,
            reference: reference.to_string(),
            card: CardDetails {
                number: "4242424242424242".to_string(),
                expiry_date: "12-2099".to_string(),
                cvv: "123".to_string(),
            },
            amount: amount.map(|a| Decimal::new(a, 0)),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn test_partition_by_reference_keeps_order() {
        let (processor, _) = processor();
        let batch = vec![
            command(2, Operation::Authorisation, "a", Some(10)),
            command(3, Operation::Authorisation, "b", Some(10)),
            command(4, Operation::Capture, "a", Some(5)),
            command(5, Operation::Void, "b", None),
        ];

        let partitions = processor.partition_by_reference(batch);

        assert_eq!(partitions.len(), 2);
        let lines: Vec<u64> = partitions["a"].iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![2, 4]);
        let lines: Vec<u64> = partitions["b"].iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![3, 5]);
    }

    #[test]
    fn test_partition_empty_batch() {
        let (processor, _) = processor();
        assert!(processor.partition_by_reference(vec![]).is_empty());
    }

    #[tokio::test]
    async fn test_authorisation_binds_reference() {
        let (processor, store) = processor();

        let result = processor
            .execute(command(2, Operation::Authorisation, "t1", Some(50)))
            .await;

        let id = processor.bound_id("t1").unwrap();
        assert_eq!(result.outcome.unwrap().id, Some(id));
        assert!(store.get_transaction(id).await.is_ok());
    }

    #[tokio::test]
    async fn test_bound_reference_resolves_to_transaction() {
        let (processor, _) = processor();
        processor
            .execute(command(2, Operation::Authorisation, "t1", Some(50)))
            .await;

        let result = processor
            .execute(command(3, Operation::Capture, "t1", Some(20)))
            .await;

        assert_eq!(result.line, 3);
        assert_eq!(result.outcome.unwrap().amount, Decimal::new(30, 0));
    }

    #[tokio::test]
    async fn test_unbound_reference_is_passed_through_as_id() {
        let (processor, _) = processor();

        let result = processor
            .execute(command(2, Operation::Void, "nope", None))
            .await;

        assert!(matches!(
            result.outcome,
            Err(LifecycleError::ValidationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_process_batch_runs_every_command() {
        let (processor, store) = processor();
        let batch = vec![
            command(2, Operation::Authorisation, "a", Some(100)),
            command(3, Operation::Authorisation, "b", Some(50)),
            command(4, Operation::Capture, "a", Some(40)),
            command(5, Operation::Void, "b", None),
        ];

        let mut results = processor.process_batch(batch).await.unwrap();
        results.sort_by_key(|r| r.line);

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.outcome.is_ok()));
        assert_eq!(results[2].outcome.as_ref().unwrap().amount, Decimal::new(60, 0));
        assert_eq!(store.len(), 2);
    }
}
