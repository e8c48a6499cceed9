//! Thread-safe in-memory ledger
//!
//! This module provides the `InMemoryLedgerStore` struct, which keeps every
//! transaction record together with its operation log, plus the reject list.
//!
//! # Design
//!
//! Records and their logs live in the same `DashMap` entry, so a record
//! mutation and its log append happen under one shard lock and can never be
//! observed half-applied. Operations on different transaction ids proceed in
//! parallel; operations on the same id are serialized by the entry lock and
//! guarded by the record `version` the caller loaded.
//!
//! # Thread Safety
//!
//! No entry guard is ever held across an `.await`; every method performs its
//! map access synchronously and returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::traits::{Clock, LedgerStore, SystemClock};
use crate::types::{
    Operation, OperationLogEntry, RejectEntry, StoreError, StoreResult, TransactionId,
    TransactionRecord, TransactionState,
};

/// A record and its audit trail, stored under one key
#[derive(Debug, Clone)]
struct LedgerEntry {
    record: TransactionRecord,
    log: Vec<OperationLogEntry>,
}

impl LedgerEntry {
    fn append(&mut self, operation: Operation, amount: Decimal, now: DateTime<Utc>) {
        self.log.push(OperationLogEntry {
            transaction_id: self.record.id,
            operation,
            amount,
            currency: self.record.currency.clone(),
            created_at: now,
        });
    }

    /// Refuse a write based on a stale or cancelled record
    fn check_writable(&self, expected_version: u64) -> StoreResult<()> {
        let record = &self.record;
        if !record.is_live() {
            return Err(StoreError::Cancelled { id: record.id });
        }
        if record.version != expected_version {
            return Err(StoreError::Conflict {
                id: record.id,
                expected_version,
                actual_version: record.version,
            });
        }
        Ok(())
    }
}

/// Thread-safe ledger store backed by `DashMap`
///
/// # Example
///
/// ```
/// use card_lifecycle_engine::core::InMemoryLedgerStore;
/// use card_lifecycle_engine::types::RejectEntry;
///
/// let store = InMemoryLedgerStore::new();
/// store.insert_reject(RejectEntry {
///     card_reference: "4000000000000002".to_string(),
///     operation_scope: "authorisation".to_string(),
/// });
/// assert_eq!(store.reject_count(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    /// Records and logs by transaction id
    entries: DashMap<TransactionId, LedgerEntry>,

    /// Reject entries by card reference
    rejects: DashMap<String, RejectEntry>,

    /// Timestamps for log entries and record updates
    clock: Arc<dyn Clock>,
}

impl InMemoryLedgerStore {
    /// Create an empty store using wall-clock timestamps
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store stamping entries with the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            rejects: DashMap::new(),
            clock,
        }
    }

    /// Add or replace the reject entry of a card
    pub fn insert_reject(&self, entry: RejectEntry) {
        tracing::debug!(
            card = %crate::types::CardDetails::mask(&entry.card_reference),
            scope = %entry.operation_scope,
            "reject entry loaded"
        );
        self.rejects.insert(entry.card_reference.clone(), entry);
    }

    pub fn reject_count(&self) -> usize {
        self.rejects.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_transaction(&self, record: TransactionRecord) -> StoreResult<()> {
        let id = record.id;
        let now = self.clock.now();

        match self.entries.entry(id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate { id }),
            Entry::Vacant(vacant) => {
                let amount = record.authorized_amount;
                let mut entry = LedgerEntry {
                    record,
                    log: Vec::with_capacity(4),
                };
                entry.append(Operation::Authorisation, amount, now);
                vacant.insert(entry);
                tracing::debug!(%id, %amount, "transaction created");
                Ok(())
            }
        }
    }

    async fn get_transaction(&self, id: TransactionId) -> StoreResult<TransactionRecord> {
        self.entries
            .get(&id)
            .map(|entry| entry.record.clone())
            .ok_or(StoreError::NotFound { id })
    }

    async fn update_available_amount(
        &self,
        id: TransactionId,
        expected_version: u64,
        new_available: Decimal,
        operation: Operation,
        amount: Decimal,
    ) -> StoreResult<TransactionRecord> {
        let now = self.clock.now();
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        entry.check_writable(expected_version)?;

        entry.record.available_amount = new_available;
        entry.record.version += 1;
        entry.record.updated_at = now;
        entry.append(operation, amount, now);

        tracing::debug!(%id, %operation, %amount, available = %new_available, "available amount updated");
        Ok(entry.record.clone())
    }

    async fn set_cancelled(
        &self,
        id: TransactionId,
        expected_version: u64,
    ) -> StoreResult<TransactionRecord> {
        let now = self.clock.now();
        let mut entry = self
            .entries
            .get_mut(&id)
            .ok_or(StoreError::NotFound { id })?;

        entry.check_writable(expected_version)?;

        entry.record.state = TransactionState::Cancelled { at: now };
        entry.record.version += 1;
        entry.record.updated_at = now;
        let reversed = entry.record.authorized_amount;
        entry.append(Operation::Void, reversed, now);

        tracing::debug!(%id, "transaction cancelled");
        Ok(entry.record.clone())
    }

    async fn has_logged_operation(
        &self,
        id: TransactionId,
        operation: Operation,
    ) -> StoreResult<bool> {
        Ok(self
            .entries
            .get(&id)
            .map(|entry| entry.log.iter().any(|logged| logged.operation == operation))
            .unwrap_or(false))
    }

    async fn is_card_rejected(
        &self,
        operation: Operation,
        card_reference: &str,
    ) -> StoreResult<bool> {
        Ok(self
            .rejects
            .get(card_reference)
            .map(|entry| entry.blocks(operation))
            .unwrap_or(false))
    }

    async fn operation_log(&self, id: TransactionId) -> StoreResult<Vec<OperationLogEntry>> {
        self.entries
            .get(&id)
            .map(|entry| entry.log.clone())
            .ok_or(StoreError::NotFound { id })
    }

    async fn all_transactions(&self) -> StoreResult<Vec<TransactionRecord>> {
        Ok(self
            .entries
            .iter()
            .map(|entry| entry.value().record.clone())
            .collect())
    }

    async fn purge_transaction(&self, id: TransactionId) -> StoreResult<()> {
        self.entries
            .remove(&id)
            .map(|_| tracing::debug!(%id, "transaction purged"))
            .ok_or(StoreError::NotFound { id })
    }
}
