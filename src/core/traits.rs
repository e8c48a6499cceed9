//! Core traits for ledger persistence and time
//!
//! The engine depends on these abstractions only, so the in-memory ledger can
//! be swapped for any backend offering the same atomicity guarantees, and tests
//! can pin the current time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt::Debug;

use crate::types::{
    Operation, OperationLogEntry, StoreResult, TransactionId, TransactionRecord,
};

/// Persistence port for transaction records, their operation logs and the
/// reject list
///
/// # Atomicity
///
/// Every mutating call applies the record change and its log append together
/// or not at all. Mutations of an existing record are guarded by the record
/// `version` the caller observed when loading it, which gives per-transaction
/// serializability without blocking other transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync + Debug {
    /// Create a record together with its "authorisation" log entry
    ///
    /// Fails with `StoreError::Duplicate` if the id is taken.
    async fn create_transaction(&self, record: TransactionRecord) -> StoreResult<()>;

    /// Load a record
    ///
    /// Cancelled records are returned with `TransactionState::Cancelled`
    /// rather than as not-found.
    async fn get_transaction(&self, id: TransactionId) -> StoreResult<TransactionRecord>;

    /// Set `available_amount` and append a log entry for `operation`
    ///
    /// `amount` is the requested amount recorded in the log. Fails with
    /// `Conflict` if the record version moved past `expected_version`, and
    /// with `Cancelled` if the record has been voided.
    async fn update_available_amount(
        &self,
        id: TransactionId,
        expected_version: u64,
        new_available: Decimal,
        operation: Operation,
        amount: Decimal,
    ) -> StoreResult<TransactionRecord>;

    /// Mark the record cancelled and append a "void" log entry
    ///
    /// Same version and cancellation checks as `update_available_amount`.
    async fn set_cancelled(
        &self,
        id: TransactionId,
        expected_version: u64,
    ) -> StoreResult<TransactionRecord>;

    /// Whether an entry for `operation` has ever been logged for the record
    async fn has_logged_operation(
        &self,
        id: TransactionId,
        operation: Operation,
    ) -> StoreResult<bool>;

    /// Whether the card is blacklisted for `operation`
    async fn is_card_rejected(&self, operation: Operation, card_reference: &str)
        -> StoreResult<bool>;

    /// Full operation log of a record, oldest first
    async fn operation_log(&self, id: TransactionId) -> StoreResult<Vec<OperationLogEntry>>;

    /// Snapshot of every record
    async fn all_transactions(&self) -> StoreResult<Vec<TransactionRecord>>;

    /// Physically remove a record and its log
    ///
    /// Administrative cleanup only; none of the lifecycle operations call it.
    async fn purge_transaction(&self, id: TransactionId) -> StoreResult<()>;
}

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
