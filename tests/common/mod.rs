//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use card_lifecycle_engine::core::{FixedClock, InMemoryLedgerStore, LedgerStore, LifecycleEngine};
use card_lifecycle_engine::types::{
    AuthorizeRequest, CaptureRequest, CardDetails, Operation, OperationLogEntry, RefundRequest,
    StoreError, StoreResult, TransactionId, TransactionRecord, VoidRequest,
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Store call that `FailingStore` makes fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Create,
    Get,
    Update,
    SetCancelled,
    HasLogged,
    IsRejected,
}

/// In-memory store that fails one kind of call with a backend error, or
/// panics on it
#[derive(Debug)]
pub struct FailingStore {
    inner: InMemoryLedgerStore,
    fail_on: FailPoint,
    panics: bool,
}

impl FailingStore {
    pub fn new(inner: InMemoryLedgerStore, fail_on: FailPoint) -> Self {
        Self {
            inner,
            fail_on,
            panics: false,
        }
    }

    pub fn panicking(inner: InMemoryLedgerStore, fail_on: FailPoint) -> Self {
        Self {
            inner,
            fail_on,
            panics: true,
        }
    }

    fn check(&self, point: FailPoint) -> StoreResult<()> {
        if self.fail_on != point {
            return Ok(());
        }
        if self.panics {
            panic!("injected {:?} panic", point);
        }
        Err(StoreError::backend(format!("injected {:?} failure", point)))
    }
}

#[async_trait]
impl LedgerStore for FailingStore {
    async fn create_transaction(&self, record: TransactionRecord) -> StoreResult<()> {
        self.check(FailPoint::Create)?;
        self.inner.create_transaction(record).await
    }

    async fn get_transaction(&self, id: TransactionId) -> StoreResult<TransactionRecord> {
        self.check(FailPoint::Get)?;
        self.inner.get_transaction(id).await
    }

    async fn update_available_amount(
        &self,
        id: TransactionId,
        expected_version: u64,
        new_available: Decimal,
        operation: Operation,
        amount: Decimal,
    ) -> StoreResult<TransactionRecord> {
        self.check(FailPoint::Update)?;
        self.inner
            .update_available_amount(id, expected_version, new_available, operation, amount)
            .await
    }

    async fn set_cancelled(
        &self,
        id: TransactionId,
        expected_version: u64,
    ) -> StoreResult<TransactionRecord> {
        self.check(FailPoint::SetCancelled)?;
        self.inner.set_cancelled(id, expected_version).await
    }

    async fn has_logged_operation(
        &self,
        id: TransactionId,
        operation: Operation,
    ) -> StoreResult<bool> {
        self.check(FailPoint::HasLogged)?;
        self.inner.has_logged_operation(id, operation).await
    }

    async fn is_card_rejected(
        &self,
        operation: Operation,
        card_reference: &str,
    ) -> StoreResult<bool> {
        self.check(FailPoint::IsRejected)?;
        self.inner.is_card_rejected(operation, card_reference).await
    }

    async fn operation_log(&self, id: TransactionId) -> StoreResult<Vec<OperationLogEntry>> {
        self.inner.operation_log(id).await
    }

    async fn all_transactions(&self) -> StoreResult<Vec<TransactionRecord>> {
        self.inner.all_transactions().await
    }

    async fn purge_transaction(&self, id: TransactionId) -> StoreResult<()> {
        self.inner.purge_transaction(id).await
    }
}

pub const VISA: &str = "4242424242424242";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 15, 9, 30, 0).unwrap()
}

pub fn dec(value: &str) -> Decimal {
    value.parse().unwrap()
}

/// Engine over a fresh in-memory store with a fixed clock
pub fn engine() -> (LifecycleEngine, Arc<InMemoryLedgerStore>) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let engine = LifecycleEngine::with_clock(store.clone(), Arc::new(FixedClock(now())));
    (engine, store)
}

pub fn engine_over(store: Arc<dyn LedgerStore>) -> LifecycleEngine {
    LifecycleEngine::with_clock(store, Arc::new(FixedClock(now())))
}

pub fn authorize(card: &str, amount: &str, currency: &str) -> AuthorizeRequest {
    AuthorizeRequest {
        card: CardDetails {
            number: card.to_string(),
            expiry_date: "12-2099".to_string(),
            cvv: "123".to_string(),
        },
        amount: dec(amount),
        currency: currency.to_string(),
    }
}

pub fn capture(id: TransactionId, amount: &str) -> CaptureRequest {
    CaptureRequest {
        transaction_id: id.to_string(),
        amount: dec(amount),
    }
}

pub fn refund(id: TransactionId, amount: &str) -> RefundRequest {
    RefundRequest {
        transaction_id: id.to_string(),
        amount: dec(amount),
    }
}

pub fn void(id: TransactionId) -> VoidRequest {
    VoidRequest {
        transaction_id: id.to_string(),
    }
}

/// Authorise `amount` GBP on the test Visa card and return the new id
pub async fn authorised(engine: &LifecycleEngine, amount: &str) -> TransactionId {
    engine
        .authorize(authorize(VISA, amount, "GBP"))
        .await
        .expect("authorisation failed")
        .id
        .expect("authorisation returned no id")
}

/// Captures minus refunds recorded in a transaction's log
pub fn net_captured(log: &[OperationLogEntry]) -> Decimal {
    log.iter().fold(Decimal::ZERO, |net, entry| match entry.operation {
        Operation::Capture => net + entry.amount,
        Operation::Refund => net - entry.amount,
        _ => net,
    })
}
