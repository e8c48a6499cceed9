//! Transaction lifecycle orchestration
//!
//! This module provides the `LifecycleEngine` struct, which runs the four
//! card operations (authorise, capture, refund, void) against a
//! [`LedgerStore`].
//!
//! # Design
//!
//! Every operation follows the same fixed pipeline: normalise and validate the
//! request, consult the state guard, load the record, screen the card, check
//! cancellation and expiry, check the amount bound, then perform exactly one
//! atomic store write. All checks happen before the write; the write is
//! version-guarded so a concurrent change between load and write surfaces as
//! `PersistFailed` instead of breaking the amount invariant.
//!
//! # Architecture
//!
//! ```text
//! LifecycleEngine
//!     ├── Arc<dyn LedgerStore>  (records, operation log, reject list)
//!     ├── Arc<dyn Clock>        (expiry checks, record timestamps)
//!     ├── StateGuard            (operation ordering)
//!     └── RejectScreen          (card blacklist)
//! ```
//!
//! The engine classifies failures and never logs them; reporting is left to
//! the caller.

use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::reject_screen::RejectScreen;
use super::state_guard::StateGuard;
use super::traits::{Clock, LedgerStore, SystemClock};
use super::validator;
use crate::types::{
    AuthorizeRequest, CaptureRequest, ExpiryDate, LifecycleError, Operation, OperationResponse,
    RefundRequest, TransactionId, TransactionRecord, Violation, VoidRequest,
};

/// Card transaction lifecycle engine
///
/// Cheap to clone; clones share the same store and clock and can be used from
/// many tasks at once.
#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    guard: StateGuard,
    screen: RejectScreen,
}

impl LifecycleEngine {
    /// Create an engine over `store` using wall-clock time
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create an engine over `store` reading the current time from `clock`
    ///
    /// # Arguments
    ///
    /// * `store` - Ledger holding records, logs and the reject list
    /// * `clock` - Time source for expiry checks and new records
    pub fn with_clock(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            guard: StateGuard::new(Arc::clone(&store)),
            screen: RejectScreen::new(Arc::clone(&store)),
            store,
            clock,
        }
    }

    /// The ledger this engine writes to
    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Reserve funds against a card and open a new transaction
    ///
    /// # Returns
    ///
    /// * `Ok(OperationResponse)` - Carries the new transaction id and the authorised amount
    /// * `Err(LifecycleError::ValidationFailed)` - One or more fields are invalid
    /// * `Err(LifecycleError::OperationRejected)` - The card is blacklisted for authorisation
    /// * `Err(LifecycleError::RejectScreenFailed)` - The blacklist could not be read
    /// * `Err(LifecycleError::PersistFailed)` - The record could not be created
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
    ) -> Result<OperationResponse, LifecycleError> {
        let operation = Operation::Authorisation;
        let request = request.normalized();
        let now = self.clock.now();

        let violations = validator::validate_authorize(&request, now);
        if !violations.is_empty() {
            return Err(LifecycleError::validation_failed(operation, violations));
        }
        let expiry: ExpiryDate = request.card.expiry_date.parse().map_err(|_| {
            LifecycleError::validation_failed(operation, vec![Violation::InvalidExpiryDate])
        })?;

        self.screen.screen(operation, &request.card.number).await?;

        let id = Uuid::new_v4();
        let record = TransactionRecord::authorised(
            id,
            request.card.number,
            expiry,
            request.amount,
            request.currency,
            now,
        );
        let response = OperationResponse::new(record.authorized_amount, record.currency.clone());

        self.store
            .create_transaction(record)
            .await
            .map_err(|source| LifecycleError::persist_failed(operation, id, source))?;

        Ok(response.with_id(id))
    }

    /// Collect part or all of the available funds
    ///
    /// # Returns
    ///
    /// * `Ok(OperationResponse)` - Carries the new available amount
    /// * `Err(LifecycleError::InvalidState)` - A refund has already been logged
    /// * `Err(LifecycleError::AlreadyCancelled)` - The transaction was voided (benign)
    /// * `Err(LifecycleError::AmountExceedsAvailable)` - `amount` is above the available amount
    ///
    /// plus the shared validation, lookup, screening and persistence failures.
    pub async fn capture(
        &self,
        request: CaptureRequest,
    ) -> Result<OperationResponse, LifecycleError> {
        let operation = Operation::Capture;
        let request = request.normalized();

        let violations = validator::validate_capture(&request);
        let id = valid_id(operation, &request.transaction_id, violations)?;
        let amount = request.amount;

        let record = self.load_for_update(operation, id).await?;

        let new_available = record
            .available_amount
            .checked_sub(amount)
            .filter(|available| *available >= Decimal::ZERO)
            .ok_or_else(|| {
                LifecycleError::amount_exceeds_available(id, amount, record.available_amount)
            })?;

        self.store
            .update_available_amount(id, record.version, new_available, operation, amount)
            .await
            .map_err(|source| LifecycleError::persist_failed(operation, id, source))?;

        Ok(OperationResponse::new(new_available, record.currency))
    }

    /// Return previously captured funds to availability
    ///
    /// Bounded by the amount captured so far, i.e.
    /// `authorized_amount - available_amount`.
    ///
    /// # Returns
    ///
    /// * `Ok(OperationResponse)` - Carries the new available amount
    /// * `Err(LifecycleError::AmountExceedsAvailable)` - `amount` is above the captured amount
    ///
    /// plus the same failures as [`capture`](Self::capture), except ordering
    /// never refuses a refund.
    pub async fn refund(
        &self,
        request: RefundRequest,
    ) -> Result<OperationResponse, LifecycleError> {
        let operation = Operation::Refund;
        let request = request.normalized();

        let violations = validator::validate_refund(&request);
        let id = valid_id(operation, &request.transaction_id, violations)?;
        let amount = request.amount;

        let record = self.load_for_update(operation, id).await?;

        let captured = record.captured_amount();
        if amount > captured {
            return Err(LifecycleError::amount_exceeds_available(id, amount, captured));
        }
        let new_available = record
            .available_amount
            .checked_add(amount)
            .ok_or_else(|| LifecycleError::amount_exceeds_available(id, amount, captured))?;

        self.store
            .update_available_amount(id, record.version, new_available, operation, amount)
            .await
            .map_err(|source| LifecycleError::persist_failed(operation, id, source))?;

        Ok(OperationResponse::new(new_available, record.currency))
    }

    /// Cancel a transaction that has not been captured
    ///
    /// Available funds are left untouched; the response reports the
    /// authorised amount as the reversed amount.
    ///
    /// # Returns
    ///
    /// * `Ok(OperationResponse)` - Carries the authorised amount
    /// * `Err(LifecycleError::InvalidState)` - A capture has already been logged
    /// * `Err(LifecycleError::AlreadyCancelled)` - The transaction was voided before (benign)
    pub async fn void(&self, request: VoidRequest) -> Result<OperationResponse, LifecycleError> {
        let operation = Operation::Void;
        let request = request.normalized();

        let violations = validator::validate_void(&request);
        let id = valid_id(operation, &request.transaction_id, violations)?;

        self.guard.ensure_authorised(operation, id).await?;

        let record = self.load(id).await?;
        if !record.is_live() {
            return Err(LifecycleError::AlreadyCancelled { id });
        }
        // The log may have grown since the first check; appends after this
        // point bump the version the write is guarded by
        self.guard.ensure_authorised(operation, id).await?;

        self.store
            .set_cancelled(id, record.version)
            .await
            .map_err(|source| LifecycleError::persist_failed(operation, id, source))?;

        Ok(OperationResponse::new(
            record.authorized_amount,
            record.currency,
        ))
    }

    async fn load(&self, id: TransactionId) -> Result<TransactionRecord, LifecycleError> {
        self.store
            .get_transaction(id)
            .await
            .map_err(|source| LifecycleError::from_load(id, source))
    }

    /// Guard, load, screen, cancellation and expiry steps shared by capture and refund
    async fn load_for_update(
        &self,
        operation: Operation,
        id: TransactionId,
    ) -> Result<TransactionRecord, LifecycleError> {
        self.guard.ensure_authorised(operation, id).await?;

        let record = self.load(id).await?;
        // The log may have grown since the first check; appends after this
        // point bump the version the write is guarded by
        self.guard.ensure_authorised(operation, id).await?;

        self.screen.screen(operation, &record.card_reference).await?;

        if !record.is_live() {
            return Err(LifecycleError::AlreadyCancelled { id });
        }
        if record.expiry.is_expired_at(self.clock.now()) {
            return Err(LifecycleError::CardExpired { id });
        }

        Ok(record)
    }
}

/// Turn the validator's verdict into a parsed transaction id
fn valid_id(
    operation: Operation,
    raw: &str,
    violations: Vec<Violation>,
) -> Result<TransactionId, LifecycleError> {
    if !violations.is_empty() {
        return Err(LifecycleError::validation_failed(operation, violations));
    }
    validator::parse_transaction_id(raw).ok_or_else(|| {
        LifecycleError::validation_failed(operation, vec![Violation::InvalidTransactionId])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger_store::InMemoryLedgerStore;
    use crate::core::traits::FixedClock;
    use crate::types::{CardDetails, RejectEntry};
    use chrono::{DateTime, TimeZone, Utc};
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 9, 30, 0).unwrap()
    }

    fn dec(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    fn engine_with(store: InMemoryLedgerStore) -> (LifecycleEngine, Arc<InMemoryLedgerStore>) {
        let store = Arc::new(store);
        let engine = LifecycleEngine::with_clock(store.clone(), Arc::new(FixedClock(now())));
        (engine, store)
    }

    fn engine() -> (LifecycleEngine, Arc<InMemoryLedgerStore>) {
        engine_with(InMemoryLedgerStore::new())
    }

    fn authorize_request(amount: &str) -> AuthorizeRequest {
        AuthorizeRequest {
            card: CardDetails {
                number: "4242424242424242".to_string(),
                expiry_date: "12-2030".to_string(),
                cvv: "123".to_string(),
            },
            amount: dec(amount),
            currency: "GBP".to_string(),
        }
    }

    fn capture(id: TransactionId, amount: &str) -> CaptureRequest {
        CaptureRequest {
            transaction_id: id.to_string(),
            amount: dec(amount),
        }
    }

    fn refund(id: TransactionId, amount: &str) -> RefundRequest {
        RefundRequest {
            transaction_id: id.to_string(),
            amount: dec(amount),
        }
    }

    fn void(id: TransactionId) -> VoidRequest {
        VoidRequest {
            transaction_id: id.to_string(),
        }
    }

    async fn authorised(engine: &LifecycleEngine, amount: &str) -> TransactionId {
        engine
            .authorize(authorize_request(amount))
            .await
            .unwrap()
            .id
            .unwrap()
    }

    #[tokio::test]
    async fn test_authorize_creates_record() {
        let (engine, store) = engine();

        let response = engine.authorize(authorize_request("100")).await.unwrap();

        assert!(response.success);
        assert_eq!(response.amount, dec("100"));
        assert_eq!(response.currency, "GBP");

        let id = response.id.unwrap();
        let record = store.get_transaction(id).await.unwrap();
        assert_eq!(record.authorized_amount, dec("100"));
        assert_eq!(record.available_amount, dec("100"));
        assert_eq!(record.created_at, now());
        assert!(record.is_live());
    }

    #[tokio::test]
    async fn test_authorize_strips_whitespace() {
        let (engine, store) = engine();
        let mut request = authorize_request("10");
        request.card.number = " 4242 4242 4242 4242 ".to_string();
        request.card.expiry_date = "12 - 2030".to_string();

        let id = engine.authorize(request).await.unwrap().id.unwrap();

        let record = store.get_transaction(id).await.unwrap();
        assert_eq!(record.card_reference, "4242424242424242");
    }

    #[tokio::test]
    async fn test_authorize_validation_failure_creates_nothing() {
        let (engine, store) = engine();
        let mut request = authorize_request("0");
        request.card.cvv = "1".to_string();

        let result = engine.authorize(request).await;

        assert_eq!(
            result,
            Err(LifecycleError::ValidationFailed {
                operation: Operation::Authorisation,
                violations: vec![Violation::InvalidCvv, Violation::InvalidAmount],
            })
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_authorize_rejected_card() {
        let store = InMemoryLedgerStore::new();
        store.insert_reject(RejectEntry {
            card_reference: "4242424242424242".to_string(),
            operation_scope: "authorisation".to_string(),
        });
        let (engine, store) = engine_with(store);

        let result = engine.authorize(authorize_request("10")).await;

        assert_eq!(
            result,
            Err(LifecycleError::OperationRejected {
                operation: Operation::Authorisation
            })
        );
        assert!(store.is_empty());
    }

    #[rstest]
    #[case::partial("40", Ok(dec("60")))]
    #[case::full("100", Ok(dec("0")))]
    #[case::over_by_a_cent("100.01", Err(dec("100")))]
    #[tokio::test]
    async fn test_capture_bound(#[case] amount: &str, #[case] expected: Result<Decimal, Decimal>) {
        let (engine, store) = engine();
        let id = authorised(&engine, "100").await;

        let result = engine.capture(capture(id, amount)).await;

        match expected {
            Ok(available) => {
                assert_eq!(result.unwrap().amount, available);
                assert_eq!(store.get_transaction(id).await.unwrap().available_amount, available);
            }
            Err(limit) => {
                assert_eq!(
                    result,
                    Err(LifecycleError::AmountExceedsAvailable {
                        id,
                        requested: dec(amount),
                        limit
                    })
                );
                assert_eq!(store.get_transaction(id).await.unwrap().available_amount, limit);
            }
        }
    }

    #[tokio::test]
    async fn test_capture_unknown_transaction() {
        let (engine, _) = engine();
        let id = Uuid::new_v4();

        let result = engine.capture(capture(id, "1")).await;
        assert_eq!(result, Err(LifecycleError::NotFound { id }));
    }

    #[tokio::test]
    async fn test_capture_invalid_id() {
        let (engine, _) = engine();
        let result = engine
            .capture(CaptureRequest {
                transaction_id: "abc".to_string(),
                amount: dec("-1"),
            })
            .await;

        assert_eq!(
            result,
            Err(LifecycleError::ValidationFailed {
                operation: Operation::Capture,
                violations: vec![Violation::InvalidAmount, Violation::InvalidTransactionId],
            })
        );
    }

    #[tokio::test]
    async fn test_capture_after_refund_is_invalid_state() {
        let (engine, _) = engine();
        let id = authorised(&engine, "100").await;
        engine.capture(capture(id, "50")).await.unwrap();
        engine.refund(refund(id, "10")).await.unwrap();

        let result = engine.capture(capture(id, "10")).await;
        assert_eq!(
            result,
            Err(LifecycleError::InvalidState {
                operation: Operation::Capture,
                id
            })
        );
    }

    #[tokio::test]
    async fn test_capture_rejected_card() {
        let (engine, store) = engine();
        let id = authorised(&engine, "100").await;
        store.insert_reject(RejectEntry {
            card_reference: "4242424242424242".to_string(),
            operation_scope: "capture".to_string(),
        });

        let result = engine.capture(capture(id, "10")).await;
        assert_eq!(
            result,
            Err(LifecycleError::OperationRejected {
                operation: Operation::Capture
            })
        );
    }

    #[tokio::test]
    async fn test_capture_expired_card() {
        let store = Arc::new(InMemoryLedgerStore::new());
        let id = Uuid::new_v4();
        store
            .create_transaction(TransactionRecord::authorised(
                id,
                "4242424242424242".to_string(),
                ExpiryDate::new(5, 2026).unwrap(),
                dec("100"),
                "GBP".to_string(),
                now(),
            ))
            .await
            .unwrap();
        let engine = LifecycleEngine::with_clock(store, Arc::new(FixedClock(now())));

        assert_eq!(
            engine.capture(capture(id, "10")).await,
            Err(LifecycleError::CardExpired { id })
        );
        assert_eq!(
            engine.refund(refund(id, "10")).await,
            Err(LifecycleError::CardExpired { id })
        );
    }

    #[tokio::test]
    async fn test_refund_bounded_by_captured_amount() {
        let (engine, _) = engine();
        let id = authorised(&engine, "100").await;

        assert_eq!(
            engine.refund(refund(id, "1")).await,
            Err(LifecycleError::AmountExceedsAvailable {
                id,
                requested: dec("1"),
                limit: dec("0")
            })
        );

        engine.capture(capture(id, "30")).await.unwrap();
        let response = engine.refund(refund(id, "30")).await.unwrap();
        assert_eq!(response.amount, dec("100"));
    }

    #[tokio::test]
    async fn test_void_reports_authorised_amount() {
        let (engine, store) = engine();
        let id = authorised(&engine, "75.50").await;

        let response = engine.void(void(id)).await.unwrap();

        assert_eq!(response.amount, dec("75.50"));
        assert_eq!(response.id, None);
        let record = store.get_transaction(id).await.unwrap();
        assert!(!record.is_live());
        assert_eq!(record.available_amount, dec("75.50"));
    }

    #[tokio::test]
    async fn test_void_twice_is_already_cancelled() {
        let (engine, store) = engine();
        let id = authorised(&engine, "10").await;
        engine.void(void(id)).await.unwrap();
        let log_len = store.operation_log(id).await.unwrap().len();

        let result = engine.void(void(id)).await;

        assert_eq!(result, Err(LifecycleError::AlreadyCancelled { id }));
        assert!(result.unwrap_err().is_benign());
        assert_eq!(store.operation_log(id).await.unwrap().len(), log_len);
    }

    #[tokio::test]
    async fn test_operations_on_cancelled_transaction() {
        let (engine, _) = engine();
        let id = authorised(&engine, "10").await;
        engine.void(void(id)).await.unwrap();

        assert_eq!(
            engine.capture(capture(id, "1")).await,
            Err(LifecycleError::AlreadyCancelled { id })
        );
        assert_eq!(
            engine.refund(refund(id, "1")).await,
            Err(LifecycleError::AlreadyCancelled { id })
        );
    }

    #[tokio::test]
    async fn test_void_after_capture_is_invalid_state() {
        let (engine, _) = engine();
        let id = authorised(&engine, "50").await;
        engine.capture(capture(id, "20")).await.unwrap();

        assert_eq!(
            engine.void(void(id)).await,
            Err(LifecycleError::InvalidState {
                operation: Operation::Void,
                id
            })
        );
    }
}
