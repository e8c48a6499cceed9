//! Error types for the Card Lifecycle Engine
//!
//! This module defines every classified failure the engine can report, the
//! failures of the ledger store port, and the field-level validation violations.
//!
//! # Error Categories
//!
//! - **Validation**: one or more request fields violate a rule
//! - **Ordering**: the operation history forbids the requested operation
//! - **Lookup**: the transaction is missing or could not be read
//! - **Screening**: the card is blacklisted, or the blacklist could not be read
//! - **Balance**: expired card or amount outside the capturable/refundable bound
//! - **Persistence**: the atomic mutate-and-log step failed
//!
//! The engine only classifies; mapping to a response status is done through
//! [`LifecycleError::status_code`] by whoever sits in front of it.

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

use super::transaction::{Operation, TransactionId};

/// A single failed field rule
///
/// Validation reports every violated rule, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("card number is not valid")]
    InvalidCardNumber,

    #[error("expiry date is not valid")]
    InvalidExpiryDate,

    #[error("cvv number is not valid")]
    InvalidCvv,

    #[error("currency code is invalid")]
    InvalidCurrency,

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("authorisation id field is not valid")]
    InvalidTransactionId,
}

/// Failures reported by a [`LedgerStore`](crate::core::traits::LedgerStore)
///
/// `NotFound` is kept apart from every other failure so callers can branch on it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// No record exists for the identifier
    #[error("record {id} not found")]
    NotFound { id: TransactionId },

    /// A record with this identifier already exists
    #[error("record {id} already exists")]
    Duplicate { id: TransactionId },

    /// The record changed between load and write
    #[error("record {id} was modified concurrently (expected version {expected_version}, found {actual_version})")]
    Conflict {
        id: TransactionId,
        expected_version: u64,
        actual_version: u64,
    },

    /// The record was voided before the write could be applied
    #[error("record {id} is cancelled")]
    Cancelled { id: TransactionId },

    /// Any other backend failure
    #[error("store failure: {message}")]
    Backend { message: String },
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Result alias for ledger store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Classified failure of a lifecycle operation
///
/// Every failure keeps its kind on the way back to the caller; nothing is
/// retried or downgraded inside the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    /// One or more input fields violate a rule
    #[error("{operation} request is invalid: {}", ViolationList(.violations))]
    ValidationFailed {
        operation: Operation,
        violations: Vec<Violation>,
    },

    /// The operation history does not permit this operation
    #[error("transaction is not in a state that allows this operation ({operation} on {id})")]
    InvalidState {
        operation: Operation,
        id: TransactionId,
    },

    /// The state guard itself could not be evaluated
    #[error("unable to check for invalid state ({operation} on {id}): {source}")]
    StateCheckFailed {
        operation: Operation,
        id: TransactionId,
        source: StoreError,
    },

    /// No transaction exists for the identifier
    #[error("authorisation transaction {id} not found")]
    NotFound { id: TransactionId },

    /// The store failed for a reason other than not-found
    #[error("unable to retrieve authorisation transaction {id}: {source}")]
    RetrievalFailed {
        id: TransactionId,
        source: StoreError,
    },

    /// The card is blacklisted for this operation
    #[error("{operation} failure")]
    OperationRejected { operation: Operation },

    /// The blacklist check errored
    #[error("unable to retrieve rejects for {operation}: {source}")]
    RejectScreenFailed {
        operation: Operation,
        source: StoreError,
    },

    /// The transaction was already voided; benign, not worth retrying
    #[error("transaction {id} has been cancelled")]
    AlreadyCancelled { id: TransactionId },

    /// Card expiry re-check failed at operation time
    #[error("card is expired for transaction {id}")]
    CardExpired { id: TransactionId },

    /// Requested amount is above the capturable/refundable bound
    #[error("the requested amount cannot be processed: requested {requested}, limit {limit} on {id}")]
    AmountExceedsAvailable {
        id: TransactionId,
        requested: Decimal,
        limit: Decimal,
    },

    /// The atomic mutate-and-log step failed
    #[error("unable to persist {operation} for {id}: {source}")]
    PersistFailed {
        operation: Operation,
        id: TransactionId,
        source: StoreError,
    },

    /// The state guard was asked about an operation it has no rule for
    #[error("passed operation name is invalid: {operation}")]
    InvalidOperationName { operation: Operation },
}

struct ViolationList<'a>(&'a [Violation]);

impl fmt::Display for ViolationList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl LifecycleError {
    /// Create a ValidationFailed error
    pub fn validation_failed(operation: Operation, violations: Vec<Violation>) -> Self {
        LifecycleError::ValidationFailed {
            operation,
            violations,
        }
    }

    /// Create an AmountExceedsAvailable error
    pub fn amount_exceeds_available(id: TransactionId, requested: Decimal, limit: Decimal) -> Self {
        LifecycleError::AmountExceedsAvailable {
            id,
            requested,
            limit,
        }
    }

    /// Create a PersistFailed error
    pub fn persist_failed(operation: Operation, id: TransactionId, source: StoreError) -> Self {
        LifecycleError::PersistFailed {
            operation,
            id,
            source,
        }
    }

    /// Classify a failed record load
    ///
    /// Not-found becomes `NotFound`, anything else `RetrievalFailed`.
    pub fn from_load(id: TransactionId, source: StoreError) -> Self {
        if source.is_not_found() {
            LifecycleError::NotFound { id }
        } else {
            LifecycleError::RetrievalFailed { id, source }
        }
    }

    /// Whether this outcome is a successful-looking no-op
    pub fn is_benign(&self) -> bool {
        matches!(self, LifecycleError::AlreadyCancelled { .. })
    }

    /// Stable snake_case name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::ValidationFailed { .. } => "validation_failed",
            LifecycleError::InvalidState { .. } => "invalid_state",
            LifecycleError::StateCheckFailed { .. } => "state_check_failed",
            LifecycleError::NotFound { .. } => "not_found",
            LifecycleError::RetrievalFailed { .. } => "retrieval_failed",
            LifecycleError::OperationRejected { operation } => match operation {
                Operation::Authorisation => "authorisation_rejected",
                Operation::Capture => "capture_rejected",
                Operation::Refund => "refund_rejected",
                Operation::Void => "void_rejected",
            },
            LifecycleError::RejectScreenFailed { .. } => "reject_screen_failed",
            LifecycleError::AlreadyCancelled { .. } => "already_cancelled",
            LifecycleError::CardExpired { .. } => "card_expired",
            LifecycleError::AmountExceedsAvailable { .. } => "amount_exceeds_available",
            LifecycleError::PersistFailed { .. } => "persist_failed",
            LifecycleError::InvalidOperationName { .. } => "invalid_operation_name",
        }
    }

    /// Status code a request/response layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            LifecycleError::ValidationFailed {
                operation: Operation::Authorisation,
                ..
            } => 400,
            LifecycleError::ValidationFailed { .. } => 422,
            LifecycleError::InvalidState { .. } => 422,
            LifecycleError::NotFound { .. } => 404,
            LifecycleError::OperationRejected { .. }
            | LifecycleError::CardExpired { .. }
            | LifecycleError::AmountExceedsAvailable { .. } => 401,
            LifecycleError::AlreadyCancelled { .. } => 200,
            LifecycleError::StateCheckFailed { .. }
            | LifecycleError::RetrievalFailed { .. }
            | LifecycleError::RejectScreenFailed { .. }
            | LifecycleError::PersistFailed { .. }
            | LifecycleError::InvalidOperationName { .. } => 500,
        }
    }
}
