//! Ledger-related types for the Card Lifecycle Engine
//!
//! This module defines the operation names, the per-transaction ledger record,
//! its operation log entries, and the reject list rows that the engine reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::card::ExpiryDate;

/// Transaction identifier
///
/// Generated (UUID v4) at authorisation time and used as the ledger key.
pub type TransactionId = Uuid;

/// Operations that can be performed against a transaction
///
/// The string form of each variant is what gets written to the operation log
/// and what the reject list scope is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Reserve funds against a card, creating a new transaction
    Authorisation,

    /// Collect some or all of the still-available funds
    Capture,

    /// Return previously captured funds back to availability
    Refund,

    /// Cancel the transaction, making it terminally inactive
    Void,
}

impl Operation {
    /// All operations in lifecycle order
    pub const ALL: [Operation; 4] = [
        Operation::Authorisation,
        Operation::Capture,
        Operation::Refund,
        Operation::Void,
    ];

    /// Name used in the operation log and reject scopes
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Authorisation => "authorisation",
            Operation::Capture => "capture",
            Operation::Refund => "refund",
            Operation::Void => "void",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    /// Parse an operation name, accepting both spellings of authorise
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "authorisation" | "authorization" | "authorise" | "authorize" => {
                Ok(Operation::Authorisation)
            }
            "capture" => Ok(Operation::Capture),
            "refund" => Ok(Operation::Refund),
            "void" => Ok(Operation::Void),
            other => Err(format!("Unknown operation '{}'", other)),
        }
    }
}

/// Lifecycle state of a stored transaction
///
/// Persistence may model this as a nullable timestamp; the domain keeps it
/// as an explicit tag so call sites match on it instead of null-checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// The transaction can still be captured, refunded or voided
    Live,

    /// The transaction has been voided at the given instant
    Cancelled {
        /// When the void was recorded
        at: DateTime<Utc>,
    },
}

/// Ledger record, one per authorised payment
///
/// # Invariants
///
/// For a live record `0 <= available_amount <= authorized_amount` always holds.
/// `authorized_amount`, `currency`, `card_reference` and `expiry` never change
/// after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// Ledger key, assigned at authorisation
    pub id: TransactionId,

    /// Card number as supplied (whitespace removed)
    pub card_reference: String,

    /// Card validity month/year
    pub expiry: ExpiryDate,

    /// Amount confirmed at authorisation
    pub authorized_amount: Decimal,

    /// Amount still capturable
    ///
    /// Decreased by captures, increased by refunds.
    pub available_amount: Decimal,

    /// Three-letter currency code
    pub currency: String,

    /// Live or cancelled
    pub state: TransactionState,

    /// Optimistic concurrency counter, bumped by every mutation
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Create a fresh live record with the full amount available
    pub fn authorised(
        id: TransactionId,
        card_reference: String,
        expiry: ExpiryDate,
        amount: Decimal,
        currency: String,
        now: DateTime<Utc>,
    ) -> Self {
        TransactionRecord {
            id,
            card_reference,
            expiry,
            authorized_amount: amount,
            available_amount: amount,
            currency,
            state: TransactionState::Live,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the record has not been voided
    pub fn is_live(&self) -> bool {
        matches!(self.state, TransactionState::Live)
    }

    /// Amount captured so far and not refunded
    pub fn captured_amount(&self) -> Decimal {
        self.authorized_amount - self.available_amount
    }
}

/// Append-only audit entry
#[derive(Debug, Clone, PartialEq)]
pub struct OperationLogEntry {
    pub transaction_id: TransactionId,
    pub operation: Operation,
    /// Requested amount for capture/refund, authorised amount otherwise
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

/// Blacklist row
///
/// `operation_scope` names the operations the card is blocked from; it is
/// matched by substring containment (e.g. `"authorisation capture"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectEntry {
    pub card_reference: String,
    pub operation_scope: String,
}

impl RejectEntry {
    /// Whether this entry blocks the given operation
    pub fn blocks(&self, operation: Operation) -> bool {
        self.operation_scope.contains(operation.as_str())
    }
}
