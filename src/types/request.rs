//! Request and response payloads for the four lifecycle operations
//!
//! Requests arrive unvalidated; the engine normalises and validates them
//! before doing anything else.

use rust_decimal::Decimal;

use super::card::{strip_whitespace, CardDetails};
use super::transaction::TransactionId;

/// Reserve `amount` in `currency` against a card
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizeRequest {
    pub card: CardDetails,
    pub amount: Decimal,
    pub currency: String,
}

impl AuthorizeRequest {
    pub fn normalized(self) -> Self {
        AuthorizeRequest {
            card: self.card.normalized(),
            amount: self.amount,
            currency: self.currency,
        }
    }
}

/// Collect `amount` from an authorised transaction
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Transaction identifier as supplied by the caller
    pub transaction_id: String,
    pub amount: Decimal,
}

impl CaptureRequest {
    pub fn normalized(self) -> Self {
        CaptureRequest {
            transaction_id: strip_whitespace(&self.transaction_id),
            amount: self.amount,
        }
    }
}

/// Return `amount` of previously captured funds
#[derive(Debug, Clone, PartialEq)]
pub struct RefundRequest {
    /// Transaction identifier as supplied by the caller
    pub transaction_id: String,
    pub amount: Decimal,
}

impl RefundRequest {
    pub fn normalized(self) -> Self {
        RefundRequest {
            transaction_id: strip_whitespace(&self.transaction_id),
            amount: self.amount,
        }
    }
}

/// Cancel an authorised transaction
#[derive(Debug, Clone, PartialEq)]
pub struct VoidRequest {
    /// Transaction identifier as supplied by the caller
    pub transaction_id: String,
}

impl VoidRequest {
    pub fn normalized(self) -> Self {
        VoidRequest {
            transaction_id: strip_whitespace(&self.transaction_id),
        }
    }
}

/// Success payload shared by all four operations
///
/// `amount` is the authorised amount for Authorize and Void, and the new
/// available amount for Capture and Refund. `id` is only set by Authorize.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    pub success: bool,
    pub id: Option<TransactionId>,
    pub amount: Decimal,
    pub currency: String,
}

impl OperationResponse {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        OperationResponse {
            success: true,
            id: None,
            amount,
            currency: currency.into(),
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = Some(id);
        self
    }
}
