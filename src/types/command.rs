//! Command-script rows and their outcomes
//!
//! A command is one line of the input script, already parsed but not yet
//! validated. Validation is the engine's job, so every field is kept as the
//! caller wrote it.

use rust_decimal::Decimal;

use super::card::CardDetails;
use super::error::LifecycleError;
use super::request::{
    AuthorizeRequest, CaptureRequest, OperationResponse, RefundRequest, VoidRequest,
};
use super::transaction::Operation;

/// One operation requested by the input script
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Line of the input file this command came from
    pub line: u64,

    pub operation: Operation,

    /// Caller label for authorisations, label or literal transaction id otherwise
    pub reference: String,

    pub card: CardDetails,

    /// `None` when the column was left empty
    pub amount: Option<Decimal>,

    pub currency: String,
}

impl Command {
    /// Build the authorisation request carried by this command
    ///
    /// A missing amount is sent as zero and fails validation downstream.
    pub fn authorize_request(&self) -> AuthorizeRequest {
        AuthorizeRequest {
            card: self.card.clone(),
            amount: self.amount.unwrap_or(Decimal::ZERO),
            currency: self.currency.clone(),
        }
    }

    pub fn capture_request(&self, transaction_id: String) -> CaptureRequest {
        CaptureRequest {
            transaction_id,
            amount: self.amount.unwrap_or(Decimal::ZERO),
        }
    }

    pub fn refund_request(&self, transaction_id: String) -> RefundRequest {
        RefundRequest {
            transaction_id,
            amount: self.amount.unwrap_or(Decimal::ZERO),
        }
    }

    pub fn void_request(&self, transaction_id: String) -> VoidRequest {
        VoidRequest { transaction_id }
    }
}

/// Outcome of one executed command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub line: u64,
    pub operation: Operation,
    pub reference: String,
    pub outcome: Result<OperationResponse, LifecycleError>,
}

impl CommandResult {
    /// Status the outcome maps to; 200 on success
    pub fn status_code(&self) -> u16 {
        match &self.outcome {
            Ok(_) => 200,
            Err(error) => error.status_code(),
        }
    }

    /// `ok` or the snake_case error kind
    pub fn outcome_name(&self) -> &'static str {
        match &self.outcome {
            Ok(_) => "ok",
            Err(error) => error.kind(),
        }
    }
}
