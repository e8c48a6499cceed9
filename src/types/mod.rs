//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `card`: Card details and month-granular expiry
//! - `command`: Parsed command-script rows and their outcomes
//! - `transaction`: Operations, ledger records, log entries and reject rows
//! - `request`: Request and response payloads of the four operations
//! - `error`: Error types for the engine and the ledger store

pub mod card;
pub mod command;
pub mod error;
pub mod request;
pub mod transaction;

pub use card::{CardDetails, ExpiryDate};
pub use command::{Command, CommandResult};
pub use error::{LifecycleError, StoreError, StoreResult, Violation};
pub use request::{AuthorizeRequest, CaptureRequest, OperationResponse, RefundRequest, VoidRequest};
pub use transaction::{
    Operation, OperationLogEntry, RejectEntry, TransactionId, TransactionRecord, TransactionState,
};
