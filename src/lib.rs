//! Card Lifecycle Engine Library
//! # Overview
//!
//! This library runs the lifecycle of card payments (authorise, capture,
//! refund, void) against a ledger of transaction records and their operation
//! logs, with a sequential and a concurrent command-script pipeline on top.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (records, operations, requests, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::validator`] - Field validation
//!   - [`core::reject_screen`] - Card blacklist screening
//!   - [`core::state_guard`] - Operation ordering policy
//!   - [`core::engine`] - Lifecycle orchestration
//!   - [`core::ledger_store`] - Thread-safe in-memory ledger
//! - [`io`] - CSV input and output
//! - [`strategy`] - Sync and async processing pipelines
//! - [`logging`] - tracing subscriber setup
//!
//! # Lifecycle
//!
//! ```text
//! new --authorise--> authorised --capture--> captured --refund--> captured
//! authorised --void--> cancelled
//! ```
//!
//! Only amounts and a cancellation flag are stored; whether a transaction is
//! authorised or captured is derived from its operation log.
//!
//! - **Authorise**: reserve funds against a card, creating a transaction
//! - **Capture**: collect some or all of the available funds
//! - **Refund**: return captured funds to availability
//! - **Void**: cancel a transaction that has not been captured
//!
//! # Ledger Invariant
//!
//! For every live transaction `0 <= available_amount <= authorized_amount`,
//! and `authorized_amount - available_amount` equals captures minus refunds.

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{InMemoryLedgerStore, LedgerStore, LifecycleEngine};
pub use io::{write_ledger_csv, write_results_csv};
pub use types::{
    AuthorizeRequest, CaptureRequest, LifecycleError, Operation, OperationResponse, RefundRequest,
    StoreError, TransactionId, TransactionRecord, VoidRequest,
};
