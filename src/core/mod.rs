//! Core business logic module
//!
//! This module contains the transaction lifecycle components:
//! - `traits` - The `LedgerStore` persistence port and the `Clock`
//! - `validator` - Stateless field validation
//! - `reject_screen` - Card blacklist screening
//! - `state_guard` - Operation ordering policy
//! - `ledger_store` - In-memory `DashMap` ledger
//! - `engine` - Lifecycle orchestration (authorise, capture, refund, void)
//! - `batch_processor` - Concurrent command execution partitioned by reference

pub mod batch_processor;
pub mod engine;
pub mod ledger_store;
pub mod reject_screen;
pub mod state_guard;
pub mod traits;
pub mod validator;

pub use batch_processor::BatchProcessor;
pub use engine::LifecycleEngine;
pub use ledger_store::InMemoryLedgerStore;
pub use reject_screen::RejectScreen;
pub use state_guard::StateGuard;
pub use traits::{Clock, FixedClock, LedgerStore, SystemClock};
