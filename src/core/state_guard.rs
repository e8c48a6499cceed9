//! Operation ordering policy
//!
//! Permissibility is derived from which kinds of operations have ever been
//! logged against a transaction, never from its current amounts:
//!
//! | requested | refused if already logged |
//! |-----------|---------------------------|
//! | void      | capture                   |
//! | capture   | refund                    |
//! | refund    | (nothing)                 |
//!
//! Refund is bounded by the captured amount later in the engine instead.

use std::sync::Arc;

use super::traits::LedgerStore;
use crate::types::{LifecycleError, Operation, TransactionId};

/// Disallowed predecessor of `operation`, if it has one
///
/// Authorisation is not a follow-up operation and has no rule.
pub fn disallowed_predecessor(operation: Operation) -> Result<Option<Operation>, LifecycleError> {
    match operation {
        Operation::Void => Ok(Some(Operation::Capture)),
        Operation::Capture => Ok(Some(Operation::Refund)),
        Operation::Refund => Ok(None),
        Operation::Authorisation => Err(LifecycleError::InvalidOperationName { operation }),
    }
}

/// Checks the operation log against the ordering table
#[derive(Debug, Clone)]
pub struct StateGuard {
    store: Arc<dyn LedgerStore>,
}

impl StateGuard {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Whether `operation` may currently run against `id`
    ///
    /// # Errors
    ///
    /// * `InvalidOperationName` - `operation` has no ordering rule
    /// * `StateCheckFailed` - the operation log could not be read
    pub async fn is_authorised(
        &self,
        operation: Operation,
        id: TransactionId,
    ) -> Result<bool, LifecycleError> {
        let Some(predecessor) = disallowed_predecessor(operation)? else {
            return Ok(true);
        };

        let logged = self
            .store
            .has_logged_operation(id, predecessor)
            .await
            .map_err(|source| LifecycleError::StateCheckFailed {
                operation,
                id,
                source,
            })?;

        Ok(!logged)
    }

    /// Fail with `InvalidState` unless `operation` is permitted
    pub async fn ensure_authorised(
        &self,
        operation: Operation,
        id: TransactionId,
    ) -> Result<(), LifecycleError> {
        if self.is_authorised(operation, id).await? {
            Ok(())
        } else {
            Err(LifecycleError::InvalidState { operation, id })
        }
    }
}
