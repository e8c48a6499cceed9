//! Card blacklist screening

use std::sync::Arc;

use super::traits::LedgerStore;
use crate::types::{LifecycleError, Operation};

/// Answers whether a card is blacklisted for an operation
///
/// A store failure is reported as `RejectScreenFailed`, never as "not rejected".
#[derive(Debug, Clone)]
pub struct RejectScreen {
    store: Arc<dyn LedgerStore>,
}

impl RejectScreen {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// `true` if the card's reject entry scope contains the operation name
    pub async fn is_rejected(
        &self,
        operation: Operation,
        card_reference: &str,
    ) -> Result<bool, LifecycleError> {
        self.store
            .is_card_rejected(operation, card_reference)
            .await
            .map_err(|source| LifecycleError::RejectScreenFailed { operation, source })
    }

    /// Fail with `OperationRejected` if the card is blacklisted
    pub async fn screen(
        &self,
        operation: Operation,
        card_reference: &str,
    ) -> Result<(), LifecycleError> {
        if self.is_rejected(operation, card_reference).await? {
            return Err(LifecycleError::OperationRejected { operation });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ledger_store::InMemoryLedgerStore;
    use crate::types::RejectEntry;

    fn screen_with(entries: &[(&str, &str)]) -> RejectScreen {
        let store = InMemoryLedgerStore::new();
        for (card, scope) in entries {
            store.insert_reject(RejectEntry {
                card_reference: card.to_string(),
                operation_scope: scope.to_string(),
            });
        }
        RejectScreen::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_card_in_scope_is_rejected() {
        let screen = screen_with(&[("4000000000000002", "authorisation capture")]);

        assert!(screen
            .is_rejected(Operation::Authorisation, "4000000000000002")
            .await
            .unwrap());
        assert!(screen
            .is_rejected(Operation::Capture, "4000000000000002")
            .await
            .unwrap());
        assert!(!screen
            .is_rejected(Operation::Refund, "4000000000000002")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unknown_card_is_not_rejected() {
        let screen = screen_with(&[("4000000000000002", "refund")]);

        assert!(!screen
            .is_rejected(Operation::Refund, "4242424242424242")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_screen_maps_hit_to_operation_rejected() {
        let screen = screen_with(&[("4000000000000002", "refund")]);

        let result = screen.screen(Operation::Refund, "4000000000000002").await;
        assert_eq!(
            result,
            Err(LifecycleError::OperationRejected {
                operation: Operation::Refund
            })
        );
    }
}
