use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{DeleteOutcome, OrderStore};
use crate::domain::User;
use crate::error::Result;

/// Dry-run wrapper: reads pass through, deletes are logged and dropped, so a
/// rehearsal run never mutates real standing orders.
pub struct ReadOnlyStore<S> {
    inner: Arc<S>,
}

impl<S: OrderStore> ReadOnlyStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: OrderStore> OrderStore for ReadOnlyStore<S> {
    async fn list_users_with_orders(&self) -> Result<Vec<User>> {
        self.inner.list_users_with_orders().await
    }

    async fn delete_order(&self, telegram_id: &str, order_id: Uuid) -> Result<DeleteOutcome> {
        info!(telegram_id, %order_id, "dry run: order not retired");
        Ok(DeleteOutcome::AlreadyGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LimitOrder;
    use crate::signing::{SecretKeyMaterial, SEED_LEN};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn deletes_do_not_reach_the_inner_store() {
        let inner = Arc::new(MemoryStore::new());
        let order = LimitOrder::new("TON/ABC", 0, true, dec!(1), dec!(2));
        let order_id = order.id;
        inner.insert_user(
            User::new(
                "42",
                "EQWallet",
                SecretKeyMaterial::from_bytes(vec![0u8; SEED_LEN]),
            )
            .with_orders(vec![order]),
        );

        let store = ReadOnlyStore::new(Arc::clone(&inner));
        store.delete_order("42", order_id).await.unwrap();

        assert_eq!(inner.order_count(), 1);
        assert_eq!(store.list_users_with_orders().await.unwrap().len(), 1);
    }
}
