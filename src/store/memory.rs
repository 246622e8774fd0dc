use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::{DeleteOutcome, OrderStore};
use crate::domain::User;
use crate::error::Result;

/// In-memory order store, used by dry runs and tests. Mirrors the production
/// store contract exactly, including idempotent deletes.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.telegram_id.clone(), user);
    }

    pub fn order_count(&self) -> usize {
        self.users.iter().map(|entry| entry.orders.len()).sum()
    }

    pub fn user_orders(&self, telegram_id: &str) -> Vec<Uuid> {
        self.users
            .get(telegram_id)
            .map(|user| user.orders.iter().map(|o| o.id).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn list_users_with_orders(&self) -> Result<Vec<User>> {
        Ok(self
            .users
            .iter()
            .filter(|entry| !entry.orders.is_empty())
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn delete_order(&self, telegram_id: &str, order_id: Uuid) -> Result<DeleteOutcome> {
        let Some(mut user) = self.users.get_mut(telegram_id) else {
            return Ok(DeleteOutcome::AlreadyGone);
        };

        let before = user.orders.len();
        user.orders.retain(|order| order.id != order_id);

        if user.orders.len() < before {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::AlreadyGone)
        }
    }
}
