pub mod dry_run;
pub mod memory;

pub use dry_run::ReadOnlyStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::User;
use crate::error::Result;

/// Outcome of an order deletion. Deleting an id that is already gone is a
/// success, so retries and overlapping cycles stay safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyGone,
}

/// The mutable shared resource of the engine: per-user pending orders plus
/// the credentials needed to sign on each user's behalf.
///
/// `list_users_with_orders` is a snapshot read; a failure here is the only
/// error that aborts a whole cycle. `delete_order` is the single state
/// transition an order can undergo and must be idempotent.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn list_users_with_orders(&self) -> Result<Vec<User>>;

    async fn delete_order(&self, telegram_id: &str, order_id: Uuid) -> Result<DeleteOutcome>;
}
