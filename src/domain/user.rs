use serde::{Deserialize, Serialize};

use super::LimitOrder;
use crate::signing::SecretKeyMaterial;

/// A registered user: identity, on-chain wallet, stored signing material and
/// the set of pending orders. Owned by the order store; the engine only ever
/// reads users and removes fulfilled orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub telegram_id: String,
    pub wallet_address: String,
    pub secret_key: SecretKeyMaterial,
    pub orders: Vec<LimitOrder>,
}

impl User {
    pub fn new(
        telegram_id: impl Into<String>,
        wallet_address: impl Into<String>,
        secret_key: SecretKeyMaterial,
    ) -> Self {
        Self {
            telegram_id: telegram_id.into(),
            wallet_address: wallet_address.into(),
            secret_key,
            orders: Vec::new(),
        }
    }

    pub fn with_orders(mut self, orders: Vec<LimitOrder>) -> Self {
        self.orders = orders;
        self
    }
}
