use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TondealError};

/// A standing instruction to swap one asset for another once a price
/// condition holds.
///
/// `amount` is expressed in human units of the *wanted* asset; `price` is the
/// limit in held-asset terms, scaled by the held asset's decimals at
/// comparison time. Orders are immutable: the only state transition is
/// deletion on fulfilment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: Uuid,
    /// Pool caption this order trades against, e.g. "TON/USDT"
    pub pair: String,
    /// Which side of the pair the user holds (buy) or wants (sell)
    pub main_coin: u8,
    pub is_buy: bool,
    /// Quantity in human units of the wanted asset
    pub amount: Decimal,
    /// Limit price in held-asset terms
    pub price: Decimal,
}

impl LimitOrder {
    pub fn new(
        pair: impl Into<String>,
        main_coin: u8,
        is_buy: bool,
        amount: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pair: pair.into(),
            main_coin,
            is_buy,
            amount,
            price,
        }
    }

    /// Index of the asset the user receives. `main_coin` names the asset the
    /// order is about: the one being bought on a buy, the one being sold on
    /// a sell.
    pub fn want_index(&self) -> usize {
        if self.is_buy {
            self.main_coin as usize
        } else {
            1 - self.main_coin as usize
        }
    }

    /// Index of the asset the user currently holds and is offering
    pub fn held_index(&self) -> usize {
        1 - self.want_index()
    }

    /// Reject orders whose fields can never produce a valid swap
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| TondealError::MalformedOrder {
            order_id: self.id.to_string(),
            reason,
        };

        if self.main_coin > 1 {
            return Err(fail(format!("main_coin must be 0 or 1, got {}", self.main_coin)));
        }
        if self.amount <= Decimal::ZERO {
            return Err(fail(format!("amount must be positive, got {}", self.amount)));
        }
        if self.price <= Decimal::ZERO {
            return Err(fail(format!("price must be positive, got {}", self.price)));
        }
        if self.pair.trim().is_empty() {
            return Err(fail("empty pair caption".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn buy_order_wants_the_main_coin() {
        let order = LimitOrder::new("TON/ABC", 1, true, dec!(5), dec!(2));
        assert_eq!(order.want_index(), 1);
        assert_eq!(order.held_index(), 0);
    }

    #[test]
    fn sell_order_offers_the_main_coin() {
        let order = LimitOrder::new("TON/ABC", 0, false, dec!(3), dec!(1));
        assert_eq!(order.held_index(), 0);
        assert_eq!(order.want_index(), 1);
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let mut order = LimitOrder::new("TON/ABC", 0, true, dec!(1), dec!(1));
        assert!(order.validate().is_ok());

        order.main_coin = 2;
        assert!(order.validate().is_err());

        order.main_coin = 0;
        order.amount = dec!(0);
        assert!(order.validate().is_err());

        order.amount = dec!(1);
        order.price = dec!(-1);
        assert!(order.validate().is_err());
    }
}
