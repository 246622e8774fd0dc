use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A momentary price observation from the oracle. Never persisted; every
/// cycle fetches a fresh one.
///
/// Unit convention (fixed once, applied everywhere): `price` is the number of
/// held-asset smallest units asked for one whole unit of the wanted asset,
/// i.e. the oracle is always queried with `amount_base = 10^decimals[want]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
}

impl Quote {
    pub fn new(price: Decimal) -> Self {
        Self { price }
    }
}
