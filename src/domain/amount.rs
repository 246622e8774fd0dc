use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TondealError};

/// Widest decimal precision accepted from pool metadata. Anything larger
/// cannot be represented without overflowing the raw u128 domain.
pub const MAX_DECIMALS: u32 = 38;

/// A token quantity in smallest on-chain units, carrying its own decimal
/// precision so human-unit and smallest-unit values can never be mixed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    raw: u128,
    decimals: u32,
}

impl TokenAmount {
    pub fn from_raw(raw: u128, decimals: u32) -> Result<Self> {
        if decimals > MAX_DECIMALS {
            return Err(TondealError::Validation(format!(
                "asset precision {decimals} exceeds supported maximum {MAX_DECIMALS}"
            )));
        }
        Ok(Self { raw, decimals })
    }

    /// Convert a human-unit quantity (e.g. `5` meaning five whole tokens of a
    /// 6-decimal asset) into smallest units. Fractions finer than the asset's
    /// precision are rejected rather than silently truncated.
    pub fn from_human(amount: Decimal, decimals: u32) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(TondealError::Validation(format!(
                "amount must be non-negative, got {amount}"
            )));
        }

        let scale = one_unit(decimals)?;
        let scaled = amount
            .checked_mul(Decimal::from(scale))
            .ok_or_else(|| TondealError::Validation(format!(
                "amount {amount} overflows at {decimals} decimals"
            )))?;

        if scaled.fract() != Decimal::ZERO {
            return Err(TondealError::Validation(format!(
                "amount {amount} is finer than {decimals} decimals"
            )));
        }

        let raw = scaled.to_u128().ok_or_else(|| {
            TondealError::Validation(format!(
                "amount {amount} does not fit in smallest units at {decimals} decimals"
            ))
        })?;

        Ok(Self { raw, decimals })
    }

    pub fn raw(&self) -> u128 {
        self.raw
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw == 0
    }

    /// Back to human units, for logs and reports
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.raw) / Decimal::from(10u128.pow(self.decimals))
    }
}

impl std::fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (raw {})", self.to_decimal(), self.raw)
    }
}

/// One whole unit of an asset in smallest units: `10^decimals`
pub fn one_unit(decimals: u32) -> Result<u128> {
    if decimals > MAX_DECIMALS {
        return Err(TondealError::Validation(format!(
            "asset precision {decimals} exceeds supported maximum {MAX_DECIMALS}"
        )));
    }
    10u128.checked_pow(decimals).ok_or_else(|| {
        TondealError::Validation(format!("10^{decimals} overflows smallest-unit domain"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_whole_tokens() {
        let amount = TokenAmount::from_human(dec!(5), 6).unwrap();
        assert_eq!(amount.raw(), 5_000_000);
        assert_eq!(amount.decimals(), 6);
    }

    #[test]
    fn converts_fractional_tokens_within_precision() {
        let amount = TokenAmount::from_human(dec!(1.5), 9).unwrap();
        assert_eq!(amount.raw(), 1_500_000_000);
    }

    #[test]
    fn rejects_fraction_finer_than_precision() {
        assert!(TokenAmount::from_human(dec!(0.0000001), 6).is_err());
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(TokenAmount::from_human(dec!(-1), 9).is_err());
    }

    #[test]
    fn round_trips_to_decimal() {
        let amount = TokenAmount::from_human(dec!(2.25), 9).unwrap();
        assert_eq!(amount.to_decimal(), dec!(2.25));
    }

    #[test]
    fn one_unit_matches_precision() {
        assert_eq!(one_unit(9).unwrap(), 1_000_000_000);
        assert_eq!(one_unit(0).unwrap(), 1);
        assert!(one_unit(MAX_DECIMALS + 1).is_err());
    }
}
