use rust_decimal::Decimal;

use crate::domain::{one_unit, Asset, LimitOrder, Pool, Quote, TokenAmount};
use crate::error::{Result, TondealError};

/// Which swap primitive a fulfilment must dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    NativeToToken,
    TokenToNative,
    TokenToToken,
}

/// Fully resolved swap: direction, bare addresses and smallest-unit amount.
/// Built only by [`evaluate`], so an executed plan always reflects the pool
/// metadata and quote it was decided against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub kind: SwapKind,
    pub from: Asset,
    pub to: Asset,
    /// Amount in smallest units of the wanted asset
    pub amount: TokenAmount,
}

/// Outcome of evaluating one order against one quote
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Fulfil(SwapPlan),
    Hold,
}

/// Smallest-unit base the oracle must be queried with for an order: one
/// whole unit of the wanted asset.
pub fn quote_base(order: &LimitOrder, pool: &Pool) -> Result<u128> {
    order.validate()?;
    one_unit(pool.decimals[order.want_index()])
}

/// The limit price in quote units: held-asset smallest units per whole unit
/// of the wanted asset.
pub fn scaled_limit(order: &LimitOrder, pool: &Pool) -> Result<Decimal> {
    order.validate()?;
    let held_unit = one_unit(pool.decimals[order.held_index()])?;
    order
        .price
        .checked_mul(Decimal::from(held_unit))
        .ok_or_else(|| TondealError::MalformedOrder {
            order_id: order.id.to_string(),
            reason: format!("limit price {} overflows when scaled", order.price),
        })
}

/// Pure fulfil/hold decision.
///
/// A buy order fulfils when the market asks at or below the limit; a sell
/// order when it asks at or above. Both `quote.price` and the scaled limit
/// are in held-asset smallest units per whole unit of the wanted asset, so
/// the comparison needs no further conversion. No side effects; the caller
/// re-evaluates against a fresh quote every cycle.
pub fn evaluate(order: &LimitOrder, pool: &Pool, quote: &Quote) -> Result<Decision> {
    order.validate()?;

    let held = order.held_index();
    let want = order.want_index();

    let from = pool.assets[held].clone();
    let to = pool.assets[want].clone();

    let amount = TokenAmount::from_human(order.amount, pool.decimals[want]).map_err(|e| {
        TondealError::MalformedOrder {
            order_id: order.id.to_string(),
            reason: e.to_string(),
        }
    })?;

    if amount.is_zero() {
        return Err(TondealError::MalformedOrder {
            order_id: order.id.to_string(),
            reason: "zero execution amount".to_string(),
        });
    }

    let limit = scaled_limit(order, pool)?;
    let fulfil = if order.is_buy {
        quote.price <= limit
    } else {
        quote.price >= limit
    };

    if !fulfil {
        return Ok(Decision::Hold);
    }

    let kind = match (from.is_native(), to.is_native()) {
        (true, _) => SwapKind::NativeToToken,
        (false, true) => SwapKind::TokenToNative,
        (false, false) => SwapKind::TokenToToken,
    };

    Ok(Decision::Fulfil(SwapPlan { kind, from, to, amount }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ton_jetton_pool() -> Pool {
        Pool::new("TON/ABC", [Asset::Native, Asset::jetton("EQAbc")], [9, 6])
    }

    fn jetton_jetton_pool() -> Pool {
        Pool::new(
            "ABC/XYZ",
            [Asset::jetton("EQAbc"), Asset::jetton("EQXyz")],
            [6, 9],
        )
    }

    #[test]
    fn buy_fulfils_at_or_below_limit() {
        // Buying the jetton (index 1) with TON. Limit in held-asset smallest
        // units: 2 * 10^9.
        let order = LimitOrder::new("TON/ABC", 1, true, dec!(5), dec!(2));
        let pool = ton_jetton_pool();
        let limit = dec!(2000000000);

        assert!(matches!(
            evaluate(&order, &pool, &Quote::new(limit)).unwrap(),
            Decision::Fulfil(_)
        ));

        let below = evaluate(&order, &pool, &Quote::new(dec!(1.8))).unwrap();
        let Decision::Fulfil(plan) = below else {
            panic!("expected fulfilment below the limit");
        };
        // Wants the jetton: 5 whole tokens = 5 * 10^6 smallest units,
        // paid in native coin
        assert_eq!(plan.amount.raw(), 5_000_000);
        assert_eq!(plan.kind, SwapKind::NativeToToken);
        assert_eq!(plan.to.address(), Some("EQAbc"));

        let above = evaluate(&order, &pool, &Quote::new(limit + dec!(1))).unwrap();
        assert_eq!(above, Decision::Hold);
    }

    #[test]
    fn sell_fulfils_at_or_above_limit() {
        // Selling TON (index 0) for the jetton. Limit: 1 * 10^9.
        let order = LimitOrder::new("TON/ABC", 0, false, dec!(3), dec!(1));
        let pool = ton_jetton_pool();
        let limit = dec!(1000000000);

        assert_eq!(
            evaluate(&order, &pool, &Quote::new(dec!(0.5))).unwrap(),
            Decision::Hold
        );
        assert!(matches!(
            evaluate(&order, &pool, &Quote::new(limit)).unwrap(),
            Decision::Fulfil(_)
        ));
        assert!(matches!(
            evaluate(&order, &pool, &Quote::new(limit + dec!(1))).unwrap(),
            Decision::Fulfil(_)
        ));
    }

    #[test]
    fn buying_native_selects_token_to_native() {
        // Buying TON (index 0), offering the jetton.
        let order = LimitOrder::new("TON/ABC", 0, true, dec!(5), dec!(2));
        let pool = ton_jetton_pool();

        let decision = evaluate(&order, &pool, &Quote::new(dec!(1))).unwrap();
        let Decision::Fulfil(plan) = decision else {
            panic!("expected fulfilment");
        };
        assert_eq!(plan.kind, SwapKind::TokenToNative);
        assert_eq!(plan.from.address(), Some("EQAbc"));
        // Wants TON: 5 * 10^9 smallest units
        assert_eq!(plan.amount.raw(), 5_000_000_000);
    }

    #[test]
    fn two_jettons_select_token_to_token() {
        let order = LimitOrder::new("ABC/XYZ", 0, true, dec!(1), dec!(10));
        let pool = jetton_jetton_pool();

        let decision = evaluate(&order, &pool, &Quote::new(dec!(1))).unwrap();
        let Decision::Fulfil(plan) = decision else {
            panic!("expected fulfilment");
        };
        assert_eq!(plan.kind, SwapKind::TokenToToken);
        assert_eq!(plan.from.address(), Some("EQXyz"));
        assert_eq!(plan.to.address(), Some("EQAbc"));
    }

    #[test]
    fn quote_base_is_one_whole_wanted_unit() {
        let order = LimitOrder::new("TON/ABC", 1, true, dec!(5), dec!(2));
        let pool = ton_jetton_pool();
        // Wants the jetton (6 decimals)
        assert_eq!(quote_base(&order, &pool).unwrap(), 1_000_000);
    }

    #[test]
    fn quote_base_rejects_out_of_range_pair_index() {
        let pool = ton_jetton_pool();

        let buy = LimitOrder::new("TON/ABC", 2, true, dec!(5), dec!(2));
        assert!(quote_base(&buy, &pool).is_err());

        let sell = LimitOrder::new("TON/ABC", 2, false, dec!(3), dec!(1));
        assert!(quote_base(&sell, &pool).is_err());
    }

    #[test]
    fn malformed_orders_never_fulfil() {
        let mut order = LimitOrder::new("TON/ABC", 2, true, dec!(5), dec!(2));
        let pool = ton_jetton_pool();
        assert!(evaluate(&order, &pool, &Quote::new(dec!(1))).is_err());

        order.main_coin = 0;
        order.amount = dec!(0);
        assert!(evaluate(&order, &pool, &Quote::new(dec!(1))).is_err());
    }

    #[test]
    fn evaluation_is_pure() {
        let order = LimitOrder::new("TON/ABC", 1, true, dec!(5), dec!(2));
        let pool = ton_jetton_pool();
        let quote = Quote::new(dec!(1.8));

        let first = evaluate(&order, &pool, &quote).unwrap();
        let second = evaluate(&order, &pool, &quote).unwrap();
        assert_eq!(first, second);
    }
}
