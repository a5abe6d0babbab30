//! Asset quantities implied by a trade.

use crate::domain::numeric::{truncate, QUANTITY_DP};
use crate::domain::{Decimal, Side, Trade};
use serde::Serialize;

/// Gross, commission and net asset quantities of a trade.
///
/// `net` is what enters inventory on a buy (gross minus commission) or what
/// leaves it on a sell (gross plus commission).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuote {
    pub side: Side,
    pub gross: Decimal,
    pub commission: Decimal,
    pub net: Decimal,
}

impl TradeQuote {
    /// Derive quantities from a gross asset quantity and a commission percentage.
    pub fn from_quantity(side: Side, gross: Decimal, commission_pct: Decimal) -> Self {
        let commission = truncate(gross * commission_pct / Decimal::hundred(), QUANTITY_DP);
        let net = match side {
            Side::Buy => gross - commission,
            Side::Sell => gross + commission,
        };
        Self {
            side,
            gross,
            commission,
            net,
        }
    }

    /// Preview for a fiat amount at a rate. Returns `None` for a non-positive rate.
    pub fn derive(side: Side, amount: Decimal, rate: Decimal, commission_pct: Decimal) -> Option<Self> {
        if !rate.is_positive() {
            return None;
        }
        let gross = amount.checked_div(rate)?;
        Some(Self::from_quantity(side, gross, commission_pct))
    }

    /// Quote for a recorded trade, with `commission_pct` already resolved.
    pub fn for_trade(trade: &Trade, commission_pct: Decimal) -> Self {
        Self::from_quantity(trade.side, trade.quantity(), commission_pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn buy_subtracts_truncated_commission() {
        // 10000 / 39.5 = 253.164556..., 0.14% of that = 0.35443..., floored to 0.35
        let q = TradeQuote::derive(Side::Buy, d("10000"), d("39.5"), d("0.14")).unwrap();
        assert_eq!(q.commission, d("0.35"));
        assert_eq!(q.net, q.gross - d("0.35"));
    }

    #[test]
    fn sell_adds_commission() {
        let q = TradeQuote::derive(Side::Sell, d("4500"), d("45"), d("1")).unwrap();
        assert_eq!(q.gross, d("100"));
        assert_eq!(q.commission, d("1"));
        assert_eq!(q.net, d("101"));
    }

    #[test]
    fn commission_is_never_rounded_up() {
        let q = TradeQuote::from_quantity(Side::Buy, d("1012.9"), d("1"));
        assert_eq!(q.commission, d("10.12"));
    }

    #[test]
    fn zero_rate_has_no_quote() {
        assert!(TradeQuote::derive(Side::Buy, d("100"), Decimal::zero(), d("0.14")).is_none());
    }
}
