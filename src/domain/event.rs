//! Historical events: trades and external movements.

use crate::domain::{Currency, Decimal, EventId, Side, Stamp};
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};

/// A buy or sell of the asset against fiat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: EventId,
    pub side: Side,
    pub stamp: Stamp,
    /// Fiat paid (buy) or received (sell).
    pub amount: Decimal,
    /// Fiat per unit of the asset.
    pub rate: Decimal,
    #[serde(default)]
    pub currency: Currency,
    /// Platform commission in percent. `None` falls back to the configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_pct: Option<Decimal>,
    /// Fiat charged by the bank on a buy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_commission: Option<Decimal>,
    /// Realized gain. `None` means the ledger has not been computed for this trade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<Decimal>,
}

impl Trade {
    /// Create a trade; the rate must be positive so `amount / rate` is defined.
    pub fn new(
        id: EventId,
        side: Side,
        stamp: Stamp,
        amount: Decimal,
        rate: Decimal,
        currency: Currency,
    ) -> Result<Self, LedgerError> {
        if !rate.is_positive() {
            return Err(LedgerError::NonPositiveRate(rate));
        }
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveQuantity(amount));
        }
        Ok(Self {
            id,
            side,
            stamp,
            amount,
            rate,
            currency,
            commission_pct: None,
            bank_commission: None,
            gain: None,
        })
    }

    pub fn with_commission_pct(mut self, pct: Decimal) -> Self {
        self.commission_pct = Some(pct);
        self
    }

    /// Bank commissions only apply to buys; ignored on sells.
    pub fn with_bank_commission(mut self, commission: Decimal) -> Self {
        if self.side == Side::Buy {
            self.bank_commission = Some(commission);
        }
        self
    }

    /// Gross asset quantity: `amount / rate`.
    ///
    /// A zero rate (only reachable through deserialized data) yields zero.
    pub fn quantity(&self) -> Decimal {
        match self.amount.checked_div(self.rate) {
            Some(q) => q,
            None => {
                tracing::warn!(trade = %self.id, rate = %self.rate, "Trade has a zero rate, treating quantity as 0");
                Decimal::zero()
            }
        }
    }
}

/// Direction of an external movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inflow,
    Outflow,
}

/// Which ledger a movement belongs to.
///
/// Bank movements only touch bank balances and never reach the lot store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Account {
    Asset,
    Bank { name: String },
}

/// A deposit or withdrawal outside of trading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    pub id: EventId,
    pub direction: Direction,
    pub account: Account,
    pub stamp: Stamp,
    /// Asset quantity for asset movements, fiat for bank movements.
    pub amount: Decimal,
    /// Unit cost assigned to deposited asset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Movement {
    /// Deposit of the asset; the quantity must be positive.
    pub fn asset_inflow(
        id: EventId,
        stamp: Stamp,
        quantity: Decimal,
        reference_rate: Option<Decimal>,
    ) -> Result<Self, LedgerError> {
        if !quantity.is_positive() {
            return Err(LedgerError::NonPositiveQuantity(quantity));
        }
        Ok(Self {
            id,
            direction: Direction::Inflow,
            account: Account::Asset,
            stamp,
            amount: quantity,
            reference_rate,
            description: None,
        })
    }

    /// Withdrawal of the asset; the quantity must be positive.
    pub fn asset_outflow(id: EventId, stamp: Stamp, quantity: Decimal) -> Result<Self, LedgerError> {
        if !quantity.is_positive() {
            return Err(LedgerError::NonPositiveQuantity(quantity));
        }
        Ok(Self {
            id,
            direction: Direction::Outflow,
            account: Account::Asset,
            stamp,
            amount: quantity,
            reference_rate: None,
            description: None,
        })
    }

    pub fn bank(
        id: EventId,
        direction: Direction,
        bank: impl Into<String>,
        stamp: Stamp,
        amount: Decimal,
    ) -> Self {
        Self {
            id,
            direction,
            account: Account::Bank { name: bank.into() },
            stamp,
            amount,
            reference_rate: None,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_asset(&self) -> bool {
        matches!(self.account, Account::Asset)
    }

    /// Reference rate when one was actually given (zero counts as absent).
    pub fn explicit_rate(&self) -> Option<Decimal> {
        self.reference_rate.filter(|r| r.is_positive())
    }
}

/// Complete event history, in recording order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub movements: Vec<Movement>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty() && self.movements.is_empty()
    }

    /// A trade without a computed gain means stored state predates it.
    pub fn needs_recompute(&self) -> bool {
        self.trades.iter().any(|t| t.gain.is_none())
    }

    pub fn asset_movements(&self) -> impl Iterator<Item = &Movement> {
        self.movements.iter().filter(|m| m.is_asset())
    }

    pub fn trade(&self, id: &EventId) -> Option<&Trade> {
        self.trades.iter().find(|t| &t.id == id)
    }

    pub fn movement(&self, id: &EventId) -> Option<&Movement> {
        self.movements.iter().find(|m| &m.id == id)
    }

    pub fn remove_trade(&mut self, id: &EventId) -> Option<Trade> {
        let idx = self.trades.iter().position(|t| &t.id == id)?;
        Some(self.trades.remove(idx))
    }

    pub fn remove_movement(&mut self, id: &EventId) -> Option<Movement> {
        let idx = self.movements.iter().position(|m| &m.id == id)?;
        Some(self.movements.remove(idx))
    }

    /// Write recomputed gains back onto their trades.
    pub fn record_gains<'a, I>(&mut self, gains: I)
    where
        I: IntoIterator<Item = (&'a EventId, &'a Decimal)>,
    {
        for (id, gain) in gains {
            if let Some(trade) = self.trades.iter_mut().find(|t| &t.id == id) {
                trade.gain = Some(*gain);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn stamp() -> Stamp {
        Stamp::parse("2024-05-01", Some("12:00")).unwrap()
    }

    #[test]
    fn test_trade_rejects_non_positive_rate() {
        let err = Trade::new(
            EventId::new("t1"),
            Side::Buy,
            stamp(),
            d("1000"),
            Decimal::zero(),
            Currency::Uyu,
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::NonPositiveRate(_)));
    }

    #[test]
    fn test_trade_quantity_is_amount_over_rate() {
        let trade = Trade::new(
            EventId::new("t1"),
            Side::Buy,
            stamp(),
            d("4000"),
            d("40"),
            Currency::Uyu,
        )
        .unwrap();
        assert_eq!(trade.quantity(), d("100"));
    }

    #[test]
    fn test_deserialized_zero_rate_yields_zero_quantity() {
        let json = r#"{"id":"t1","side":"buy","stamp":{"date":"2024-05-01"},"amount":"10","rate":"0"}"#;
        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.quantity(), Decimal::zero());
        assert_eq!(trade.currency, Currency::Uyu);
        assert_eq!(trade.gain, None);
    }

    #[test]
    fn test_bank_commission_ignored_on_sell() {
        let sell = Trade::new(
            EventId::new("t1"),
            Side::Sell,
            stamp(),
            d("1000"),
            d("40"),
            Currency::Uyu,
        )
        .unwrap()
        .with_bank_commission(d("50"));
        assert_eq!(sell.bank_commission, None);
    }

    #[test]
    fn test_explicit_rate_treats_zero_as_absent() {
        let mut m = Movement::asset_inflow(EventId::new("m1"), stamp(), d("10"), Some(d("0"))).unwrap();
        assert_eq!(m.explicit_rate(), None);
        m.reference_rate = Some(d("41"));
        assert_eq!(m.explicit_rate(), Some(d("41")));
    }

    #[test]
    fn test_asset_movements_reject_non_positive_quantity() {
        for qty in ["0", "-50"] {
            assert!(matches!(
                Movement::asset_inflow(EventId::new("m1"), stamp(), d(qty), Some(d("40"))),
                Err(LedgerError::NonPositiveQuantity(_))
            ));
            assert!(matches!(
                Movement::asset_outflow(EventId::new("m2"), stamp(), d(qty)),
                Err(LedgerError::NonPositiveQuantity(_))
            ));
        }
    }

    #[test]
    fn test_history_needs_recompute_when_gain_missing() {
        let mut history = History::new();
        assert!(!history.needs_recompute());

        let trade = Trade::new(
            EventId::new("t1"),
            Side::Buy,
            stamp(),
            d("1000"),
            d("40"),
            Currency::Uyu,
        )
        .unwrap();
        history.trades.push(trade);
        assert!(history.needs_recompute());

        let gains = vec![(EventId::new("t1"), d("0"))];
        history.record_gains(gains.iter().map(|(id, g)| (id, g)));
        assert!(!history.needs_recompute());
    }

    #[test]
    fn test_history_asset_movements_skip_bank() {
        let mut history = History::new();
        history
            .movements
            .push(Movement::bank(EventId::new("b1"), Direction::Inflow, "BROU", stamp(), d("500")));
        history
            .movements
            .push(Movement::asset_outflow(EventId::new("a1"), stamp(), d("5")).unwrap());
        let ids: Vec<_> = history.asset_movements().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a1"]);
    }

    #[test]
    fn test_account_json_is_tagged() {
        let m = Movement::bank(EventId::new("b1"), Direction::Outflow, "Itau", stamp(), d("5"));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["account"]["kind"], "bank");
        assert_eq!(json["account"]["name"], "Itau");
        assert_eq!(json["direction"], "outflow");
    }
}
