use crate::domain::{
    Currency, Decimal, Direction, EventId, Lot, LotId, Movement, Side, Stamp, TimelineEvent,
    Trade, TradeQuote,
};
use crate::engine::lot_store::{LotEdit, LotStore};
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Platform commission charged when a trade does not carry its own percentage.
pub const DEFAULT_COMMISSION_PCT: &str = "0.14";

/// How platform commissions are resolved for trades.
///
/// Each settlement currency has its own default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionPolicy {
    pub uyu_pct: Decimal,
    pub usd_pct: Decimal,
}

impl CommissionPolicy {
    pub fn new(uyu_pct: Decimal, usd_pct: Decimal) -> Self {
        Self { uyu_pct, usd_pct }
    }

    /// Same default for both currencies.
    pub fn uniform(pct: Decimal) -> Self {
        Self::new(pct, pct)
    }

    pub fn default_for(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Uyu => self.uyu_pct,
            Currency::Usd => self.usd_pct,
        }
    }

    /// The trade's own percentage (zero included) or its currency's default.
    pub fn pct_for(&self, trade: &Trade) -> Decimal {
        trade
            .commission_pct
            .unwrap_or_else(|| self.default_for(trade.currency))
    }

    pub fn quote(&self, trade: &Trade) -> TradeQuote {
        TradeQuote::for_trade(trade, self.pct_for(trade))
    }
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self::uniform(Decimal::from_str_canonical(DEFAULT_COMMISSION_PCT).unwrap_or_default())
    }
}

/// Last seen trade rates for one currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale: Option<Decimal>,
}

/// Last trade rates per currency.
///
/// Only the local purchase rate feeds back into the engine (as the default
/// cost of deposits); the rest is kept for callers prefilling forms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBook {
    #[serde(default)]
    pub uyu: TradeRates,
    #[serde(default)]
    pub usd: TradeRates,
}

impl RateBook {
    pub fn for_currency(&self, currency: Currency) -> &TradeRates {
        match currency {
            Currency::Uyu => &self.uyu,
            Currency::Usd => &self.usd,
        }
    }

    fn for_currency_mut(&mut self, currency: Currency) -> &mut TradeRates {
        match currency {
            Currency::Uyu => &mut self.uyu,
            Currency::Usd => &mut self.usd,
        }
    }
}

/// Parameters of an acquisition entering the lot store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub id: LotId,
    pub stamp: Stamp,
    pub unit_cost: Decimal,
    pub quantity: Decimal,
}

/// Lots plus last trade rates.
///
/// Every mutation goes through the methods below; lots are only handed out
/// as shared references or clones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    #[serde(default)]
    lots: LotStore,
    #[serde(default)]
    rates: RateBook,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(lots: LotStore, rates: RateBook) -> Self {
        Self { lots, rates }
    }

    pub fn lots(&self) -> &LotStore {
        &self.lots
    }

    pub fn rates(&self) -> &RateBook {
        &self.rates
    }

    /// Discard all lots and rates.
    pub fn reset(&mut self) {
        self.lots.clear();
        self.rates = RateBook::default();
    }

    /// Add purchased (or deposited) quantity at a unit cost.
    ///
    /// Non-positive quantities are ignored and yield `None`.
    pub fn apply_purchase(&mut self, acquisition: Acquisition) -> Option<LotId> {
        self.lots.add_or_merge_lot(
            acquisition.id,
            acquisition.stamp,
            acquisition.unit_cost,
            acquisition.quantity,
        )
    }

    /// Sell `quantity` at `rate`, returning the realized gain.
    pub fn apply_sale(&mut self, quantity: Decimal, rate: Decimal) -> Decimal {
        self.lots.consume_fifo(quantity, Some(rate)).gain
    }

    /// Deposit asset. The unit cost is the movement's reference rate, else the
    /// last local purchase rate, else 1.
    pub fn apply_inflow(&mut self, movement: &Movement) -> Option<LotId> {
        let unit_cost = self.inflow_rate(movement);
        self.apply_purchase(Acquisition {
            id: LotId::from(&movement.id),
            stamp: movement.stamp,
            unit_cost,
            quantity: movement.amount,
        })
    }

    /// Withdraw asset without attributing any gain.
    pub fn apply_outflow(&mut self, quantity: Decimal) {
        self.lots.consume_fifo(quantity, None);
    }

    pub fn inflow_rate(&self, movement: &Movement) -> Decimal {
        movement
            .explicit_rate()
            .or(self.rates.uyu.purchase)
            .unwrap_or_else(Decimal::one)
    }

    /// Apply a trade and return its gain.
    ///
    /// Buys add the net quantity at the trade rate and report minus the bank
    /// commission; sells consume gross plus commission.
    pub fn apply_trade(&mut self, trade: &Trade, policy: &CommissionPolicy) -> Decimal {
        let quote = policy.quote(trade);
        match trade.side {
            Side::Buy => {
                self.apply_purchase(Acquisition {
                    id: LotId::from(&trade.id),
                    stamp: trade.stamp,
                    unit_cost: trade.rate,
                    quantity: quote.net,
                });
                self.rates.for_currency_mut(trade.currency).purchase = Some(trade.rate);
                Decimal::zero() - trade.bank_commission.unwrap_or_default()
            }
            Side::Sell => {
                let gain = self.apply_sale(quote.net, trade.rate);
                self.rates.for_currency_mut(trade.currency).sale = Some(trade.rate);
                gain
            }
        }
    }

    /// Apply an asset movement. Bank movements leave the state untouched.
    pub fn apply_movement(&mut self, movement: &Movement) {
        if !movement.is_asset() {
            return;
        }
        match movement.direction {
            Direction::Inflow => {
                self.apply_inflow(movement);
            }
            Direction::Outflow => self.apply_outflow(movement.amount),
        }
    }

    /// Apply one replay step; trades yield their computed gain.
    pub fn apply_event(
        &mut self,
        event: TimelineEvent<'_>,
        policy: &CommissionPolicy,
    ) -> Option<(EventId, Decimal)> {
        match event {
            TimelineEvent::Trade(trade) => {
                let gain = self.apply_trade(trade, policy);
                Some((trade.id.clone(), gain))
            }
            TimelineEvent::Inflow(m) => {
                self.apply_inflow(m);
                None
            }
            TimelineEvent::Outflow(m) => {
                self.apply_outflow(m.amount);
                None
            }
        }
    }

    /// Append a lot entered by hand. Never merged.
    pub fn insert_manual_lot(
        &mut self,
        stamp: Stamp,
        unit_cost: Decimal,
        quantity: Decimal,
    ) -> Result<LotId, LedgerError> {
        if !unit_cost.is_positive() {
            return Err(LedgerError::NonPositiveRate(unit_cost));
        }
        if quantity.is_negative() {
            return Err(LedgerError::NonPositiveQuantity(quantity));
        }
        let id = LotId::generate();
        self.lots
            .insert_lot(Lot::new(id.clone(), stamp, unit_cost, quantity));
        Ok(id)
    }

    pub fn edit_lot(&mut self, id: &LotId, edit: LotEdit) -> Result<&Lot, LedgerError> {
        self.lots.edit_lot(id, edit)
    }

    pub fn remove_lot(&mut self, id: &LotId) -> Result<Lot, LedgerError> {
        self.lots.remove_lot(id)
    }

    /// SHA-256 over lots (store order) and rates; equal states hash equal.
    pub fn fingerprint(&self) -> String {
        fn hash_var(hasher: &mut Sha256, data: &str) {
            hasher.update((data.len() as u32).to_le_bytes());
            hasher.update(data.as_bytes());
        }

        fn hash_opt(hasher: &mut Sha256, value: Option<Decimal>) {
            match value {
                Some(v) => hash_var(hasher, &v.to_canonical_string()),
                None => hash_var(hasher, "-"),
            }
        }

        let mut hasher = Sha256::new();
        hasher.update((self.lots.len() as u64).to_le_bytes());
        for lot in self.lots.lots() {
            hash_var(&mut hasher, lot.id.as_str());
            hash_var(&mut hasher, &lot.acquired.to_string());
            hasher.update([u8::from(lot.acquired.time.is_some())]);
            hash_var(&mut hasher, &lot.unit_cost.to_canonical_string());
            hash_var(&mut hasher, &lot.original_quantity.to_canonical_string());
            hash_var(&mut hasher, &lot.remaining_quantity.to_canonical_string());
        }
        for rates in [&self.rates.uyu, &self.rates.usd] {
            hash_opt(&mut hasher, rates.purchase);
            hash_opt(&mut hasher, rates.sale);
        }
        hex::encode(hasher.finalize())
    }
}
