use crate::domain::{normalize, subtract_clamped, Decimal, Lot, LotId, Stamp, TimelineKey};
use crate::error::LedgerError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Result of consuming quantity from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Consumption {
    /// Realized gain; zero when no sale rate was given.
    pub gain: Decimal,
    /// Quantity actually taken from lots.
    pub consumed: Decimal,
    /// Requested quantity no lot could cover. Dropped, never an error.
    pub shortfall: Decimal,
}

/// Fields a user may change on an existing lot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotEdit {
    pub unit_cost: Decimal,
    pub remaining_quantity: Decimal,
    pub date: Option<NaiveDate>,
}

/// The ordered set of lots.
///
/// Store order is insertion order; FIFO order is derived on demand from the
/// acquisition stamp with store order breaking ties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotStore {
    lots: Vec<Lot>,
}

impl LotStore {
    pub fn new() -> Self {
        Self { lots: Vec::new() }
    }

    pub fn from_lots(lots: Vec<Lot>) -> Self {
        Self { lots }
    }

    /// All lots in store order, including depleted ones.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    pub fn get(&self, id: &LotId) -> Option<&Lot> {
        self.lots.iter().find(|l| &l.id == id)
    }

    /// Drop every lot.
    pub fn clear(&mut self) {
        self.lots.clear();
    }

    /// Add quantity at a unit cost, merging into an active lot with the same cost.
    ///
    /// A merged lot keeps its own stamp and position. Returns the id of the lot
    /// that received the quantity, or `None` when the quantity is not positive.
    pub fn add_or_merge_lot(
        &mut self,
        id: LotId,
        acquired: Stamp,
        unit_cost: Decimal,
        quantity: Decimal,
    ) -> Option<LotId> {
        if !quantity.is_positive() {
            tracing::debug!(lot = %id, quantity = %quantity, "Ignoring non-positive acquisition");
            return None;
        }

        if let Some(existing) = self
            .lots
            .iter_mut()
            .find(|l| l.unit_cost == unit_cost && l.is_active())
        {
            existing.original_quantity += quantity;
            existing.remaining_quantity += quantity;
            tracing::debug!(lot = %existing.id, unit_cost = %unit_cost, quantity = %quantity, "Merged into existing lot");
            return Some(existing.id.clone());
        }

        tracing::debug!(lot = %id, unit_cost = %unit_cost, quantity = %quantity, "Opened lot");
        self.lots.push(Lot::new(id.clone(), acquired, unit_cost, quantity));
        Some(id)
    }

    /// Store indices of active lots in FIFO order.
    fn fifo_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .lots
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_active())
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| TimelineKey::new(&self.lots[i].acquired, i));
        indices
    }

    /// Active lots, oldest first.
    pub fn active_lots_fifo(&self) -> Vec<&Lot> {
        self.fifo_indices().into_iter().map(|i| &self.lots[i]).collect()
    }

    /// Take `quantity` from the oldest lots first.
    ///
    /// With a `sale_rate`, each slice contributes `consumed * (sale_rate - unit_cost)`
    /// to the gain. Lot balances and the outstanding need are normalized after
    /// every slice; whatever the lots cannot cover is dropped.
    pub fn consume_fifo(&mut self, quantity: Decimal, sale_rate: Option<Decimal>) -> Consumption {
        let mut need = quantity;
        let mut gain = Decimal::zero();
        let mut consumed_total = Decimal::zero();

        for i in self.fifo_indices() {
            if !need.is_positive() {
                break;
            }
            let lot = &mut self.lots[i];
            let consumed = lot.remaining_quantity.min(need);
            if let Some(rate) = sale_rate {
                gain += consumed * (rate - lot.unit_cost);
            }
            lot.remaining_quantity = subtract_clamped(lot.remaining_quantity, consumed);
            need = subtract_clamped(need, consumed);
            consumed_total += consumed;
        }

        if need.is_positive() {
            tracing::warn!(requested = %quantity, shortfall = %need, "Inventory exhausted, dropping shortfall");
        }

        Consumption {
            gain,
            consumed: consumed_total,
            shortfall: need,
        }
    }

    /// Append a lot as-is, without merging.
    pub fn insert_lot(&mut self, lot: Lot) {
        self.lots.push(lot);
    }

    /// Overwrite cost, remaining quantity and (optionally) date of a lot.
    ///
    /// The original quantity grows to cover the new remaining quantity.
    pub fn edit_lot(&mut self, id: &LotId, edit: LotEdit) -> Result<&Lot, LedgerError> {
        if !edit.unit_cost.is_positive() {
            return Err(LedgerError::NonPositiveRate(edit.unit_cost));
        }
        if edit.remaining_quantity.is_negative() {
            return Err(LedgerError::NonPositiveQuantity(edit.remaining_quantity));
        }
        let lot = self
            .lots
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| LedgerError::LotNotFound(id.clone()))?;

        lot.unit_cost = edit.unit_cost;
        lot.remaining_quantity = edit.remaining_quantity;
        lot.original_quantity = lot.original_quantity.max(edit.remaining_quantity);
        if let Some(date) = edit.date {
            lot.acquired.date = date;
        }
        Ok(&*lot)
    }

    pub fn remove_lot(&mut self, id: &LotId) -> Result<Lot, LedgerError> {
        let idx = self
            .lots
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| LedgerError::LotNotFound(id.clone()))?;
        Ok(self.lots.remove(idx))
    }

    /// Sum of remaining quantities, normalized.
    pub fn total_remaining(&self) -> Decimal {
        normalize(self.lots.iter().map(|l| l.remaining_quantity).sum())
    }
}
