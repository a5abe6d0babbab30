//! Read-side figures derived from the active lots.

use crate::domain::{normalize, Decimal, Lot};
use crate::engine::LedgerState;
use serde::Serialize;

/// Inventory figures for display and reporting. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_quantity: Decimal,
    pub active_lot_count: usize,
    /// Lowest unit cost among active lots; the oldest wins a tie.
    pub cheapest_lot: Option<Lot>,
    /// What the held quantity cost: sum of remaining * unit cost.
    pub cost_value: Decimal,
    /// Active lots, oldest first.
    pub active_lots: Vec<Lot>,
}

impl LedgerState {
    /// Copies of the active lots, oldest first.
    pub fn active_lots(&self) -> Vec<Lot> {
        self.lots().active_lots_fifo().into_iter().cloned().collect()
    }

    pub fn total_quantity(&self) -> Decimal {
        normalize(
            self.lots()
                .active_lots_fifo()
                .iter()
                .map(|l| l.remaining_quantity)
                .sum(),
        )
    }

    pub fn cheapest_lot(&self) -> Option<Lot> {
        self.lots()
            .active_lots_fifo()
            .into_iter()
            .fold(None::<&Lot>, |best, lot| match best {
                Some(b) if b.unit_cost <= lot.unit_cost => Some(b),
                _ => Some(lot),
            })
            .cloned()
    }

    pub fn cost_value(&self) -> Decimal {
        self.lots()
            .active_lots_fifo()
            .iter()
            .map(|l| l.remaining_cost())
            .sum()
    }

    pub fn summary(&self) -> InventorySummary {
        let active_lots = self.active_lots();
        InventorySummary {
            total_quantity: self.total_quantity(),
            active_lot_count: active_lots.len(),
            cheapest_lot: self.cheapest_lot(),
            cost_value: self.cost_value(),
            active_lots,
        }
    }
}
