//! A priced batch of the tracked asset.

use crate::domain::{Decimal, LotId, Stamp};
use serde::{Deserialize, Serialize};

/// A batch of the asset acquired at one unit cost.
///
/// `0 <= remaining_quantity <= original_quantity` except transiently inside
/// a direct edit, which re-establishes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: LotId,
    /// Acquisition date and time; orders the lot for FIFO consumption.
    pub acquired: Stamp,
    /// Cost of one unit of the asset, in the currency it was bought with.
    pub unit_cost: Decimal,
    pub original_quantity: Decimal,
    pub remaining_quantity: Decimal,
}

impl Lot {
    /// A fresh lot with nothing consumed yet.
    pub fn new(id: LotId, acquired: Stamp, unit_cost: Decimal, quantity: Decimal) -> Self {
        Self {
            id,
            acquired,
            unit_cost,
            original_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    pub fn is_active(&self) -> bool {
        self.remaining_quantity.is_positive()
    }

    /// Cost basis of what is still held.
    pub fn remaining_cost(&self) -> Decimal {
        self.remaining_quantity * self.unit_cost
    }

    pub fn consumed_quantity(&self) -> Decimal {
        self.original_quantity - self.remaining_quantity
    }
}
