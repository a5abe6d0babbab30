//! Pure computation engine for the FIFO lot ledger.
//!
//! - `lot_store`: ordered lots, merge-on-insert and FIFO consumption
//! - `ledger`: incremental mutators over lots and last trade rates
//! - `recompute`: authoritative rebuild from the full history
//! - `summary`: read-side inventory figures

pub mod ledger;
pub mod lot_store;
pub mod recompute;
pub mod summary;

pub use ledger::{Acquisition, CommissionPolicy, LedgerState, RateBook, TradeRates};
pub use lot_store::{Consumption, LotEdit, LotStore};
pub use recompute::{recompute_all, replay_into, RebuildTrigger, Recomputation};
pub use summary::InventorySummary;
