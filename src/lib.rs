pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod snapshot;

pub use config::Config;
pub use domain::{
    Currency, Decimal, Direction, EventId, History, Lot, LotId, Movement, Side, Stamp, Trade,
    TradeQuote,
};
pub use engine::{
    recompute_all, CommissionPolicy, InventorySummary, LedgerState, LotEdit, Recomputation,
};
pub use error::LedgerError;
pub use orchestration::LedgerSession;
pub use snapshot::LedgerSnapshot;
