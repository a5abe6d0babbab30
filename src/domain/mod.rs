//! Domain types and determinism layer for the lot ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper and the rounding policy
//! - Domain primitives: Side, Currency, LotId, EventId, Stamp
//! - Lots, trades, movements and the event history
//! - Canonical timeline ordering for deterministic replay

pub mod clock;
pub mod decimal;
pub mod event;
pub mod lot;
pub mod numeric;
pub mod ordering;
pub mod primitives;
pub mod quote;

pub use clock::CivilClock;
pub use decimal::Decimal;
pub use event::{Account, Direction, History, Movement, Trade};
pub use lot::Lot;
pub use numeric::{normalize, subtract_clamped, truncate};
pub use ordering::{build_timeline, TimelineEvent, TimelineKey};
pub use primitives::{Currency, EventId, LotId, Side, Stamp};
pub use quote::TradeQuote;
