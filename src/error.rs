use crate::domain::{Decimal, EventId, LotId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("Invalid time (expected HH:MM): {0}")]
    InvalidTime(String),
    #[error("Rate must be positive, got {0}")]
    NonPositiveRate(Decimal),
    #[error("Quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),
    #[error("Lot not found: {0}")]
    LotNotFound(LotId),
    #[error("Trade not found: {0}")]
    TradeNotFound(EventId),
    #[error("Movement not found: {0}")]
    MovementNotFound(EventId),
    #[error("Trade already recorded: {0}")]
    DuplicateTrade(EventId),
    #[error("Movement already recorded: {0}")]
    DuplicateMovement(EventId),
    #[error("Snapshot I/O error: {0}")]
    SnapshotIo(#[from] std::io::Error),
    #[error("Snapshot format error: {0}")]
    SnapshotFormat(#[from] serde_json::Error),
}
