//! Persisted shape of a ledger: history plus derived state.
//!
//! The file is plain JSON. Decimals are strings so nothing is lost on a
//! round-trip.

use crate::domain::History;
use crate::engine::LedgerState;
use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub state: LedgerState,
}

impl LedgerSnapshot {
    pub fn new(history: History, state: LedgerState) -> Self {
        Self { history, state }
    }

    /// Read a snapshot; a missing file is an empty ledger.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let snapshot: Self = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            trades = snapshot.history.trades.len(),
            movements = snapshot.history.movements.len(),
            lots = snapshot.state.lots().len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot through a temp file and rename, creating parent dirs.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), LedgerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), "Snapshot written");
        Ok(())
    }
}
