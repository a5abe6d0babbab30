//! Domain primitives: Side, Currency, identifiers and civil date/time stamps.

use crate::error::LedgerError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Trade side: Buy or Sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Asset enters inventory.
    Buy,
    /// Asset leaves inventory.
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Fiat currency a trade is settled in.
///
/// Each currency keeps its own last purchase/sale rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Local currency (Uruguayan peso).
    #[default]
    Uyu,
    Usd,
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Currency::Uyu => write!(f, "UYU"),
            Currency::Usd => write!(f, "USD"),
        }
    }
}

/// Opaque lot identifier. Used for lookup and edits, never for ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotId(pub String);

impl LotId {
    pub fn new(id: impl Into<String>) -> Self {
        LotId(id.into())
    }

    /// A fresh random identifier for lots created by direct edit.
    pub fn generate() -> Self {
        LotId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a trade or movement in the history.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    pub fn generate() -> Self {
        EventId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lots inherit the id of the event that created them.
impl From<&EventId> for LotId {
    fn from(id: &EventId) -> Self {
        LotId(id.0.clone())
    }
}

/// Civil date plus optional time-of-day (fixed UTC-3 calendar).
///
/// A missing time sorts as start of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp {
    pub date: NaiveDate,
    #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
}

impl Stamp {
    pub fn new(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        Self { date, time }
    }

    /// Parse `YYYY-MM-DD` and an optional `HH:MM`.
    pub fn parse(date: &str, time: Option<&str>) -> Result<Self, LedgerError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| LedgerError::InvalidDate(date.to_string()))?;
        let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => Some(hhmm::parse(t)?),
            None => None,
        };
        Ok(Self { date, time })
    }

    /// Time-of-day used for ordering (`00:00` when absent).
    pub fn time_or_midnight(&self) -> NaiveTime {
        self.time.unwrap_or(NaiveTime::MIN)
    }

    /// `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM`, defaulted to `00:00`.
    pub fn time_string(&self) -> String {
        self.time_or_midnight().format(hhmm::FORMAT).to_string()
    }
}

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date_string(), self.time_string())
    }
}

/// `HH:MM` serde for optional times.
pub(crate) mod hhmm {
    use crate::error::LedgerError;
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Result<NaiveTime, LedgerError> {
        NaiveTime::parse_from_str(s, FORMAT).map_err(|_| LedgerError::InvalidTime(s.to_string()))
    }

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.serialize_str(&t.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse(s).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
