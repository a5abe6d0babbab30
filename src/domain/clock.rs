//! Civil "now" in a fixed UTC offset (no daylight saving).

use crate::domain::Stamp;
use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

/// Uruguay civil time, UTC-3.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilClock {
    offset: FixedOffset,
}

impl CivilClock {
    /// `None` when the offset is outside ±24h.
    pub fn new(utc_offset_minutes: i32) -> Option<Self> {
        utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current civil stamp, truncated to the minute.
    pub fn now(&self) -> Stamp {
        self.stamp_at(Utc::now())
    }

    /// Civil stamp of an instant, truncated to the minute.
    pub fn stamp_at(&self, instant: DateTime<Utc>) -> Stamp {
        let local = instant.with_timezone(&self.offset);
        let time = local
            .time()
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0));
        Stamp::new(local.date_naive(), time)
    }
}

impl Default for CivilClock {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_MINUTES).unwrap_or(Self { offset: Utc.fix() })
    }
}
