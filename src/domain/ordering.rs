//! Canonical event ordering for replay.

use crate::domain::{Direction, EventId, History, Movement, Stamp, Trade};
use chrono::{NaiveDate, NaiveTime};

/// Ordering key for timeline events and lots.
///
/// Ordering: date -> time (missing = 00:00) -> source position.
/// Date and time compare exactly like the concatenated `"YYYY-MM-DDHH:MM"`
/// strings would; `seq` pins equal stamps to their position in the source
/// history so the result never depends on sort stability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimelineKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub seq: usize,
}

impl TimelineKey {
    pub fn new(stamp: &Stamp, seq: usize) -> Self {
        Self {
            date: stamp.date,
            time: stamp.time_or_midnight(),
            seq,
        }
    }
}

/// One replayable step of the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent<'a> {
    Trade(&'a Trade),
    Inflow(&'a Movement),
    Outflow(&'a Movement),
}

impl<'a> TimelineEvent<'a> {
    pub fn stamp(&self) -> &'a Stamp {
        match self {
            TimelineEvent::Trade(t) => &t.stamp,
            TimelineEvent::Inflow(m) | TimelineEvent::Outflow(m) => &m.stamp,
        }
    }

    pub fn id(&self) -> &'a EventId {
        match self {
            TimelineEvent::Trade(t) => &t.id,
            TimelineEvent::Inflow(m) | TimelineEvent::Outflow(m) => &m.id,
        }
    }

    fn from_movement(m: &'a Movement) -> Self {
        match m.direction {
            Direction::Inflow => TimelineEvent::Inflow(m),
            Direction::Outflow => TimelineEvent::Outflow(m),
        }
    }
}

/// Build the sorted replay timeline.
///
/// Source order is all trades (history order) followed by asset movements
/// (history order); bank movements are left out.
pub fn build_timeline(history: &History) -> Vec<TimelineEvent<'_>> {
    let mut keyed: Vec<(TimelineKey, TimelineEvent<'_>)> = history
        .trades
        .iter()
        .map(TimelineEvent::Trade)
        .chain(history.asset_movements().map(TimelineEvent::from_movement))
        .enumerate()
        .map(|(seq, ev)| (TimelineKey::new(ev.stamp(), seq), ev))
        .collect();

    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, ev)| ev).collect()
}
