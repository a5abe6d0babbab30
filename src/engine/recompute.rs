//! Full rebuild of the ledger from the event history.

use crate::domain::{build_timeline, Decimal, EventId, History};
use crate::engine::{CommissionPolicy, LedgerState};
use std::fmt;

/// Why a rebuild was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildTrigger {
    /// A trade or asset movement was removed from the history.
    EventDeleted,
    /// Someone asked for it.
    Manual,
    /// At least one trade has no computed gain, so stored lots are stale.
    MissingGain,
    /// A new event sorts before events already applied.
    OutOfOrder,
}

impl fmt::Display for RebuildTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildTrigger::EventDeleted => write!(f, "event_deleted"),
            RebuildTrigger::Manual => write!(f, "manual"),
            RebuildTrigger::MissingGain => write!(f, "missing_gain"),
            RebuildTrigger::OutOfOrder => write!(f, "out_of_order"),
        }
    }
}

/// Output of a rebuild: the fresh state and the gain of every trade, in replay order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recomputation {
    pub state: LedgerState,
    pub gains: Vec<(EventId, Decimal)>,
}

impl Recomputation {
    pub fn gain_of(&self, id: &EventId) -> Option<Decimal> {
        self.gains.iter().find(|(g, _)| g == id).map(|(_, gain)| *gain)
    }
}

/// Replay the whole history against an empty state.
///
/// Deterministic and total: the same history always yields the same state,
/// and there is no history it fails on.
pub fn recompute_all(history: &History, policy: &CommissionPolicy) -> Recomputation {
    let mut state = LedgerState::new();
    let gains = replay_into(&mut state, history, policy);
    Recomputation { state, gains }
}

/// Reset `state` and replay `history` into it.
pub fn replay_into(
    state: &mut LedgerState,
    history: &History,
    policy: &CommissionPolicy,
) -> Vec<(EventId, Decimal)> {
    state.reset();
    let timeline = build_timeline(history);
    tracing::debug!(events = timeline.len(), "Replaying timeline");

    timeline
        .into_iter()
        .filter_map(|event| state.apply_event(event, policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, Movement, Side, Stamp, Trade};

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn at(date: &str, time: &str) -> Stamp {
        Stamp::parse(date, Some(time)).unwrap()
    }

    fn trade(id: &str, side: Side, stamp: Stamp, amount: &str, rate: &str) -> Trade {
        Trade::new(EventId::new(id), side, stamp, d(amount), d(rate), Currency::Uyu)
            .unwrap()
            .with_commission_pct(Decimal::zero())
    }

    #[test]
    fn empty_history_gives_empty_state() {
        let r = recompute_all(&History::new(), &CommissionPolicy::default());
        assert_eq!(r.state, LedgerState::new());
        assert!(r.gains.is_empty());
    }

    #[test]
    fn out_of_order_history_replays_chronologically() {
        let mut history = History::new();
        // Recorded sell-first, but the buy happened earlier.
        history.trades.push(trade("s", Side::Sell, at("2024-01-02", "09:00"), "22500", "45"));
        history.trades.push(trade("b", Side::Buy, at("2024-01-01", "09:00"), "40000", "40"));

        let r = recompute_all(&history, &CommissionPolicy::default());
        assert_eq!(r.gain_of(&EventId::new("s")), Some(d("2500")));
        assert_eq!(r.gain_of(&EventId::new("b")), Some(Decimal::zero()));
        assert_eq!(r.state.total_quantity(), d("500"));
        assert_eq!(r.gains[0].0, EventId::new("b"));
    }

    #[test]
    fn inflow_uses_running_purchase_rate() {
        let mut history = History::new();
        history.trades.push(trade("b1", Side::Buy, at("2024-01-01", "09:00"), "4000", "40"));
        history.trades.push(trade("b2", Side::Buy, at("2024-01-03", "09:00"), "4200", "42"));
        history.movements.push(Movement::asset_inflow(
            EventId::new("dep"),
            at("2024-01-02", "09:00"),
            d("10"),
            None,
        ).unwrap());

        let r = recompute_all(&history, &CommissionPolicy::default());
        // The deposit happened while 40 was the last purchase rate, so it merges there.
        let lot = r.state.lots().get(&crate::domain::LotId::new("b1")).unwrap();
        assert_eq!(lot.remaining_quantity, d("110"));
        assert_eq!(r.state.lots().len(), 2);
        assert_eq!(r.state.rates().uyu.purchase, Some(d("42")));
    }

    #[test]
    fn replay_into_discards_previous_state() {
        let policy = CommissionPolicy::default();
        let mut state = LedgerState::new();
        state
            .insert_manual_lot(at("2023-01-01", "00:00"), d("10"), d("99"))
            .unwrap();

        let mut history = History::new();
        history.trades.push(trade("b", Side::Buy, at("2024-01-01", "09:00"), "4000", "40"));
        replay_into(&mut state, &history, &policy);

        assert_eq!(state, recompute_all(&history, &policy).state);
    }

    #[test]
    fn outflow_before_any_lot_is_dropped() {
        let mut history = History::new();
        history.movements.push(Movement::asset_outflow(
            EventId::new("w"),
            at("2024-01-01", "09:00"),
            d("50"),
        ).unwrap());
        history.trades.push(trade("b", Side::Buy, at("2024-01-02", "09:00"), "4000", "40"));

        let r = recompute_all(&history, &CommissionPolicy::default());
        assert_eq!(r.state.total_quantity(), d("100"));
    }

    #[test]
    fn trigger_display() {
        assert_eq!(RebuildTrigger::MissingGain.to_string(), "missing_gain");
    }
}
