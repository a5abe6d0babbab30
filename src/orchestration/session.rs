use crate::domain::{
    build_timeline, CivilClock, Decimal, EventId, History, Lot, LotId, Movement, Stamp,
    TimelineEvent, Trade,
};
use crate::engine::{
    replay_into, CommissionPolicy, InventorySummary, LedgerState, LotEdit, RebuildTrigger,
};
use crate::error::LedgerError;
use crate::snapshot::LedgerSnapshot;
use std::ptr;
use tracing::{debug, info};

/// Owns the history and the live state derived from it.
///
/// New events take the fast path when they land at the end of the timeline;
/// anything else goes through a full rebuild.
#[derive(Debug, Clone)]
pub struct LedgerSession {
    history: History,
    state: LedgerState,
    policy: CommissionPolicy,
    clock: CivilClock,
}

impl LedgerSession {
    pub fn new(policy: CommissionPolicy) -> Self {
        Self {
            history: History::new(),
            state: LedgerState::new(),
            policy,
            clock: CivilClock::default(),
        }
    }

    pub fn with_clock(mut self, clock: CivilClock) -> Self {
        self.clock = clock;
        self
    }

    /// Resume from a snapshot, rebuilding if any trade lacks a gain.
    pub fn restore(snapshot: LedgerSnapshot, policy: CommissionPolicy) -> Self {
        let mut session = Self {
            history: snapshot.history,
            state: snapshot.state,
            policy,
            clock: CivilClock::default(),
        };
        if session.history.needs_recompute() {
            session.rebuild(RebuildTrigger::MissingGain);
        }
        session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn policy(&self) -> &CommissionPolicy {
        &self.policy
    }

    pub fn summary(&self) -> InventorySummary {
        self.state.summary()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::new(self.history.clone(), self.state.clone())
    }

    /// Record a trade and return its gain.
    ///
    /// An id already present in the history is rejected and nothing changes.
    pub fn record_trade(&mut self, mut trade: Trade) -> Result<Decimal, LedgerError> {
        if self.history.trade(&trade.id).is_some() {
            return Err(LedgerError::DuplicateTrade(trade.id));
        }
        trade.gain = None;
        let id = trade.id.clone();
        self.history.trades.push(trade);

        if self.newest_trade_sorts_last() {
            let gain = match self.history.trades.last() {
                Some(trade) => self.state.apply_trade(trade, &self.policy),
                None => Decimal::zero(),
            };
            self.history.record_gains([(&id, &gain)]);
            debug!(trade = %id, gain = %gain, "Trade applied");
            return Ok(gain);
        }

        self.rebuild(RebuildTrigger::OutOfOrder);
        Ok(self
            .history
            .trade(&id)
            .and_then(|t| t.gain)
            .unwrap_or_default())
    }

    /// Record a movement. Bank movements never touch lots.
    pub fn record_movement(&mut self, movement: Movement) -> Result<(), LedgerError> {
        if self.history.movement(&movement.id).is_some() {
            return Err(LedgerError::DuplicateMovement(movement.id));
        }
        let id = movement.id.clone();
        let is_asset = movement.is_asset();
        self.history.movements.push(movement);
        if !is_asset {
            debug!(movement = %id, "Bank movement recorded");
            return Ok(());
        }

        if self.newest_movement_sorts_last() {
            if let Some(m) = self.history.movements.last() {
                self.state.apply_movement(m);
            }
            debug!(movement = %id, "Asset movement applied");
        } else {
            self.rebuild(RebuildTrigger::OutOfOrder);
        }
        Ok(())
    }

    /// Remove a trade. Always rebuilds.
    pub fn delete_trade(&mut self, id: &EventId) -> Result<Trade, LedgerError> {
        let trade = self
            .history
            .remove_trade(id)
            .ok_or_else(|| LedgerError::TradeNotFound(id.clone()))?;
        self.rebuild(RebuildTrigger::EventDeleted);
        Ok(trade)
    }

    /// Remove a movement. Only asset movements trigger a rebuild.
    pub fn delete_movement(&mut self, id: &EventId) -> Result<Movement, LedgerError> {
        let movement = self
            .history
            .remove_movement(id)
            .ok_or_else(|| LedgerError::MovementNotFound(id.clone()))?;
        if movement.is_asset() {
            self.rebuild(RebuildTrigger::EventDeleted);
        }
        Ok(movement)
    }

    pub fn recalculate(&mut self) {
        self.rebuild(RebuildTrigger::Manual);
    }

    /// Add a lot by hand, stamped now in civil time unless a stamp is given.
    pub fn add_manual_lot(
        &mut self,
        unit_cost: Decimal,
        quantity: Decimal,
        stamp: Option<Stamp>,
    ) -> Result<LotId, LedgerError> {
        let stamp = stamp.unwrap_or_else(|| self.clock.now());
        let id = self.state.insert_manual_lot(stamp, unit_cost, quantity)?;
        info!(lot = %id, cost = %unit_cost, quantity = %quantity, "Manual lot added");
        Ok(id)
    }

    pub fn edit_lot(&mut self, id: &LotId, edit: LotEdit) -> Result<Lot, LedgerError> {
        let lot = self.state.edit_lot(id, edit)?.clone();
        info!(lot = %id, remaining = %lot.remaining_quantity, "Lot edited");
        Ok(lot)
    }

    pub fn remove_lot(&mut self, id: &LotId) -> Result<Lot, LedgerError> {
        let lot = self.state.remove_lot(id)?;
        info!(lot = %id, "Lot removed");
        Ok(lot)
    }

    /// Whether the most recently pushed trade is the final timeline entry.
    fn newest_trade_sorts_last(&self) -> bool {
        let Some(newest) = self.history.trades.last() else {
            return false;
        };
        matches!(
            build_timeline(&self.history).last(),
            Some(TimelineEvent::Trade(t)) if ptr::eq(*t, newest)
        )
    }

    /// Whether the most recently pushed movement is the final timeline entry.
    fn newest_movement_sorts_last(&self) -> bool {
        let Some(newest) = self.history.movements.last() else {
            return false;
        };
        matches!(
            build_timeline(&self.history).last(),
            Some(TimelineEvent::Inflow(m) | TimelineEvent::Outflow(m)) if ptr::eq(*m, newest)
        )
    }

    fn rebuild(&mut self, trigger: RebuildTrigger) {
        info!(
            trigger = %trigger,
            trades = self.history.trades.len(),
            movements = self.history.movements.len(),
            "Rebuilding ledger"
        );
        let gains = replay_into(&mut self.state, &self.history, &self.policy);
        self.history
            .record_gains(gains.iter().map(|(id, gain)| (id, gain)));
        info!(
            trigger = %trigger,
            events = gains.len(),
            lots = self.state.lots().len(),
            fingerprint = %self.state.fingerprint(),
            "Rebuild complete"
        );
    }
}

impl Default for LedgerSession {
    fn default() -> Self {
        Self::new(CommissionPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Currency, Direction, Side};
    use crate::engine::recompute_all;

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

    fn session() -> LedgerSession {
        LedgerSession::default()
    }

    #[test]
    fn test_record_trade_fast_path() {
        let mut s = session();
        assert_eq!(
            s.record_trade(trade("b", Side::Buy, at("2024-01-01", "09:00"), "40000", "40")).unwrap(),
            Decimal::zero()
        );
        let gain = s.record_trade(trade("s", Side::Sell, at("2024-01-02", "09:00"), "22500", "45")).unwrap();
        assert_eq!(gain, d("2500"));
        assert_eq!(s.history().trade(&EventId::new("s")).unwrap().gain, Some(d("2500")));
        assert_eq!(s.state().total_quantity(), d("500"));
    }

    #[test]
    fn test_backdated_trade_rebuilds() {
        let mut s = session();
        s.record_trade(trade("b2", Side::Buy, at("2024-01-03", "09:00"), "4500", "45")).unwrap();
        s.record_trade(trade("b1", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")).unwrap();

        let lots = s.state().active_lots();
        assert_eq!(lots[0].id, LotId::new("b1"));
        assert_eq!(s.state(), &recompute_all(s.history(), s.policy()).state);
    }

    #[test]
    fn test_backdated_buy_after_dearer_buy_matches_rebuild() {
        let mut s = session();
        s.record_trade(trade("late", Side::Buy, at("2024-01-05", "09:00"), "4500", "45")).unwrap();
        s.record_trade(trade("early", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")).unwrap();

        let batch = recompute_all(s.history(), s.policy());
        assert_eq!(s.state(), &batch.state);
        assert!(!s.history().needs_recompute());
        for t in &s.history().trades {
            assert_eq!(t.gain, batch.gain_of(&t.id));
        }
    }

    #[test]
    fn test_duplicate_ids_are_rejected_without_side_effects() {
        let mut s = session();
        s.record_trade(trade("x", Side::Buy, at("2024-01-05", "09:00"), "4500", "45")).unwrap();
        s.record_movement(Movement::asset_inflow(
            EventId::new("m"),
            at("2024-01-06", "09:00"),
            d("10"),
            Some(d("44")),
        ).unwrap())
        .unwrap();
        let fingerprint = s.state().fingerprint();

        assert!(matches!(
            s.record_trade(trade("x", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")),
            Err(LedgerError::DuplicateTrade(_))
        ));
        assert!(matches!(
            s.record_movement(Movement::asset_outflow(EventId::new("m"), at("2024-01-07", "09:00"), d("5")).unwrap()),
            Err(LedgerError::DuplicateMovement(_))
        ));

        assert_eq!(s.history().trades.len(), 1);
        assert_eq!(s.history().movements.len(), 1);
        assert_eq!(s.state().fingerprint(), fingerprint);
        assert_eq!(s.state(), &recompute_all(s.history(), s.policy()).state);
    }

    #[test]
    fn test_trade_sharing_id_with_later_movement_rebuilds() {
        let mut s = session();
        s.record_movement(Movement::asset_inflow(
            EventId::new("x"),
            at("2024-01-05", "09:00"),
            d("10"),
            Some(d("45")),
        ).unwrap())
        .unwrap();
        s.record_trade(trade("x", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")).unwrap();

        assert_eq!(s.state(), &recompute_all(s.history(), s.policy()).state);
        assert!(!s.history().needs_recompute());
    }

    #[test]
    fn test_trade_at_same_stamp_as_movement_rebuilds() {
        let mut s = session();
        s.record_movement(Movement::asset_inflow(
            EventId::new("dep"),
            at("2024-01-01", "09:00"),
            d("10"),
            Some(d("41")),
        ).unwrap()).unwrap();
        s.record_trade(trade("b", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")).unwrap();
        assert_eq!(s.state(), &recompute_all(s.history(), s.policy()).state);
    }

    #[test]
    fn test_delete_trade_rebuilds() {
        let mut s = session();
        s.record_trade(trade("b", Side::Buy, at("2024-01-01", "09:00"), "40000", "40")).unwrap();
        s.record_trade(trade("s", Side::Sell, at("2024-01-02", "09:00"), "22500", "45")).unwrap();

        s.delete_trade(&EventId::new("s")).unwrap();
        assert_eq!(s.state().total_quantity(), d("1000"));
        assert!(matches!(
            s.delete_trade(&EventId::new("s")),
            Err(LedgerError::TradeNotFound(_))
        ));
    }

    #[test]
    fn test_bank_movement_deletion_keeps_manual_lots() {
        let mut s = session();
        s.record_movement(Movement::bank(
            EventId::new("fee"),
            Direction::Outflow,
            "BROU",
            at("2024-01-01", "09:00"),
            d("120"),
        )).unwrap();
        let lot = s.add_manual_lot(d("39"), d("5"), None).unwrap();

        s.delete_movement(&EventId::new("fee")).unwrap();
        assert!(s.state().lots().get(&lot).is_some());

        assert!(matches!(
            s.delete_movement(&EventId::new("fee")),
            Err(LedgerError::MovementNotFound(_))
        ));
    }

    #[test]
    fn test_recalculate_discards_manual_lots() {
        let mut s = session();
        s.record_trade(trade("b", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")).unwrap();
        s.add_manual_lot(d("39"), d("5"), Some(at("2024-01-02", "00:00")))
            .unwrap();
        assert_eq!(s.state().lots().len(), 2);

        s.recalculate();
        assert_eq!(s.state().lots().len(), 1);
    }

    #[test]
    fn test_restore_rebuilds_when_gain_missing() {
        let mut history = History::new();
        history
            .trades
            .push(trade("b", Side::Buy, at("2024-01-01", "09:00"), "4000", "40"));
        let s = LedgerSession::restore(
            LedgerSnapshot::new(history, LedgerState::new()),
            CommissionPolicy::default(),
        );
        assert_eq!(s.state().total_quantity(), d("100"));
        assert!(!s.history().needs_recompute());
    }

    #[test]
    fn test_restore_trusts_complete_snapshot() {
        let mut s = session();
        s.record_trade(trade("b", Side::Buy, at("2024-01-01", "09:00"), "4000", "40")).unwrap();
        s.add_manual_lot(d("39"), d("5"), Some(at("2024-01-02", "00:00")))
            .unwrap();

        let restored = LedgerSession::restore(s.snapshot(), CommissionPolicy::default());
        assert_eq!(restored.state(), s.state());
    }
}
