//! Trade lifecycle orchestration: create, accept, cancel.
//!
//! Acceptance is the settlement algorithm. Offered cards are **not**
//! escrowed at creation time, so a user can over-commit a card across
//! several open offers or spend it elsewhere while an offer stands.
//! Acceptance therefore re-validates current holdings after winning the
//! claim, and every checkpoint can abort the whole operation with no
//! partial effect:
//!
//! 1. Atomically claim the trade (conditional `Open → Completed`, buyer
//!    recorded in the same write) — the sole serialization point between
//!    racing accepts
//! 2. Re-validate both parties' current holdings; on failure release the
//!    claim
//! 3. Apply the swap as two per-user atomic inventory batches; if the
//!    buyer's batch fails after the offeror's succeeded, compensate the
//!    offeror's batch with its inverse and release the claim
//!
//! Callers never observe a half-applied trade.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use openbarter_ledger::{InventoryLedger, TradeStore, UserDirectory};
use openbarter_types::{
    BarterError, CardId, CardLine, EngineConfig, Result, TradeId, TradeRecord, TradeStatus, UserId,
};

use crate::reconciler::ExpiryReconciler;

/// Orchestrates the trade state machine over the state-plane stores.
///
/// Constructed once and shared by reference across request tasks; it is the
/// only component that mutates the [`InventoryLedger`].
pub struct TradeLifecycleManager {
    trades: Arc<TradeStore>,
    ledger: Arc<InventoryLedger>,
    directory: Arc<UserDirectory>,
    reconciler: ExpiryReconciler,
    config: EngineConfig,
}

impl TradeLifecycleManager {
    #[must_use]
    pub fn new(
        trades: Arc<TradeStore>,
        ledger: Arc<InventoryLedger>,
        directory: Arc<UserDirectory>,
        config: EngineConfig,
    ) -> Self {
        let reconciler = ExpiryReconciler::new(Arc::clone(&trades));
        Self {
            trades,
            ledger,
            directory,
            reconciler,
            config,
        }
    }

    /// The reconciler gating this engine, for spawning as a background task.
    #[must_use]
    pub fn reconciler(&self) -> ExpiryReconciler {
        self.reconciler.clone()
    }

    /// Create a new open trade offer.
    ///
    /// Validation happens before any state is touched. Every line's quantity
    /// is normalized to one copy; duplicate card ids stay distinct. Offered
    /// cards are not reserved — see the module docs for the consequence.
    ///
    /// # Errors
    /// - `UserNotFound` if the offeror is not registered
    /// - `EmptyCardList` / `TooManyCards` / `ExpiryNotInFuture` on invalid
    ///   input
    pub fn create_trade(
        &self,
        offeror: UserId,
        offered: Vec<CardLine>,
        requested: Vec<CardLine>,
        expire_at: DateTime<Utc>,
    ) -> Result<TradeRecord> {
        self.reconciler.sweep(Utc::now());

        if !self.directory.exists(offeror) {
            return Err(BarterError::UserNotFound(offeror));
        }
        Self::validate_side("offered", &offered, self.config.max_cards_per_side)?;
        Self::validate_side("requested", &requested, self.config.max_cards_per_side)?;
        let now = Utc::now();
        if expire_at <= now {
            return Err(BarterError::ExpiryNotInFuture { expire_at });
        }

        let record = TradeRecord::new(offeror, offered, requested, now, expire_at);
        self.trades.insert(record.clone());
        self.directory.append_trade(offeror, record.id)?;

        tracing::info!(
            trade = %record.id,
            offeror = %offeror,
            offered = record.offered.len(),
            requested = record.requested.len(),
            expires = %record.expire_at,
            "trade offer created"
        );
        Ok(record)
    }

    /// Accept an open trade as `buyer`, settling the card swap.
    ///
    /// On success the conservation law holds: for every card touched, the
    /// total across offeror and buyer is exactly what it was before the
    /// call — only the distribution changed.
    ///
    /// # Errors
    /// - `UserNotFound` if the buyer is not registered
    /// - `TradeNotFound` if no such trade exists
    /// - `TradeNotOpen` for race losers, expired offers, terminal records
    /// - `SelfTrade` if the buyer is the offeror
    /// - `InsufficientQuantity` naming the first card either party no longer
    ///   holds in sufficient quantity
    pub fn accept_trade(&self, trade_id: TradeId, buyer: UserId) -> Result<TradeRecord> {
        self.reconciler.sweep(Utc::now());

        if !self.directory.exists(buyer) {
            return Err(BarterError::UserNotFound(buyer));
        }

        // Step 1: single atomic conditional write. Losing the race here is
        // the expected, common outcome, not an exceptional one.
        let record = self.trades.claim(trade_id, buyer, Utc::now())?;

        // Step 2: holdings may have changed since the offer was created.
        if let Err(err) = self.check_current_holdings(&record, buyer) {
            self.rollback_claim(trade_id);
            return Err(err);
        }

        // Step 3: the four-part transfer, one atomic batch per user.
        if let Err(err) = self.settle(&record, buyer) {
            self.rollback_claim(trade_id);
            return Err(err);
        }

        tracing::info!(
            trade = %trade_id,
            offeror = %record.offeror_id,
            buyer = %buyer,
            "trade settled"
        );
        Ok(record)
    }

    /// Cancel an open trade. Only the offeror may cancel; there is no
    /// inventory effect.
    ///
    /// # Errors
    /// - `TradeNotFound` if the trade does not exist or is no longer open
    /// - `NotOfferor` if the requester did not create the trade
    pub fn cancel_trade(&self, trade_id: TradeId, requester: UserId) -> Result<()> {
        self.reconciler.sweep(Utc::now());

        let record = self
            .trades
            .get(trade_id)
            .ok_or(BarterError::TradeNotFound(trade_id))?;
        if record.status != TradeStatus::Open {
            return Err(BarterError::TradeNotFound(trade_id));
        }
        if record.offeror_id != requester {
            return Err(BarterError::NotOfferor {
                trade_id,
                requester,
            });
        }

        match self
            .trades
            .transition(trade_id, TradeStatus::Open, TradeStatus::Cancelled, Utc::now())
        {
            Ok(()) => {
                tracing::info!(trade = %trade_id, offeror = %requester, "trade cancelled");
                Ok(())
            }
            // A concurrent accept or sweep won; to the canceller the trade
            // is simply no longer there to cancel.
            Err(BarterError::TradeNotOpen(id)) => Err(BarterError::TradeNotFound(id)),
            Err(err) => Err(err),
        }
    }

    fn validate_side(side: &'static str, lines: &[CardLine], max: usize) -> Result<()> {
        if lines.is_empty() {
            return Err(BarterError::EmptyCardList { side });
        }
        if lines.len() > max {
            return Err(BarterError::TooManyCards {
                side,
                count: lines.len(),
                max,
            });
        }
        Ok(())
    }

    fn check_current_holdings(&self, record: &TradeRecord, buyer: UserId) -> Result<()> {
        for (card_id, needed) in record.offered_totals() {
            let held = self.ledger.quantity(record.offeror_id, &card_id);
            if held < needed {
                return Err(BarterError::InsufficientQuantity {
                    card_id,
                    needed,
                    held,
                });
            }
        }
        for (card_id, needed) in record.requested_totals() {
            let held = self.ledger.quantity(buyer, &card_id);
            if held < needed {
                return Err(BarterError::InsufficientQuantity {
                    card_id,
                    needed,
                    held,
                });
            }
        }
        Ok(())
    }

    /// Apply the swap: offeror loses offered cards and gains requested
    /// cards; buyer loses requested cards and gains offered cards, with
    /// absent holdings created on the receiving side.
    fn settle(&self, record: &TradeRecord, buyer: UserId) -> Result<()> {
        let offered = record.offered_totals();
        let requested = record.requested_totals();
        let offeror_deltas = swap_deltas(&offered, &requested);
        let buyer_deltas = swap_deltas(&requested, &offered);

        self.ledger
            .adjust_many(record.offeror_id, &offeror_deltas, true)?;

        if let Err(err) = self.ledger.adjust_many(buyer, &buyer_deltas, true) {
            // The offeror's batch landed but the buyer's cannot; compensate
            // with the exact inverse to restore the pre-settlement state.
            let inverse: Vec<(CardId, i64)> = offeror_deltas
                .iter()
                .map(|(card_id, delta)| (card_id.clone(), -delta))
                .collect();
            if let Err(rollback_err) = self.ledger.adjust_many(record.offeror_id, &inverse, true) {
                tracing::error!(
                    trade = %record.id,
                    offeror = %record.offeror_id,
                    error = %rollback_err,
                    "inventory rollback failed after partial settlement; \
                     conservation invariant violated, operator attention required"
                );
                return Err(BarterError::RollbackFailed {
                    trade_id: record.id,
                    reason: rollback_err.to_string(),
                });
            }
            return Err(err);
        }
        Ok(())
    }

    fn rollback_claim(&self, trade_id: TradeId) {
        if let Err(err) = self.trades.release_claim(trade_id) {
            tracing::error!(
                trade = %trade_id,
                error = %err,
                "claim rollback failed; record requires operator attention"
            );
        }
    }
}

/// Deltas for one party: outgoing cards negative, incoming cards positive.
fn swap_deltas(outgoing: &[(CardId, u32)], incoming: &[(CardId, u32)]) -> Vec<(CardId, i64)> {
    outgoing
        .iter()
        .map(|(card_id, qty)| (card_id.clone(), -i64::from(*qty)))
        .chain(
            incoming
                .iter()
                .map(|(card_id, qty)| (card_id.clone(), i64::from(*qty))),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (
        TradeLifecycleManager,
        Arc<TradeStore>,
        Arc<InventoryLedger>,
        Arc<UserDirectory>,
    ) {
        let trades = Arc::new(TradeStore::new());
        let ledger = Arc::new(InventoryLedger::new());
        let directory = Arc::new(UserDirectory::new());
        let manager = TradeLifecycleManager::new(
            Arc::clone(&trades),
            Arc::clone(&ledger),
            Arc::clone(&directory),
            EngineConfig::default(),
        );
        (manager, trades, ledger, directory)
    }

    fn in_one_hour() -> DateTime<Utc> {
        Utc::now() + chrono::Duration::hours(1)
    }

    #[test]
    fn create_requires_registered_offeror() {
        let (manager, ..) = engine();
        let err = manager
            .create_trade(
                UserId::new(),
                vec![CardLine::one("a")],
                vec![CardLine::one("b")],
                in_one_hour(),
            )
            .unwrap_err();
        assert!(matches!(err, BarterError::UserNotFound(_)));
    }

    #[test]
    fn create_rejects_empty_sides() {
        let (manager, _, _, directory) = engine();
        let offeror = directory.register("alice").id;

        let err = manager
            .create_trade(offeror, vec![], vec![CardLine::one("b")], in_one_hour())
            .unwrap_err();
        assert!(matches!(
            err,
            BarterError::EmptyCardList { side: "offered" }
        ));

        let err = manager
            .create_trade(offeror, vec![CardLine::one("a")], vec![], in_one_hour())
            .unwrap_err();
        assert!(matches!(
            err,
            BarterError::EmptyCardList { side: "requested" }
        ));
    }

    #[test]
    fn create_rejects_past_expiry() {
        let (manager, trades, _, directory) = engine();
        let offeror = directory.register("alice").id;

        let err = manager
            .create_trade(
                offeror,
                vec![CardLine::one("a")],
                vec![CardLine::one("b")],
                Utc::now() - chrono::Duration::seconds(1),
            )
            .unwrap_err();
        assert!(matches!(err, BarterError::ExpiryNotInFuture { .. }));
        // Nothing persisted.
        assert!(trades.is_empty());
        assert!(directory.find(offeror).unwrap().trades.is_empty());
    }

    #[test]
    fn create_rejects_oversized_sides() {
        let (trades, ledger, directory) = {
            let t = Arc::new(TradeStore::new());
            let l = Arc::new(InventoryLedger::new());
            let d = Arc::new(UserDirectory::new());
            (t, l, d)
        };
        let manager = TradeLifecycleManager::new(
            Arc::clone(&trades),
            ledger,
            Arc::clone(&directory),
            EngineConfig {
                max_cards_per_side: 2,
                ..EngineConfig::default()
            },
        );
        let offeror = directory.register("alice").id;

        let big: Vec<CardLine> = (0..3).map(|i| CardLine::one(format!("c{i}"))).collect();
        let err = manager
            .create_trade(offeror, big, vec![CardLine::one("b")], in_one_hour())
            .unwrap_err();
        assert!(matches!(
            err,
            BarterError::TooManyCards {
                side: "offered",
                count: 3,
                max: 2,
            }
        ));
    }

    #[test]
    fn create_normalizes_and_records_trade() {
        let (manager, trades, _, directory) = engine();
        let offeror = directory.register("alice").id;

        let record = manager
            .create_trade(
                offeror,
                vec![CardLine::new("cardX", 4)],
                vec![CardLine::one("cardY")],
                in_one_hour(),
            )
            .unwrap();

        assert_eq!(record.status, TradeStatus::Open);
        assert!(record.offered.iter().all(|l| l.quantity == 1));
        assert_eq!(trades.get(record.id).unwrap().id, record.id);
        assert_eq!(directory.find(offeror).unwrap().trades, vec![record.id]);
    }

    #[test]
    fn cancel_requires_offeror() {
        let (manager, _, _, directory) = engine();
        let offeror = directory.register("alice").id;
        let stranger = directory.register("mallory").id;
        let record = manager
            .create_trade(
                offeror,
                vec![CardLine::one("a")],
                vec![CardLine::one("b")],
                in_one_hour(),
            )
            .unwrap();

        let err = manager.cancel_trade(record.id, stranger).unwrap_err();
        assert!(matches!(err, BarterError::NotOfferor { .. }));

        manager.cancel_trade(record.id, offeror).unwrap();
        // A second cancel sees a non-open trade.
        let err = manager.cancel_trade(record.id, offeror).unwrap_err();
        assert!(matches!(err, BarterError::TradeNotFound(_)));
    }

    #[test]
    fn settle_compensates_offeror_when_buyer_batch_fails() {
        let (manager, _, ledger, directory) = engine();
        let offeror = directory.register("alice").id;
        let buyer = directory.register("bob").id;
        ledger.grant(offeror, &CardId::new("cardX"), 1);
        // Buyer holds nothing, so the buyer-side decrement must fail.

        let record = TradeRecord::dummy(offeror, "cardX", "cardY");

        let err = manager.settle(&record, buyer).unwrap_err();
        assert!(matches!(err, BarterError::InsufficientQuantity { .. }));

        // The offeror batch was compensated: pre-settlement state restored.
        assert_eq!(ledger.quantity(offeror, &CardId::new("cardX")), 1);
        assert_eq!(ledger.quantity(offeror, &CardId::new("cardY")), 0);
        assert_eq!(ledger.quantity(buyer, &CardId::new("cardX")), 0);
    }

    #[test]
    fn swap_deltas_signs() {
        let outgoing = vec![(CardId::new("a"), 2)];
        let incoming = vec![(CardId::new("b"), 1)];
        let deltas = swap_deltas(&outgoing, &incoming);
        assert_eq!(deltas, vec![(CardId::new("a"), -2), (CardId::new("b"), 1)]);
    }
}
