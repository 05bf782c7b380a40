//! Trade record store — owns the persisted trade offers and provides the
//! conditional-update primitives that serialize racing operations.
//!
//! Every status mutation here is a compare-and-set performed under a single
//! write-lock acquisition, never a read-then-blind-write pair. At most one
//! of N racing accepts wins [`TradeStore::claim`]; a cancel or sweep racing
//! an accept observes a non-open status and fails harmlessly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use openbarter_types::{BarterError, Result, TradeId, TradeRecord, TradeStatus, UserId};
use parking_lot::RwLock;

/// In-memory store of all trade records, keyed by id.
///
/// Records are never physically deleted by the engine — terminal records
/// stay queryable for reputation and my-trades listings.
#[derive(Debug, Default)]
pub struct TradeStore {
    records: RwLock<HashMap<TradeId, TradeRecord>>,
}

impl TradeStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a freshly created record.
    pub fn insert(&self, record: TradeRecord) {
        self.records.write().insert(record.id, record);
    }

    /// Fetch a snapshot of one record.
    #[must_use]
    pub fn get(&self, trade_id: TradeId) -> Option<TradeRecord> {
        self.records.read().get(&trade_id).cloned()
    }

    /// Status of one record, if it exists.
    #[must_use]
    pub fn status_of(&self, trade_id: TradeId) -> Option<TradeStatus> {
        self.records.read().get(&trade_id).map(|r| r.status)
    }

    /// Atomically claim an open trade for `buyer`: the conditional
    /// `Open → Completed` transition that serializes racing accepts.
    ///
    /// The claim succeeds only if the record is currently open, not expired
    /// at `now`, and the buyer is not the offeror. `buyer_id` is recorded in
    /// the same atomic write, so "buyer set iff completed" holds at every
    /// observable instant. A record found open but past its expiry is
    /// transitioned to `Expired` on the spot (lazy expiry, same conditional
    /// logic as the sweep).
    ///
    /// # Errors
    /// - `TradeNotFound` if no record exists for `trade_id`
    /// - `TradeNotOpen` if the record is terminal or expired — the expected
    ///   outcome of a race loser
    /// - `SelfTrade` if `buyer` is the offeror
    pub fn claim(
        &self,
        trade_id: TradeId,
        buyer: UserId,
        now: DateTime<Utc>,
    ) -> Result<TradeRecord> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&trade_id)
            .ok_or(BarterError::TradeNotFound(trade_id))?;

        if Self::expire_if_due(record, now) {
            tracing::debug!(trade = %trade_id, "claim hit an expired trade");
            return Err(BarterError::TradeNotOpen(trade_id));
        }
        if record.status != TradeStatus::Open {
            tracing::debug!(trade = %trade_id, status = %record.status, "claim lost the race");
            return Err(BarterError::TradeNotOpen(trade_id));
        }
        if record.offeror_id == buyer {
            return Err(BarterError::SelfTrade(trade_id));
        }

        record.status = TradeStatus::Completed;
        record.buyer_id = Some(buyer);
        Ok(record.clone())
    }

    /// Roll a claim back: `Completed → Open`, clearing the buyer.
    ///
    /// This is the one sanctioned reverse edge in the state machine, used
    /// only by the accept path to compensate a claim whose settlement could
    /// not be applied. Callers other than the claim winner must never invoke
    /// it.
    ///
    /// # Errors
    /// - `TradeNotFound` if the record vanished
    /// - `TradeNotOpen` if the record is not in the claimed state
    pub fn release_claim(&self, trade_id: TradeId) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&trade_id)
            .ok_or(BarterError::TradeNotFound(trade_id))?;

        if record.status != TradeStatus::Completed {
            return Err(BarterError::TradeNotOpen(trade_id));
        }
        record.status = TradeStatus::Open;
        record.buyer_id = None;
        Ok(())
    }

    /// Conditionally transition a record from `from` to `to`.
    ///
    /// Fails if the record is missing, already expired at `now`, not in the
    /// `from` status, or the transition is not a legal forward edge.
    ///
    /// # Errors
    /// - `TradeNotFound` / `TradeNotOpen` as for [`TradeStore::claim`]
    pub fn transition(
        &self,
        trade_id: TradeId,
        from: TradeStatus,
        to: TradeStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&trade_id)
            .ok_or(BarterError::TradeNotFound(trade_id))?;

        if Self::expire_if_due(record, now) {
            return Err(BarterError::TradeNotOpen(trade_id));
        }
        if record.status != from || !from.can_transition_to(to) {
            return Err(BarterError::TradeNotOpen(trade_id));
        }
        record.status = to;
        Ok(())
    }

    /// Expire every open record whose `expire_at` has passed. Idempotent:
    /// records already terminal are untouched, so a second sweep at the same
    /// instant transitions nothing.
    ///
    /// Returns the number of records transitioned.
    pub fn expire_due(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write();
        let mut expired = 0;
        for record in records.values_mut() {
            if Self::expire_if_due(record, now) {
                expired += 1;
            }
        }
        expired
    }

    /// Snapshot of every record. Query paths filter and sort this.
    #[must_use]
    pub fn all(&self) -> Vec<TradeRecord> {
        self.records.read().values().cloned().collect()
    }

    /// Number of records tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// The single conditional-expiry rule shared by the sweep, the accept
    /// claim, and cancel's guard.
    fn expire_if_due(record: &mut TradeRecord, now: DateTime<Utc>) -> bool {
        if record.status == TradeStatus::Open && record.is_expired_at(now) {
            record.status = TradeStatus::Expired;
            true
        } else {
            false
        }
    }
}
