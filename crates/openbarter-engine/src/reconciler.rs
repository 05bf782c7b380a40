//! Expiry reconciliation.
//!
//! Open trades past their `expire_at` are flipped to `Expired` via the
//! store's conditional transition, never a blanket write, so a concurrent
//! accept or cancel on the same record is never clobbered.
//!
//! The reconciler runs in two places with the same logic: as a gate in
//! front of every trade-related operation, and as an independent periodic
//! task spawned at startup.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use openbarter_ledger::TradeStore;
use tokio_util::sync::CancellationToken;

/// Sweeps open trades whose expiration instant has passed.
#[derive(Clone)]
pub struct ExpiryReconciler {
    trades: Arc<TradeStore>,
}

impl ExpiryReconciler {
    #[must_use]
    pub fn new(trades: Arc<TradeStore>) -> Self {
        Self { trades }
    }

    /// Expire every open trade with `expire_at <= now`. Idempotent: a second
    /// sweep at the same instant transitions nothing further.
    ///
    /// Returns the number of trades transitioned.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let expired = self.trades.expire_due(now);
        if expired > 0 {
            tracing::debug!(expired, "swept expired trade offers");
        }
        expired
    }

    /// Run periodic sweeps until cancelled.
    pub async fn run(self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tracing::info!(period_secs = period.as_secs(), "expiry reconciler running");
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::info!("expiry reconciler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.sweep(Utc::now());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openbarter_types::{TradeRecord, TradeStatus, UserId};

    #[test]
    fn sweep_expires_only_due_trades() {
        let store = Arc::new(TradeStore::new());
        let due = TradeRecord::dummy_expired(UserId::new(), "a", 2);
        let fresh = TradeRecord::dummy(UserId::new(), "b", "c");
        let due_id = due.id;
        let fresh_id = fresh.id;
        store.insert(due);
        store.insert(fresh);

        let reconciler = ExpiryReconciler::new(Arc::clone(&store));
        assert_eq!(reconciler.sweep(Utc::now()), 1);
        assert_eq!(store.status_of(due_id), Some(TradeStatus::Expired));
        assert_eq!(store.status_of(fresh_id), Some(TradeStatus::Open));
    }

    #[test]
    fn sweep_twice_is_idempotent() {
        let store = Arc::new(TradeStore::new());
        store.insert(TradeRecord::dummy_expired(UserId::new(), "a", 2));

        let reconciler = ExpiryReconciler::new(Arc::clone(&store));
        let now = Utc::now();
        assert_eq!(reconciler.sweep(now), 1);
        assert_eq!(reconciler.sweep(now), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn background_run_sweeps_and_stops_on_cancel() {
        let store = Arc::new(TradeStore::new());
        let record = TradeRecord::dummy_expired(UserId::new(), "a", 1);
        let id = record.id;
        store.insert(record);

        let reconciler = ExpiryReconciler::new(Arc::clone(&store));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(reconciler.run(Duration::from_secs(60), cancel.clone()));

        // The first interval tick fires immediately.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.status_of(id), Some(TradeStatus::Expired));

        cancel.cancel();
        handle.await.unwrap();
    }
}
