//! Open-trade listings and search.
//!
//! Purely a read path: never returns a trade owned by the caller or one
//! that is not open. The expiry gate runs in front of every query with the
//! same conditional-transition logic as the engine's.

use std::sync::Arc;

use chrono::Utc;
use openbarter_engine::ExpiryReconciler;
use openbarter_ledger::{TradeStore, UserDirectory};
use openbarter_types::{CardCatalog, Result, TradeRecord, TradeStatus, UserId};
use serde::{Deserialize, Serialize};

use crate::reputation::OffererReputation;

/// Sort order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Latest-expiring offers first (`expire_at` descending).
    Recent,
    /// Soonest-expiring offers first (`expire_at` ascending).
    Expiring,
}

/// One open trade annotated with its offeror's public reputation.
#[derive(Debug, Clone, Serialize)]
pub struct OpenTradeListing {
    pub trade: TradeRecord,
    pub offeror: OffererReputation,
}

/// Read-only listing/search over the trade store.
pub struct TradeQueryService {
    trades: Arc<TradeStore>,
    directory: Arc<UserDirectory>,
    catalog: Arc<CardCatalog>,
    reconciler: ExpiryReconciler,
}

impl TradeQueryService {
    #[must_use]
    pub fn new(
        trades: Arc<TradeStore>,
        directory: Arc<UserDirectory>,
        catalog: Arc<CardCatalog>,
    ) -> Self {
        let reconciler = ExpiryReconciler::new(Arc::clone(&trades));
        Self {
            trades,
            directory,
            catalog,
            reconciler,
        }
    }

    /// Every open, unexpired trade not owned by the caller, newest first.
    #[must_use]
    pub fn list_open_trades(&self, excluding_user: UserId) -> Vec<OpenTradeListing> {
        self.reconciler.sweep(Utc::now());
        let mut listings = self.collect_open(excluding_user);
        listings.sort_by(|a, b| b.trade.created_at.cmp(&a.trade.created_at));
        listings
    }

    /// Search the open set by offered-card name.
    ///
    /// `query` is a case-insensitive substring matched against each offered
    /// card's display name and alternate names; a leading `!` inverts the
    /// match (keep trades whose offered cards do *not* match). With no
    /// `sort_by` the result is ordered most-recently-created first.
    #[must_use]
    pub fn search_trades(
        &self,
        query: Option<&str>,
        sort_by: Option<SortBy>,
        excluding_user: UserId,
    ) -> Vec<OpenTradeListing> {
        self.reconciler.sweep(Utc::now());
        let mut listings = self.collect_open(excluding_user);

        if let Some(raw) = query {
            let trimmed = raw.trim().to_lowercase();
            if !trimmed.is_empty() {
                let (invert, term) = match trimmed.strip_prefix('!') {
                    Some(rest) => (true, rest.to_string()),
                    None => (false, trimmed),
                };
                listings.retain(|listing| {
                    let matched = listing
                        .trade
                        .offered
                        .iter()
                        .any(|line| self.catalog.matches(&line.card_id, &term));
                    matched != invert
                });
            }
        }

        match sort_by {
            Some(SortBy::Recent) => {
                listings.sort_by(|a, b| b.trade.expire_at.cmp(&a.trade.expire_at));
            }
            Some(SortBy::Expiring) => {
                listings.sort_by(|a, b| a.trade.expire_at.cmp(&b.trade.expire_at));
            }
            None => listings.sort_by(|a, b| b.trade.created_at.cmp(&a.trade.created_at)),
        }
        listings
    }

    /// All trades the user has created, any status, newest first.
    ///
    /// # Errors
    /// Returns `UserNotFound` if the user is not registered.
    pub fn trades_for_user(&self, user_id: UserId) -> Result<Vec<TradeRecord>> {
        self.reconciler.sweep(Utc::now());
        let profile = self.directory.find(user_id)?;
        let mut records: Vec<TradeRecord> = profile
            .trades
            .iter()
            .filter_map(|trade_id| self.trades.get(*trade_id))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn collect_open(&self, excluding_user: UserId) -> Vec<OpenTradeListing> {
        let now = Utc::now();
        self.trades
            .all()
            .into_iter()
            .filter(|trade| {
                trade.status == TradeStatus::Open
                    && trade.offeror_id != excluding_user
                    && !trade.is_expired_at(now)
            })
            .map(|trade| {
                let offeror = self.reputation_of(trade.offeror_id);
                OpenTradeListing { trade, offeror }
            })
            .collect()
    }

    fn reputation_of(&self, user_id: UserId) -> OffererReputation {
        match self.directory.find(user_id) {
            Ok(profile) => {
                let statuses: Vec<TradeStatus> = profile
                    .trades
                    .iter()
                    .filter_map(|trade_id| self.trades.status_of(*trade_id))
                    .collect();
                OffererReputation::compute(profile.username, &statuses)
            }
            Err(_) => OffererReputation::unknown(),
        }
    }
}
