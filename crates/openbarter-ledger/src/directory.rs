//! User directory — the engine-side view of the externally owned user
//! aggregate: profile, credit balance, and the list of trades the user has
//! created.
//!
//! Identity and authentication stay external; every operation here takes an
//! already-verified [`UserId`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use openbarter_types::{BarterError, Result, TradeId, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A user profile as the trade engine sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    /// Game-credit balance. Earned and spent by out-of-scope features
    /// (selling cards, buying packs); carried here so the aggregate is whole.
    pub credits: u64,
    /// Ids of every trade this user has created, in creation order.
    pub trades: Vec<TradeId>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            credits: 0,
            trades: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// In-memory directory of user profiles.
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<UserId, UserProfile>>,
}

impl UserDirectory {
    /// Create a new empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh user and return their profile.
    pub fn register(&self, username: impl Into<String>) -> UserProfile {
        let profile = UserProfile::new(username);
        self.users.write().insert(profile.id, profile.clone());
        profile
    }

    /// Insert or replace a profile (save-the-aggregate path).
    pub fn insert(&self, profile: UserProfile) {
        self.users.write().insert(profile.id, profile);
    }

    /// Look up a profile snapshot.
    ///
    /// # Errors
    /// Returns `UserNotFound` if no profile exists for `user_id`.
    pub fn find(&self, user_id: UserId) -> Result<UserProfile> {
        self.users
            .read()
            .get(&user_id)
            .cloned()
            .ok_or(BarterError::UserNotFound(user_id))
    }

    /// Whether a profile exists for `user_id`.
    #[must_use]
    pub fn exists(&self, user_id: UserId) -> bool {
        self.users.read().contains_key(&user_id)
    }

    /// Append a trade id to a user's created-trades list, in place.
    ///
    /// # Errors
    /// Returns `UserNotFound` if no profile exists for `user_id`.
    pub fn append_trade(&self, user_id: UserId, trade_id: TradeId) -> Result<()> {
        let mut users = self.users.write();
        let profile = users
            .get_mut(&user_id)
            .ok_or(BarterError::UserNotFound(user_id))?;
        profile.trades.push(trade_id);
        Ok(())
    }

    /// Number of registered users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_find() {
        let directory = UserDirectory::new();
        let profile = directory.register("alice");

        let back = directory.find(profile.id).unwrap();
        assert_eq!(back.username, "alice");
        assert_eq!(back.credits, 0);
        assert!(back.trades.is_empty());
        assert!(directory.exists(profile.id));
    }

    #[test]
    fn find_missing_user_errors() {
        let directory = UserDirectory::new();
        let err = directory.find(UserId::new()).unwrap_err();
        assert!(matches!(err, BarterError::UserNotFound(_)));
    }

    #[test]
    fn append_trade_grows_list_in_order() {
        let directory = UserDirectory::new();
        let profile = directory.register("bob");
        let t1 = TradeId::new();
        let t2 = TradeId::new();

        directory.append_trade(profile.id, t1).unwrap();
        directory.append_trade(profile.id, t2).unwrap();

        let back = directory.find(profile.id).unwrap();
        assert_eq!(back.trades, vec![t1, t2]);
    }

    #[test]
    fn append_trade_to_missing_user_errors() {
        let directory = UserDirectory::new();
        let err = directory
            .append_trade(UserId::new(), TradeId::new())
            .unwrap_err();
        assert!(matches!(err, BarterError::UserNotFound(_)));
    }
}
