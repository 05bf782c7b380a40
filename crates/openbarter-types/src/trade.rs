//! # TradeRecord — the trade-offer lifecycle primitive
//!
//! A `TradeRecord` is one user's standing offer to exchange specific cards
//! for other specific cards. It is created `Open` and mutated in place
//! exactly once by whichever of accept / cancel / expire wins the race.
//!
//! ## State Machine
//!
//! ```text
//!              accept
//!   ┌──────┐ ─────────▶ ┌───────────┐
//!   │ OPEN │            │ COMPLETED │
//!   └─┬──┬─┘            └───────────┘
//!     │  │ cancel       ┌───────────┐
//!     │  └─────────────▶│ CANCELLED │
//!     │    expire       └───────────┘
//!     │                 ┌───────────┐
//!     └────────────────▶│  EXPIRED  │
//!                       └───────────┘
//! ```
//!
//! All three target states are terminal; transitions are monotonic and
//! one-way. The conditional compare-and-set on `status` (provided by the
//! trade store) is the sole serialization point between racing operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CardLine, TradeId, UserId, line_totals};

/// The lifecycle state of a trade offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradeStatus {
    /// The offer stands and can be accepted, cancelled, or expired.
    Open,
    /// A buyer accepted the offer and the card swap settled. **Irreversible.**
    Completed,
    /// The offeror withdrew the offer. No inventory effect.
    Cancelled,
    /// The offer outlived its `expire_at` instant. No inventory effect.
    Expired,
}

impl TradeStatus {
    /// Can this status transition to the given target status?
    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Open, Self::Completed | Self::Cancelled | Self::Expired)
        )
    }

    /// Whether this status is terminal (no further transitions).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != Self::Open
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// One trade offer: offered cards against requested cards, with a lifetime.
///
/// `offered` and `requested` are immutable after creation. `buyer_id` is set
/// exactly once, atomically with the `Open → Completed` transition, and holds
/// a value if and only if the status is `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    /// The user who created the offer.
    pub offeror_id: UserId,
    /// The user who accepted it. `None` until completion.
    pub buyer_id: Option<UserId>,
    /// Cards the offeror gives up, one copy per line.
    pub offered: Vec<CardLine>,
    /// Cards the offeror wants in return, one copy per line.
    pub requested: Vec<CardLine>,
    pub status: TradeStatus,
    pub created_at: DateTime<Utc>,
    /// Instant after which the offer can no longer be accepted or cancelled.
    pub expire_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Build a fresh `Open` record.
    ///
    /// Every line's quantity is normalized to exactly 1 — the domain rule is
    /// one copy of a given card type per listed entry. Duplicate card ids are
    /// kept as distinct lines, exactly as offered.
    #[must_use]
    pub fn new(
        offeror_id: UserId,
        offered: Vec<CardLine>,
        requested: Vec<CardLine>,
        created_at: DateTime<Utc>,
        expire_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TradeId::new(),
            offeror_id,
            buyer_id: None,
            offered: Self::normalize(offered),
            requested: Self::normalize(requested),
            status: TradeStatus::Open,
            created_at,
            expire_at,
        }
    }

    fn normalize(lines: Vec<CardLine>) -> Vec<CardLine> {
        lines
            .into_iter()
            .map(|line| CardLine::one(line.card_id))
            .collect()
    }

    /// Returns `true` if this offer has outlived its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at <= now
    }

    /// Returns `true` if this offer is currently acceptable at `now`.
    #[must_use]
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == TradeStatus::Open && !self.is_expired_at(now)
    }

    /// Per-card totals of the offered side (duplicate lines summed).
    #[must_use]
    pub fn offered_totals(&self) -> Vec<(crate::CardId, u32)> {
        line_totals(&self.offered)
    }

    /// Per-card totals of the requested side (duplicate lines summed).
    #[must_use]
    pub fn requested_totals(&self) -> Vec<(crate::CardId, u32)> {
        line_totals(&self.requested)
    }
}

impl std::fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} offers {} card(s) for {} card(s) [{}]",
            self.id,
            self.offeror_id,
            self.offered.len(),
            self.requested.len(),
            self.status,
        )
    }
}

/// Dummy record builders for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl TradeRecord {
    /// An open one-for-one offer expiring an hour from now.
    pub fn dummy(offeror_id: UserId, offered_card: &str, requested_card: &str) -> Self {
        let now = Utc::now();
        Self::new(
            offeror_id,
            vec![CardLine::one(offered_card)],
            vec![CardLine::one(requested_card)],
            now,
            now + chrono::Duration::hours(1),
        )
    }

    /// An open offer that expired `secs_ago` seconds before now.
    pub fn dummy_expired(offeror_id: UserId, offered_card: &str, secs_ago: i64) -> Self {
        let now = Utc::now();
        let mut record = Self::dummy(offeror_id, offered_card, "wanted");
        record.created_at = now - chrono::Duration::seconds(secs_ago + 60);
        record.expire_at = now - chrono::Duration::seconds(secs_ago);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_valid() {
        assert!(TradeStatus::Open.can_transition_to(TradeStatus::Completed));
        assert!(TradeStatus::Open.can_transition_to(TradeStatus::Cancelled));
        assert!(TradeStatus::Open.can_transition_to(TradeStatus::Expired));
    }

    #[test]
    fn status_transitions_invalid() {
        for terminal in [
            TradeStatus::Completed,
            TradeStatus::Cancelled,
            TradeStatus::Expired,
        ] {
            assert!(terminal.is_terminal());
            for target in [
                TradeStatus::Open,
                TradeStatus::Completed,
                TradeStatus::Cancelled,
                TradeStatus::Expired,
            ] {
                assert!(
                    !terminal.can_transition_to(target),
                    "{terminal} -> {target} must be rejected"
                );
            }
        }
    }

    #[test]
    fn status_display() {
        assert_eq!(format!("{}", TradeStatus::Open), "OPEN");
        assert_eq!(format!("{}", TradeStatus::Expired), "EXPIRED");
    }

    #[test]
    fn new_record_normalizes_quantities_to_one() {
        let record = TradeRecord::new(
            UserId::new(),
            vec![CardLine::new("cardX", 5), CardLine::new("cardX", 3)],
            vec![CardLine::new("cardY", 2)],
            Utc::now(),
            Utc::now() + chrono::Duration::hours(1),
        );
        assert!(record.offered.iter().all(|l| l.quantity == 1));
        assert!(record.requested.iter().all(|l| l.quantity == 1));
        // Duplicate entries are kept distinct, not merged.
        assert_eq!(record.offered.len(), 2);
        assert_eq!(record.offered_totals(), vec![(crate::CardId::new("cardX"), 2)]);
    }

    #[test]
    fn expiry_checks() {
        let record = TradeRecord::dummy(UserId::new(), "a", "b");
        let now = Utc::now();
        assert!(!record.is_expired_at(now));
        assert!(record.is_open_at(now));
        assert!(record.is_expired_at(record.expire_at));
        assert!(!record.is_open_at(record.expire_at + chrono::Duration::seconds(1)));
    }

    #[test]
    fn record_serde_roundtrip() {
        let record = TradeRecord::dummy(UserId::new(), "cardX", "cardY");
        let json = serde_json::to_string(&record).unwrap();
        let back: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record.id, back.id);
        assert_eq!(back.status, TradeStatus::Open);
        assert_eq!(back.buyer_id, None);
        assert_eq!(record.offered, back.offered);
    }
}
