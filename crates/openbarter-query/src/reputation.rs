//! Offeror reputation, computed at query time from trade statuses.
//!
//! A read-path convenience with no caching: the completion ratio is scaled
//! to a 0–5 display range. It never affects settlement correctness.

use openbarter_types::{TradeStatus, constants};
use serde::Serialize;

/// Public reputation of a trade offeror as shown on listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffererReputation {
    pub username: String,
    pub total_trades: usize,
    pub completed_trades: usize,
    /// `completed / total` scaled to 0–5; 0 when the user has no trades.
    pub rating: f64,
}

impl OffererReputation {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(username: impl Into<String>, statuses: &[TradeStatus]) -> Self {
        let total_trades = statuses.len();
        let completed_trades = statuses
            .iter()
            .filter(|status| **status == TradeStatus::Completed)
            .count();
        let rating = if total_trades == 0 {
            0.0
        } else {
            (completed_trades as f64 / total_trades as f64) * constants::RATING_SCALE
        };
        Self {
            username: username.into(),
            total_trades,
            completed_trades,
            rating,
        }
    }

    /// Placeholder for offerors missing from the directory.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            username: "Unknown".to_string(),
            total_trades: 0,
            completed_trades: 0,
            rating: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_trades_means_zero_rating() {
        let rep = OffererReputation::compute("alice", &[]);
        assert_eq!(rep.total_trades, 0);
        assert_eq!(rep.completed_trades, 0);
        assert!((rep.rating - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rating_is_completion_ratio_scaled_to_five() {
        let statuses = [
            TradeStatus::Completed,
            TradeStatus::Completed,
            TradeStatus::Cancelled,
            TradeStatus::Expired,
        ];
        let rep = OffererReputation::compute("bob", &statuses);
        assert_eq!(rep.total_trades, 4);
        assert_eq!(rep.completed_trades, 2);
        assert!((rep.rating - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn all_completed_is_five() {
        let statuses = [TradeStatus::Completed; 3];
        let rep = OffererReputation::compute("carol", &statuses);
        assert!((rep.rating - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_placeholder() {
        let rep = OffererReputation::unknown();
        assert_eq!(rep.username, "Unknown");
        assert_eq!(rep.total_trades, 0);
        assert!((rep.rating - 0.0).abs() < f64::EPSILON);
    }
}
