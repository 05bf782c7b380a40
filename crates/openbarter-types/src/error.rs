//! Error types for the OpenBarter trade engine.
//!
//! All errors use the `OB_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Validation errors
//! - 2xx: Not-found errors
//! - 3xx: Authorization errors
//! - 4xx: Conflict errors (business-rule violations at mutation time)
//! - 9xx: Internal errors

use thiserror::Error;

use crate::{CardId, TradeId, UserId};

/// Central error enum for all OpenBarter operations.
#[derive(Debug, Error)]
pub enum BarterError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// A trade side was submitted with no cards.
    #[error("OB_ERR_100: Empty {side} card list")]
    EmptyCardList { side: &'static str },

    /// The requested expiry is not strictly in the future.
    #[error("OB_ERR_101: Expiry {expire_at} is not in the future")]
    ExpiryNotInFuture { expire_at: chrono::DateTime<chrono::Utc> },

    /// Too many card entries on one trade side.
    #[error("OB_ERR_102: Too many cards on the {side} side: {count} exceeds {max}")]
    TooManyCards {
        side: &'static str,
        count: usize,
        max: usize,
    },

    // =================================================================
    // Not-Found Errors (2xx)
    // =================================================================
    /// The trade does not exist (or, for cancel, is no longer open).
    #[error("OB_ERR_200: Trade not found: {0}")]
    TradeNotFound(TradeId),

    /// The user does not exist in the directory.
    #[error("OB_ERR_201: User not found: {0}")]
    UserNotFound(UserId),

    // =================================================================
    // Authorization Errors (3xx)
    // =================================================================
    /// Only the offeror may cancel a trade.
    #[error("OB_ERR_300: User {requester} is not the offeror of trade {trade_id}")]
    NotOfferor { trade_id: TradeId, requester: UserId },

    // =================================================================
    // Conflict Errors (4xx)
    // =================================================================
    /// The trade is not open — the expected, common outcome of a race loser.
    #[error("OB_ERR_400: Trade not open: {0}")]
    TradeNotOpen(TradeId),

    /// Offeror and buyer are the same user.
    #[error("OB_ERR_401: Self-trade blocked on trade {0}: offeror and buyer are the same user")]
    SelfTrade(TradeId),

    /// A holding cannot absorb the requested adjustment.
    #[error("OB_ERR_402: Insufficient quantity for card {card_id}: need {needed}, have {held}")]
    InsufficientQuantity {
        card_id: CardId,
        needed: u32,
        held: u32,
    },

    /// A positive adjustment targeted a card the user does not hold, and
    /// creating the holding was not allowed.
    #[error("OB_ERR_403: Card {card_id} not held by user")]
    CardNotHeld { card_id: CardId },

    // =================================================================
    // Internal Errors (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OB_ERR_900: Internal error: {0}")]
    Internal(String),

    /// A settlement rollback could not be applied. This violates the
    /// conservation invariant and requires operator attention, not retry.
    #[error("OB_ERR_901: Rollback failed for trade {trade_id}: {reason}")]
    RollbackFailed { trade_id: TradeId, reason: String },
}

/// Coarse error taxonomy for transport mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    Conflict,
    Internal,
}

impl BarterError {
    /// The taxonomy bucket this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCardList { .. }
            | Self::ExpiryNotInFuture { .. }
            | Self::TooManyCards { .. } => ErrorKind::Validation,
            Self::TradeNotFound(_) | Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::NotOfferor { .. } => ErrorKind::Authorization,
            Self::TradeNotOpen(_)
            | Self::SelfTrade(_)
            | Self::InsufficientQuantity { .. }
            | Self::CardNotHeld { .. } => ErrorKind::Conflict,
            Self::Internal(_) | Self::RollbackFailed { .. } => ErrorKind::Internal,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BarterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = BarterError::TradeNotFound(TradeId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("OB_ERR_200"), "Got: {msg}");
    }

    #[test]
    fn insufficient_quantity_names_card() {
        let err = BarterError::InsufficientQuantity {
            card_id: CardId::new("cardX"),
            needed: 2,
            held: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OB_ERR_402"));
        assert!(msg.contains("cardX"));
        assert!(msg.contains("need 2"));
    }

    #[test]
    fn all_errors_have_ob_err_prefix() {
        let errors: Vec<BarterError> = vec![
            BarterError::EmptyCardList { side: "offered" },
            BarterError::TradeNotOpen(TradeId::new()),
            BarterError::SelfTrade(TradeId::new()),
            BarterError::CardNotHeld {
                card_id: CardId::new("c"),
            },
            BarterError::Internal("test".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OB_ERR_"),
                "Error missing OB_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn kind_mapping_follows_taxonomy() {
        assert_eq!(
            BarterError::EmptyCardList { side: "offered" }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            BarterError::UserNotFound(UserId::new()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BarterError::NotOfferor {
                trade_id: TradeId::new(),
                requester: UserId::new(),
            }
            .kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            BarterError::TradeNotOpen(TradeId::new()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BarterError::RollbackFailed {
                trade_id: TradeId::new(),
                reason: "x".into(),
            }
            .kind(),
            ErrorKind::Internal
        );
    }
}
