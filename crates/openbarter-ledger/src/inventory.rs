//! Card inventory management.
//!
//! Tracks per-(user, card) copy counts. All mutations are atomic per user:
//! either the full batch of adjustments succeeds or the inventory is
//! unchanged, and no quantity ever goes below zero.

use std::collections::HashMap;

use openbarter_types::{BarterError, CardHolding, CardId, Result, UserId};
use parking_lot::RwLock;

/// The source of truth for card holdings.
///
/// Shared across request tasks; every batch of adjustments for one user is
/// applied under a single write-lock acquisition, which makes the batch a
/// single atomic operation with respect to all other ledger users.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    /// Per-(user, card) copy counts.
    holdings: RwLock<HashMap<(UserId, CardId), u32>>,
}

impl InventoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant copies of a card (pack opening, purchases — the deposit-shaped
    /// seeding primitive). Creates the holding if absent.
    pub fn grant(&self, user_id: UserId, card_id: &CardId, quantity: u32) {
        let mut holdings = self.holdings.write();
        let entry = holdings.entry((user_id, card_id.clone())).or_insert(0);
        *entry += quantity;
    }

    /// Apply a batch of quantity deltas to one user's holdings.
    ///
    /// Deltas for a repeated card id accumulate. The batch is two-phase:
    /// every accumulated delta is validated against current state, then all
    /// are applied — under one write guard, so either every delta lands or
    /// none does.
    ///
    /// `allow_create` controls whether a positive delta may create a holding
    /// the user does not have yet (true when receiving a new card type via
    /// trade).
    ///
    /// # Errors
    /// - `InsufficientQuantity` if any resulting count would go below zero,
    ///   identifying the first offending card; no deltas are applied.
    /// - `CardNotHeld` if a positive delta targets an absent holding and
    ///   `allow_create` is false.
    pub fn adjust_many(
        &self,
        user_id: UserId,
        deltas: &[(CardId, i64)],
        allow_create: bool,
    ) -> Result<()> {
        let net = accumulate(deltas);

        let mut holdings = self.holdings.write();

        // Phase 1: validate every accumulated delta against current state.
        let mut staged: Vec<((UserId, CardId), u32)> = Vec::with_capacity(net.len());
        for (card_id, delta) in &net {
            let held = holdings.get(&(user_id, card_id.clone())).copied();
            match held {
                // A zero net delta on an absent holding is a no-op, not a
                // reason to materialize an empty entry.
                None if *delta == 0 => continue,
                None if *delta < 0 => {
                    return Err(BarterError::InsufficientQuantity {
                        card_id: card_id.clone(),
                        needed: clamp_u32(delta.unsigned_abs()),
                        held: 0,
                    });
                }
                None if *delta > 0 && !allow_create => {
                    return Err(BarterError::CardNotHeld {
                        card_id: card_id.clone(),
                    });
                }
                _ => {}
            }
            let next = i64::from(held.unwrap_or(0)) + delta;
            if next < 0 {
                return Err(BarterError::InsufficientQuantity {
                    card_id: card_id.clone(),
                    needed: clamp_u32(delta.unsigned_abs()),
                    held: held.unwrap_or(0),
                });
            }
            let next = u32::try_from(next).map_err(|_| {
                BarterError::Internal(format!("quantity overflow for card {card_id}"))
            })?;
            staged.push(((user_id, card_id.clone()), next));
        }

        // Phase 2: apply. Cannot fail after validation.
        for (key, quantity) in staged {
            holdings.insert(key, quantity);
        }
        Ok(())
    }

    /// Copies of `card_id` held by `user_id` (zero if absent).
    #[must_use]
    pub fn quantity(&self, user_id: UserId, card_id: &CardId) -> u32 {
        self.holdings
            .read()
            .get(&(user_id, card_id.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// All of a user's holdings, sorted by card id. Entries driven to zero
    /// by trades remain visible.
    #[must_use]
    pub fn holdings(&self, user_id: UserId) -> Vec<CardHolding> {
        let mut out: Vec<CardHolding> = self
            .holdings
            .read()
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|((_, card_id), quantity)| CardHolding {
                card_id: card_id.clone(),
                quantity: *quantity,
            })
            .collect();
        out.sort_by(|a, b| a.card_id.cmp(&b.card_id));
        out
    }

    /// Total copies of a card across all users. Settlement only moves copies
    /// between holders, so this is invariant under any trade.
    #[must_use]
    pub fn total_quantity(&self, card_id: &CardId) -> u64 {
        self.holdings
            .read()
            .iter()
            .filter(|((_, cid), _)| cid == card_id)
            .map(|(_, quantity)| u64::from(*quantity))
            .sum()
    }
}

/// Fold a delta list into per-card nets, preserving first-appearance order.
fn accumulate(deltas: &[(CardId, i64)]) -> Vec<(CardId, i64)> {
    let mut net: Vec<(CardId, i64)> = Vec::with_capacity(deltas.len());
    for (card_id, delta) in deltas {
        match net.iter_mut().find(|(id, _)| id == card_id) {
            Some((_, acc)) => *acc += delta,
            None => net.push((card_id.clone(), *delta)),
        }
    }
    net
}

fn clamp_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
