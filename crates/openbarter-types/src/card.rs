//! Card-side domain types: trade line items, inventory holdings, and the
//! read-only catalog metadata consumed by search.
//!
//! The settlement core only ever sees `(CardId, quantity)` pairs. Display
//! names and alternate names live in [`CardInfo`] and are used exclusively
//! for query matching — catalog concerns never leak into settlement.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::CardId;

/// One entry on a trade side: a card type and how many copies of it.
///
/// Within a single trade, the quantity of every line is capped at one copy
/// per entry (the normalization is applied when the record is created);
/// duplicate card ids are kept as distinct lines, not merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLine {
    pub card_id: CardId,
    pub quantity: u32,
}

impl CardLine {
    #[must_use]
    pub fn new(card_id: impl Into<CardId>, quantity: u32) -> Self {
        Self {
            card_id: card_id.into(),
            quantity,
        }
    }

    /// A single copy of the given card type.
    #[must_use]
    pub fn one(card_id: impl Into<CardId>) -> Self {
        Self::new(card_id, 1)
    }
}

/// Accumulate per-card net quantities over a list of lines, preserving
/// first-appearance order. Duplicate lines for the same card sum.
#[must_use]
pub fn line_totals(lines: &[CardLine]) -> Vec<(CardId, u32)> {
    let mut totals: Vec<(CardId, u32)> = Vec::with_capacity(lines.len());
    for line in lines {
        match totals.iter_mut().find(|(id, _)| *id == line.card_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => totals.push((line.card_id.clone(), line.quantity)),
        }
    }
    totals
}

/// A single inventory entry for a (user, card) pair as exposed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHolding {
    pub card_id: CardId,
    /// Copies held. Never negative as an observable result of any operation.
    pub quantity: u32,
}

/// Display metadata for one card type, owned by the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardInfo {
    pub card_id: CardId,
    pub name: String,
    /// Alternate names / aliases the card is known by.
    #[serde(default)]
    pub alternate_names: Vec<String>,
}

impl CardInfo {
    /// Case-insensitive substring match against the name or any alternate
    /// name. `term` must already be lowercased.
    #[must_use]
    pub fn matches(&self, term: &str) -> bool {
        if self.name.to_lowercase().contains(term) {
            return true;
        }
        self.alternate_names
            .iter()
            .any(|alt| alt.to_lowercase().contains(term))
    }
}

/// Read-only card-metadata lookup, populated once from the external source
/// at startup and shared immutably thereafter.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<CardId, CardInfo>,
}

impl CardCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, info: CardInfo) {
        self.cards.insert(info.card_id.clone(), info);
    }

    #[must_use]
    pub fn get(&self, card_id: &CardId) -> Option<&CardInfo> {
        self.cards.get(card_id)
    }

    /// Whether the card with `card_id` matches `term` (already lowercased).
    /// Cards missing from the catalog never match.
    #[must_use]
    pub fn matches(&self, card_id: &CardId, term: &str) -> bool {
        self.cards.get(card_id).is_some_and(|info| info.matches(term))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
