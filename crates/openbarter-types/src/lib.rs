//! # openbarter-types
//!
//! Shared types, errors, and configuration for the **OpenBarter**
//! trade-settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`UserId`], [`TradeId`], [`CardId`]
//! - **Card model**: [`CardLine`], [`CardHolding`], [`CardInfo`], [`CardCatalog`]
//! - **Trade model**: [`TradeRecord`], [`TradeStatus`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`BarterError`] with `OB_ERR_` prefix codes and [`ErrorKind`]
//! - **Constants**: system-wide limits and defaults

pub mod card;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use openbarter_types::{TradeRecord, TradeStatus, CardLine, ...};

pub use card::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use trade::*;

// Constants are accessed via `openbarter_types::constants::FOO`
// (not re-exported to avoid name collisions).
