//! # openbarter-query
//!
//! **Read Plane**: listing and search over trade records for OpenBarter.
//!
//! Everything here is read-only with respect to inventories and trade
//! lines; the only mutation a query can cause is the expiry gate flipping
//! stale open offers to `Expired` — the same conditional transition the
//! engine applies.
//!
//! - [`TradeQueryService`]: open-trade listings, offered-card search with
//!   `!`-inversion, expiry/recency ordering, my-trades view
//! - [`OffererReputation`]: completion-ratio reputation annotated onto
//!   every listing

pub mod listing;
pub mod reputation;

pub use listing::{OpenTradeListing, SortBy, TradeQueryService};
pub use reputation::OffererReputation;
