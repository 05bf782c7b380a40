//! # openbarter-engine
//!
//! **Settlement Plane**: trade lifecycle orchestration and expiry
//! reconciliation for OpenBarter.
//!
//! ## Architecture
//!
//! The engine sits between the API layer and the state-plane stores:
//! 1. Every operation first runs the [`ExpiryReconciler`] gate, flipping
//!    stale open offers to `Expired`
//! 2. [`TradeLifecycleManager`] drives the state machine: create persists
//!    an open offer (no escrow), accept wins an atomic claim then settles
//!    the card swap with full rollback on any failure, cancel is the
//!    offeror-only conditional transition
//!
//! ## Acceptance Flow
//!
//! ```text
//! API → sweep gate → TradeStore.claim() (CAS, at most one winner)
//!     → re-validate holdings → InventoryLedger.adjust_many() × 2
//!     → settled  (any failure: compensate + release claim)
//! ```
//!
//! The conservation law holds at every commit point: settlement only moves
//! copies between the two parties, never creates or destroys them.

pub mod lifecycle;
pub mod reconciler;

pub use lifecycle::TradeLifecycleManager;
pub use reconciler::ExpiryReconciler;
