//! # openbarter-ledger
//!
//! **State Plane**: the stores that own OpenBarter's shared mutable
//! resources and expose the atomic conditional-update primitives the
//! settlement plane is built on.
//!
//! ## Architecture
//!
//! 1. **InventoryLedger**: per-(user, card) copy counts with atomic
//!    per-user batch adjustment and the non-negative invariant
//! 2. **TradeStore**: trade records with compare-and-set status
//!    transitions — the serialization point for racing accepts, cancels,
//!    and expiry sweeps
//! 3. **UserDirectory**: user profiles and their created-trade lists
//!
//! TradeRecord and card holdings are the only shared mutable resources in
//! the system; all mutation goes through this crate. No caller may
//! read-then-blind-write either resource.

pub mod directory;
pub mod inventory;
pub mod trade_store;

pub use directory::{UserDirectory, UserProfile};
pub use inventory::InventoryLedger;
pub use trade_store::TradeStore;
