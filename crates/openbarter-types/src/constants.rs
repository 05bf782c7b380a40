//! System-wide constants for the OpenBarter trade engine.

/// Copies of a given card type per listed trade entry. The domain rule is
/// one copy per entry; every line is normalized to this on creation.
pub const COPIES_PER_TRADE_LINE: u32 = 1;

/// Maximum card entries allowed on one side of a trade (default).
pub const DEFAULT_MAX_CARDS_PER_SIDE: usize = 50;

/// Default interval between background expiry sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Upper bound of the reputation display range (`completed/total` scaled).
pub const RATING_SCALE: f64 = 5.0;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenBarter";
