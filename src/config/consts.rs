/// Default period of the `timer` source (1 second)
pub const DEFAULT_TIMER_INTERVAL_MS: u64 = 1_000;
/// Shortest period the `timer` source accepts; smaller values are raised to it
pub const MIN_TIMER_INTERVAL_MS: u64 = 1;
/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
