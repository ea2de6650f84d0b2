//! Reserved topic and payload-key strings the stock behaviors honor (spec §6).

/// Ticker's periodic emission.
pub const TICK: &str = "tick!";
/// Clears a behavior's accumulated state (`Counter`, `Collector`).
pub const RESET: &str = "reset!";
/// Requests a `Collector`'s current snapshot.
pub const COLLECTED_QUERY: &str = "collected?";
/// Requests a `Counter`'s current tallies.
pub const COUNTERS_QUERY: &str = "counters?";
/// Requests an `Fsm`'s current status.
pub const STATUS_QUERY: &str = "status?";
/// Requests a `Configurator` load+validate its configuration file.
pub const READ_CONFIGURATION: &str = "readConfiguration!";
/// `Configurator`'s emitted result topic, and the payload key it's keyed under.
pub const CONFIGURATION: &str = "configuration";

/// Payload key a `Ticker` event carries its own cell id under.
pub const TICKER_ID: &str = "ticker:id";
/// Payload key a `Ticker` event carries its fire time under.
pub const TICKER_TIME: &str = "ticker:time";
/// Payload key `readConfiguration!` carries the filename under.
pub const CONFIGURATION_FILENAME: &str = "configuration:filename";
