//! Environment-wide tuning knobs and the capabilities injected alongside them.

use std::sync::Arc;
use std::time::Duration;

pub use crate::cell::BackpressurePolicy;
use crate::id::{IdGenerator, UuidV4Generator};
use crate::monitor::{Monitor, NullMonitor};

/// Construction-time configuration for an [`crate::environment::Environment`].
///
/// Defaults match spec §4.4/§6: blocking backpressure, a 64-slot mailbox, a
/// 3-failures-in-10-seconds crash window, a random UUIDv4 id generator, and
/// no monitoring.
#[derive(Clone)]
pub struct EnvironmentConfig {
	/// Mailbox capacity given to every cell unless overridden.
	pub mailbox_capacity: usize,
	/// Policy applied when a cell's mailbox is full.
	pub backpressure: BackpressurePolicy,
	/// Failures tolerated within `crash_window` before a cell is terminated.
	pub max_failures: u32,
	/// Trailing window `max_failures` is counted over.
	pub crash_window: Duration,
	/// Default timeout for `Environment::request`.
	pub request_timeout: Duration,
	/// Mints cell/scene ids when a caller doesn't name its own.
	pub id_generator: Arc<dyn IdGenerator>,
	/// Measurement hook invoked around each `process_event`.
	pub monitor: Arc<dyn Monitor>,
}

impl Default for EnvironmentConfig {
	fn default() -> Self {
		Self {
			mailbox_capacity: 64,
			backpressure: BackpressurePolicy::Block,
			max_failures: 3,
			crash_window: Duration::from_secs(10),
			request_timeout: Duration::from_secs(5),
			id_generator: Arc::new(UuidV4Generator),
			monitor: Arc::new(NullMonitor),
		}
	}
}
