//! Optional measurement hook invoked around each `process_event` (spec §6).

/// Capability that times a named span.
///
/// Injected at environment construction so a host can wire in real metrics
/// without the runtime depending on any particular metrics crate.
pub trait Monitor: Send + Sync {
	/// Starts timing `name`; the returned token's `end` stops it.
	fn begin_measure(&self, name: &str) -> Box<dyn MeasureToken>;
}

/// A single in-flight measurement.
pub trait MeasureToken: Send {
	/// Stops the measurement.
	fn end(self: Box<Self>);
}

/// Default [`Monitor`] that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl Monitor for NullMonitor {
	fn begin_measure(&self, _name: &str) -> Box<dyn MeasureToken> {
		Box::new(NullToken)
	}
}

struct NullToken;

impl MeasureToken for NullToken {
	fn end(self: Box<Self>) {}
}
