//! Invokes a fixed sequence of plain Rust callbacks for each event,
//! stopping at the first one that fails.

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::payload::Payload;

/// A single callback invoked with an event's topic and payload.
pub type CallbackFn = Box<dyn Fn(&str, &Payload) -> Result<()> + Send + Sync>;

/// Host-integration behavior (spec §4.6): a thin adapter from cell events to
/// ordinary function calls, with no forwarding of its own.
pub struct Callback {
	callbacks: Vec<CallbackFn>,
}

impl Callback {
	#[must_use]
	pub fn new(callbacks: Vec<CallbackFn>) -> Self {
		Self { callbacks }
	}
}

#[async_trait]
impl Behavior for Callback {
	async fn process_event(&mut self, _ctx: &Context, event: Event) -> Result<()> {
		for f in &self.callbacks {
			f(event.topic().as_str(), event.payload())?;
		}
		Ok(())
	}
}
