//! Transforms each event through a caller-supplied function before forwarding.

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::id::CellId;

/// Produces the event to forward, or an error that aborts delivery.
pub type MapFn = Box<dyn Fn(&CellId, Event) -> Result<Event> + Send + Sync>;

/// Transform-and-forward behavior (spec §4.6).
pub struct Mapper {
	map_fn: MapFn,
}

impl Mapper {
	#[must_use]
	pub fn new(map_fn: MapFn) -> Self {
		Self { map_fn }
	}
}

#[async_trait]
impl Behavior for Mapper {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		let mapped = (self.map_fn)(ctx.id(), event)?;
		ctx.emit(mapped).await
	}
}
