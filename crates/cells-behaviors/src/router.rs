//! Delivers each event to whichever subset of subscribers a routing
//! predicate selects, rather than fanning out to all of them.

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::id::CellId;

/// Called once per `(emitter, candidate subscriber, event)`; `true` delivers.
pub type RouteFn = Box<dyn Fn(&CellId, &CellId, &Event) -> bool + Send + Sync>;

/// Per-subscriber routing behavior (spec §4.6).
pub struct Router {
	route_fn: RouteFn,
}

impl Router {
	#[must_use]
	pub fn new(route_fn: RouteFn) -> Self {
		Self { route_fn }
	}
}

#[async_trait]
impl Behavior for Router {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		let mut targets = Vec::new();
		ctx.subscribers_do(|id| targets.push(id.clone()));

		let mut first_err = None;
		for sub in targets {
			if (self.route_fn)(ctx.id(), &sub, &event) {
				if let Err(e) = ctx.environment().emit(sub, event.clone()).await {
					if first_err.is_none() {
						first_err = Some(e);
					}
				}
			}
		}
		match first_err {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}
}
