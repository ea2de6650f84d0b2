//! Accumulates a bounded, drop-oldest history of events while still
//! forwarding each one to subscribers.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::payload::{Payload, Value};

use crate::reserved;

/// One recorded entry: the event's topic and payload at the time it arrived.
#[derive(Debug, Clone)]
pub struct Collected {
	pub topic: String,
	pub payload: Payload,
}

/// Bounded-history behavior (spec §4.6). Holds at most `max` entries,
/// evicting the oldest on overflow.
pub struct Collector {
	max: usize,
	items: VecDeque<Collected>,
}

impl Collector {
	#[must_use]
	pub fn new(max: usize) -> Self {
		Self {
			max: max.max(1),
			items: VecDeque::new(),
		}
	}
}

#[async_trait]
impl Behavior for Collector {
	async fn process_event(&mut self, ctx: &Context, mut event: Event) -> Result<()> {
		match event.topic().as_str() {
			reserved::COLLECTED_QUERY => {
				let snapshot: Vec<Collected> = self.items.iter().cloned().collect();
				event.respond(Ok(Value::Any(Arc::new(snapshot))))
			}
			reserved::RESET => {
				self.items.clear();
				Ok(())
			}
			_ => {
				if self.items.len() >= self.max {
					self.items.pop_front();
				}
				self.items.push_back(Collected {
					topic: event.topic().as_str().to_string(),
					payload: event.payload().clone(),
				});
				ctx.emit(event).await
			}
		}
	}
}
