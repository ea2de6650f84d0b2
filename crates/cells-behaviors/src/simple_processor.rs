//! Runs a single caller-supplied async function per event; the thinnest
//! possible behavior, for one-off logic that doesn't warrant its own type.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;

/// A boxed async closure: `(ctx, event) -> Result<()>`.
pub type ProcessFn = Box<dyn for<'a> Fn(&'a Context, Event) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> + Send + Sync>;

/// Ad hoc, single-closure behavior (spec §4.6).
pub struct SimpleProcessor {
	process: ProcessFn,
}

impl SimpleProcessor {
	#[must_use]
	pub fn new(process: ProcessFn) -> Self {
		Self { process }
	}
}

#[async_trait]
impl Behavior for SimpleProcessor {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		(self.process)(ctx, event).await
	}
}
