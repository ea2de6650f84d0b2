//! Delivers each event to exactly one subscriber, cycling through the
//! current subscriber list in order.

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::Result;
use cells_core::event::Event;
use cells_core::id::CellId;

/// Single-target, round-robin delivery behavior (spec §4.6).
#[derive(Debug, Default)]
pub struct RoundRobin {
	cursor: usize,
}

impl RoundRobin {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl Behavior for RoundRobin {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		let mut targets: Vec<CellId> = Vec::new();
		ctx.subscribers_do(|id| targets.push(id.clone()));
		if targets.is_empty() {
			return Ok(());
		}
		let idx = self.cursor % targets.len();
		self.cursor = self.cursor.wrapping_add(1);
		ctx.environment().emit(targets[idx].clone(), event).await
	}
}

#[cfg(test)]
mod tests {
	use cells_core::config::EnvironmentConfig;
	use cells_core::environment::Environment;
	use cells_core::payload::Payload;
	use pretty_assertions::assert_eq;

	use super::*;

	struct Sink(tokio::sync::mpsc::UnboundedSender<String>);

	#[async_trait]
	impl Behavior for Sink {
		async fn process_event(&mut self, ctx: &Context, _event: Event) -> Result<()> {
			let _ = self.0.send(ctx.id().as_str().to_string());
			Ok(())
		}
	}

	#[tokio::test]
	async fn cycles_through_subscribers_in_order() {
		let env = Environment::start(EnvironmentConfig::default());
		let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
		for name in ["w1", "w2", "w3"] {
			env.start_cell(CellId::new(name).unwrap(), Box::new(Sink(tx.clone()))).await.unwrap();
		}
		drop(tx);
		env.start_cell(CellId::new("rr").unwrap(), Box::new(RoundRobin::new())).await.unwrap();
		env.subscribe(&CellId::new("rr").unwrap(), vec![CellId::new("w1").unwrap(), CellId::new("w2").unwrap(), CellId::new("w3").unwrap()])
			.await
			.unwrap();

		let mut got = Vec::new();
		for _ in 0..4 {
			env.emit_new(CellId::new("rr").unwrap(), "t", Payload::empty(), None).await.unwrap();
			got.push(rx.recv().await.unwrap());
		}

		assert_eq!(got, vec!["w1", "w2", "w3", "w1"]);
	}
}
