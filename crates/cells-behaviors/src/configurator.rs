//! Loads and validates a host-supplied configuration file on request,
//! emitting the result under a well-known topic.

use std::sync::Arc;

use async_trait::async_trait;
use cells_core::cell::{Behavior, Context};
use cells_core::error::{CellsError, Result};
use cells_core::event::Event;
use cells_core::payload::{Payload, Value};

use crate::reserved;

/// Opaque, host-defined configuration value. The runtime never inspects it;
/// only the `load`/`validate` closures a host supplies agree on its shape.
pub type Config = Arc<dyn std::any::Any + Send + Sync>;

/// Reads a named configuration file (spec §6's `loadConfig` capability).
pub type LoadConfigFn = Arc<dyn Fn(&str) -> Result<Config> + Send + Sync>;

/// Optionally rejects a loaded configuration before it is published.
pub type Validator = Arc<dyn Fn(&Config) -> Result<()> + Send + Sync>;

/// Configuration-loading behavior (spec §4.6).
///
/// On [`reserved::READ_CONFIGURATION`], reads `payload[CONFIGURATION_FILENAME]`
/// via `load`, runs it through `validate` if set, and emits it back under
/// [`reserved::CONFIGURATION`].
pub struct Configurator {
	load: LoadConfigFn,
	validate: Option<Validator>,
}

impl Configurator {
	#[must_use]
	pub fn new(load: LoadConfigFn, validate: Option<Validator>) -> Self {
		Self { load, validate }
	}
}

#[async_trait]
impl Behavior for Configurator {
	async fn process_event(&mut self, ctx: &Context, event: Event) -> Result<()> {
		if event.topic().as_str() != reserved::READ_CONFIGURATION {
			return Ok(());
		}
		let filename = event
			.payload()
			.get_string(reserved::CONFIGURATION_FILENAME)
			.ok_or_else(|| CellsError::InvalidPayload(format!("{} missing", reserved::CONFIGURATION_FILENAME)))?;

		let config = (self.load)(filename)?;
		if let Some(validate) = &self.validate {
			validate(&config)?;
		}

		ctx.emit_new(
			reserved::CONFIGURATION,
			Payload::new([(reserved::CONFIGURATION.to_string(), Value::Any(config))]),
			event.scene().cloned(),
		)
		.await
	}
}

#[cfg(test)]
mod tests {
	use cells_core::config::EnvironmentConfig;
	use cells_core::environment::Environment;
	use cells_core::id::CellId;

	use super::*;

	struct LoadedConfig {
		greeting: String,
	}

	struct Sink(tokio::sync::mpsc::UnboundedSender<Event>);

	#[async_trait]
	impl Behavior for Sink {
		async fn process_event(&mut self, _ctx: &Context, event: Event) -> Result<()> {
			let _ = self.0.send(event);
			Ok(())
		}
	}

	#[tokio::test]
	async fn emits_configuration_after_loading_and_validating() {
		let env = Environment::start(EnvironmentConfig::default());
		let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
		env.start_cell(CellId::new("sink").unwrap(), Box::new(Sink(tx))).await.unwrap();

		let load: LoadConfigFn = Arc::new(|filename| {
			Ok(Arc::new(LoadedConfig {
				greeting: format!("loaded {filename}"),
			}) as Config)
		});
		let validate: Validator = Arc::new(|config| {
			if config.downcast_ref::<LoadedConfig>().is_some() {
				Ok(())
			} else {
				Err(CellsError::InvalidPayload("wrong config type".into()))
			}
		});
		env.start_cell(CellId::new("configurator").unwrap(), Box::new(Configurator::new(load, Some(validate))))
			.await
			.unwrap();
		env.subscribe(&CellId::new("configurator").unwrap(), vec![CellId::new("sink").unwrap()]).await.unwrap();

		env.emit_new(
			CellId::new("configurator").unwrap(),
			reserved::READ_CONFIGURATION,
			Payload::new([(reserved::CONFIGURATION_FILENAME.to_string(), Value::from("app.conf"))]),
			None,
		)
		.await
		.unwrap();

		let got = rx.recv().await.unwrap();
		assert_eq!(got.topic().as_str(), reserved::CONFIGURATION);
		let Value::Any(boxed) = got.payload().get(reserved::CONFIGURATION).unwrap().clone() else {
			panic!("expected Any")
		};
		assert_eq!(boxed.downcast_ref::<LoadedConfig>().unwrap().greeting, "loaded app.conf");
	}
}
