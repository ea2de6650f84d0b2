//! Cell and scene identities, and the capability that mints anonymous ones.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{CellsError, Result};

/// Non-empty, unique-per-environment identity of a cell.
///
/// Cheap to clone and hash: backed by an `Arc<str>` rather than a `String`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(Arc<str>);

impl CellId {
	/// Validates and wraps an explicit, caller-chosen identity; fails on
	/// empty input.
	///
	/// # Errors
	///
	/// Returns [`CellsError::InvalidCellId`] if `id` is empty.
	pub fn new(id: impl Into<Arc<str>>) -> Result<Self> {
		let id = id.into();
		if id.is_empty() {
			return Err(CellsError::InvalidCellId);
		}
		Ok(Self(id))
	}

	/// Returns the id as a string slice.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for CellId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl TryFrom<&str> for CellId {
	type Error = CellsError;

	fn try_from(value: &str) -> Result<Self> {
		Self::new(value)
	}
}

impl TryFrom<String> for CellId {
	type Error = CellsError;

	fn try_from(value: String) -> Result<Self> {
		Self::new(value)
	}
}

/// Correlation identity of a [`crate::scene::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(Uuid);

impl SceneId {
	/// Wraps an explicit UUID (mostly useful in tests).
	#[must_use]
	pub fn from_uuid(uuid: Uuid) -> Self {
		Self(uuid)
	}
}

impl std::fmt::Display for SceneId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Capability that mints identities when a caller doesn't name its own.
///
/// Injected at `Environment`/`Scene` construction time (spec §6), so a host
/// can substitute a deterministic generator in tests without the runtime
/// caring how ids are produced.
pub trait IdGenerator: Send + Sync {
	/// Produces a fresh, environment-unique cell identity.
	fn next_cell_id(&self) -> CellId;
	/// Produces a fresh scene identity.
	fn next_scene_id(&self) -> SceneId;
}

/// Default [`IdGenerator`] backed by random UUIDv4s.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
	fn next_cell_id(&self) -> CellId {
		CellId::new(Uuid::new_v4().to_string()).expect("a uuid string is never empty")
	}

	fn next_scene_id(&self) -> SceneId {
		SceneId(Uuid::new_v4())
	}
}
