//! Immutable, typed key/value payloads carried by events.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::{CellsError, Result};

/// A single tagged payload value.
///
/// `Any` is the escape hatch for behavior-specific data that doesn't fit one
/// of the named variants; it is opaque to the runtime and only meaningful to
/// cooperating behaviors that agree on the concrete type.
#[derive(Clone)]
pub enum Value {
	/// UTF-8 text.
	Str(String),
	/// A signed integer.
	Int(i64),
	/// A floating-point number.
	Float(f64),
	/// A boolean flag.
	Bool(bool),
	/// Binary data; cheap to clone (reference-counted buffer).
	Bytes(Bytes),
	/// A point in time.
	Time(SystemTime),
	/// A span of time.
	Duration(Duration),
	/// An opaque, behavior-defined value.
	Any(Arc<dyn std::any::Any + Send + Sync>),
}

impl std::fmt::Debug for Value {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Str(s) => write!(f, "Str({s:?})"),
			Self::Int(i) => write!(f, "Int({i})"),
			Self::Float(v) => write!(f, "Float({v})"),
			Self::Bool(b) => write!(f, "Bool({b})"),
			Self::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
			Self::Time(t) => write!(f, "Time({t:?})"),
			Self::Duration(d) => write!(f, "Duration({d:?})"),
			Self::Any(_) => write!(f, "Any(..)"),
		}
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Self::Str(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Self::Str(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Self::Int(v)
	}
}

impl From<f64> for Value {
	fn from(v: f64) -> Self {
		Self::Float(v)
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Self::Bool(v)
	}
}

impl From<Bytes> for Value {
	fn from(v: Bytes) -> Self {
		Self::Bytes(v)
	}
}

/// An immutable, ordered key/value bag carried by every [`crate::event::Event`].
///
/// `Payload` is wrapped in an `Arc` internally so cloning it (as happens on
/// every fan-out to a subscriber) is a reference bump, never a deep copy.
/// [`Payload::apply`] is the only way to derive a changed payload; it always
/// returns a new value and never mutates `self`.
#[derive(Clone, Debug, Default)]
pub struct Payload(Arc<IndexMap<String, Value>>);

impl Payload {
	/// Builds a payload from an ordered sequence of key/value pairs.
	pub fn new(entries: impl IntoIterator<Item = (String, Value)>) -> Self {
		Self(Arc::new(entries.into_iter().collect()))
	}

	/// An empty payload.
	#[must_use]
	pub fn empty() -> Self {
		Self(Arc::new(IndexMap::new()))
	}

	/// Raw lookup of a key, without type conversion.
	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Lossless conversion to a string, only for `Value::Str`.
	#[must_use]
	pub fn get_string(&self, key: &str) -> Option<&str> {
		match self.0.get(key)? {
			Value::Str(s) => Some(s.as_str()),
			_ => None,
		}
	}

	/// Lossless conversion to an integer, only for `Value::Int`.
	#[must_use]
	pub fn get_int(&self, key: &str) -> Option<i64> {
		match self.0.get(key)? {
			Value::Int(i) => Some(*i),
			_ => None,
		}
	}

	/// Lossless conversion to a float; widens `Value::Int` as well.
	#[must_use]
	pub fn get_float(&self, key: &str) -> Option<f64> {
		match self.0.get(key)? {
			Value::Float(v) => Some(*v),
			Value::Int(i) => Some(*i as f64),
			_ => None,
		}
	}

	/// Lossless conversion to a bool, only for `Value::Bool`.
	#[must_use]
	pub fn get_bool(&self, key: &str) -> Option<bool> {
		match self.0.get(key)? {
			Value::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Lossless conversion to bytes, only for `Value::Bytes`.
	#[must_use]
	pub fn get_bytes(&self, key: &str) -> Option<&Bytes> {
		match self.0.get(key)? {
			Value::Bytes(b) => Some(b),
			_ => None,
		}
	}

	/// Returns a new payload shadowing the listed keys; `self` is untouched.
	#[must_use]
	pub fn apply(&self, overrides: impl IntoIterator<Item = (String, Value)>) -> Self {
		let mut next = (*self.0).clone();
		for (k, v) in overrides {
			next.insert(k, v);
		}
		Self(Arc::new(next))
	}

	/// Number of entries in the payload.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the payload has no entries.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates entries in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v))
	}
}

/// A non-empty event topic.
///
/// Backed by an `Arc<str>` so emitting to many subscribers doesn't
/// re-allocate the topic string per subscriber.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Topic(Arc<str>);

impl Topic {
	/// Validates and wraps a topic string; fails on empty input (spec §4.3).
	pub fn new(topic: impl AsRef<str>) -> Result<Self> {
		let topic = topic.as_ref();
		if topic.is_empty() {
			return Err(CellsError::InvalidTopic);
		}
		Ok(Self(Arc::from(topic)))
	}

	/// Returns the topic as a string slice.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for Topic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl TryFrom<&str> for Topic {
	type Error = CellsError;

	fn try_from(value: &str) -> Result<Self> {
		Self::new(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn apply_does_not_mutate_original() {
		let p = Payload::new([("d".to_string(), Value::from("a"))]);
		let p2 = p.apply([("d".to_string(), Value::from("b"))]);
		assert_eq!(p.get_string("d"), Some("a"));
		assert_eq!(p2.get_string("d"), Some("b"));
	}

	#[test]
	fn float_getter_widens_int() {
		let p = Payload::new([("n".to_string(), Value::Int(4))]);
		assert_eq!(p.get_float("n"), Some(4.0));
	}

	#[test]
	fn empty_topic_is_rejected() {
		assert!(matches!(Topic::new(""), Err(CellsError::InvalidTopic)));
	}
}
