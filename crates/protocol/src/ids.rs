//! Session identifiers.
//!
//! A page context hands out [`LocalId`]s to the text fields it watches. The
//! coordinator combines one with the [`ContextId`] of the page it came from into a
//! [`GlobalId`], which is what the helper sees. The string form is
//! `"{context}_{local}"`, e.g. `"7_0"`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Identifier of one in-page context (a tab, or a frame with its own agent).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(String);

impl ContextId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ContextId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ContextId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for ContextId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

/// Per-context identifier of a watched text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(u32);

impl LocalId {
	pub const fn new(id: u32) -> Self {
		Self(id)
	}

	pub const fn get(self) -> u32 {
		self.0
	}
}

impl fmt::Display for LocalId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Error returned when a string is not a valid [`GlobalId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session id '{0}': expected <context>_<local>")]
pub struct ParseIdError(String);

/// Session identifier unique across all contexts while the session is live.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalId {
	context: ContextId,
	local: LocalId,
}

impl GlobalId {
	pub fn new(context: ContextId, local: LocalId) -> Self {
		Self { context, local }
	}

	pub fn context(&self) -> &ContextId {
		&self.context
	}

	pub fn local(&self) -> LocalId {
		self.local
	}
}

impl fmt::Display for GlobalId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}_{}", self.context, self.local)
	}
}

impl FromStr for GlobalId {
	type Err = ParseIdError;

	/// Splits on the last underscore so context ids may contain underscores.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (context, local) = s.rsplit_once('_').ok_or_else(|| ParseIdError(s.to_string()))?;
		if context.is_empty() {
			return Err(ParseIdError(s.to_string()));
		}
		let local = local.parse::<u32>().map_err(|_| ParseIdError(s.to_string()))?;
		Ok(Self::new(ContextId::new(context), LocalId::new(local)))
	}
}

impl Serialize for GlobalId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for GlobalId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = String::deserialize(deserializer)?;
		raw.parse().map_err(serde::de::Error::custom)
	}
}
