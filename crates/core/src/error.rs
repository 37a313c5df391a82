//! Error types for the page side and the coordinator.

use textern_protocol::{ContextId, LocalId};
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
	/// Focus is not on anything the adapters can edit.
	#[error("no text field selected")]
	NoEditableTarget,

	/// A `set_text` named a field this context never watched.
	#[error("no watched field with id {0}")]
	UnknownLocalId(LocalId),

	#[error("invalid shortcut '{chord}': {reason}")]
	InvalidShortcut { chord: String, reason: String },

	#[error("invalid markup: {0}")]
	Markup(String),

	#[error("invalid page url: {0}")]
	Url(#[from] url::ParseError),

	#[error("preferences unavailable: {0}")]
	Preferences(String),

	/// Delivery to a page context failed, e.g. because it navigated away.
	#[error("failed to reach context {context}: {reason}")]
	ContextSend { context: ContextId, reason: String },

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
