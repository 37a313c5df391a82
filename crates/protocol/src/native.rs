//! Messages on the channel between the coordinator and the helper process.
//!
//! Every frame is a JSON object `{"type": ..., "payload": {...}}`. The coordinator
//! sends [`NativeRequest`]s; the helper answers with [`NativeEvent`]s. Frames of a
//! kind this crate does not know are surfaced as [`Inbound::Unrecognized`] so the
//! receiver can log and skip them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::GlobalId;

/// Preferences forwarded to the helper with each new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativePrefs {
	/// Editor command as a JSON array string, `%s` marking the file argument.
	pub editor: String,
	/// File extension for the temporary file, without the dot.
	pub extension: String,
	/// Backup directory; empty disables backups.
	pub backupdir: String,
	pub kill_editors_allow: bool,
	/// Seconds the helper waits before killing an editor it gave up on.
	pub kill_editors_timeout: u32,
}

/// Payload of [`NativeRequest::NewText`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewText {
	pub id: GlobalId,
	pub text: String,
	pub caret: usize,
	pub url: String,
	pub prefs: NativePrefs,
}

/// Message sent from the coordinator to the helper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NativeRequest {
	/// Open an editor on a fresh session.
	NewText(NewText),
}

/// Payload of [`NativeEvent::TextUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUpdate {
	pub id: GlobalId,
	pub text: String,
}

/// Payload of [`NativeEvent::DeathNotice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathNotice {
	pub id: GlobalId,
}

/// Payload of [`NativeEvent::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelperError {
	pub error: String,
}

/// Message sent from the helper to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NativeEvent {
	/// The editor saved new content for a session.
	TextUpdate(TextUpdate),
	/// The editor of a session exited.
	DeathNotice(DeathNotice),
	/// The helper failed at something the user should hear about.
	Error(HelperError),
}

impl NativeEvent {
	const KINDS: [&'static str; 3] = ["text_update", "death_notice", "error"];
}

/// Classification of one raw frame received from the helper.
#[derive(Debug)]
pub enum Inbound {
	Known(NativeEvent),
	/// Frame with a `type` this protocol does not define (or none at all).
	Unrecognized(String),
	/// Frame of a known kind whose payload did not match its schema.
	Malformed(serde_json::Error),
}

impl Inbound {
	pub fn from_value(value: Value) -> Self {
		let kind = value.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
		if !NativeEvent::KINDS.contains(&kind.as_str()) {
			return Self::Unrecognized(kind);
		}
		match serde_json::from_value(value) {
			Ok(event) => Self::Known(event),
			Err(err) => Self::Malformed(err),
		}
	}
}
