//! Messages between a page context and the coordinator.
//!
//! The flow for one edit is:
//!
//! 1. The page sends [`ContentRequest::RegisterText`] with the field's text and caret
//! 2. The coordinator forwards it to the helper under a session id
//! 3. Each save in the external editor comes back as [`ContentMessage::SetText`]
//!
//! When the coordinator owns the keyboard binding it sends [`ContentMessage::Shortcut`]
//! instead, and the page answers with a registration for its focused field.
//!
//! Every message is wrapped in an [`Envelope`]. Receivers drop envelopes whose
//! `sender` is not their own extension identity.

use serde::{Deserialize, Serialize};

use crate::ids::{ContextId, LocalId};

/// Message sent from a page context to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ContentRequest {
	/// Check out a text field for external editing.
	RegisterText {
		/// Id the page's tracker assigned to the field.
		local_id: LocalId,
		/// Current plain-text content of the field.
		text: String,
		/// Caret offset in characters (0 for rich editors).
		caret: usize,
		/// Host and path of the page, without query or fragment.
		url: String,
		/// Adapter the page picked for the field.
		#[serde(default, skip_serializing_if = "Option::is_none")]
		kind: Option<EditableKind>,
	},
}

/// Shape of an editable field, which decides how text is read and written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableKind {
	/// `<textarea>` or a text-like `<input>`.
	PlainField,
	/// Any other `contenteditable` element.
	RichText,
	/// Chat composer keeping one `<p>` block per line.
	ChatEditor,
	/// Mail composer rendering spaces as `&nbsp;` and lines as `<div>` blocks.
	MailComposer,
}

/// Message sent from the coordinator to a page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ContentMessage {
	/// Replace the content of a watched field.
	SetText {
		/// Id previously sent in [`ContentRequest::RegisterText`].
		local_id: LocalId,
		/// New plain-text content.
		text: String,
	},
	/// The shortcut fired in a shared context; start editing the focused field.
	Shortcut,
}

/// Addressed message crossing the page/coordinator boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
	/// Identity of the sending extension.
	pub sender: String,
	/// Page context the message comes from or goes to.
	pub context: ContextId,
	pub message: M,
}

impl<M> Envelope<M> {
	pub fn new(sender: impl Into<String>, context: ContextId, message: M) -> Self {
		Self {
			sender: sender.into(),
			context,
			message,
		}
	}

	/// Returns true if the envelope was sent by `identity`.
	pub fn is_from(&self, identity: &str) -> bool {
		self.sender == identity
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn register_text_uses_camel_case_fields() {
		let request = ContentRequest::RegisterText {
			local_id: LocalId::new(0),
			text: "hello".into(),
			caret: 5,
			url: "example.com/page".into(),
			kind: None,
		};
		assert_eq!(
			serde_json::to_value(&request).unwrap(),
			json!({"type": "register_text", "localId": 0, "text": "hello", "caret": 5, "url": "example.com/page"})
		);
	}

	#[test]
	fn register_text_carries_optional_kind() {
		let raw = json!({"type": "register_text", "localId": 1, "text": "", "caret": 0, "url": "x/", "kind": "mail_composer"});
		let parsed: ContentRequest = serde_json::from_value(raw).unwrap();
		let ContentRequest::RegisterText { kind, .. } = parsed;
		assert_eq!(kind, Some(EditableKind::MailComposer));
	}

	#[test]
	fn shortcut_is_a_bare_type_tag() {
		assert_eq!(serde_json::to_value(ContentMessage::Shortcut).unwrap(), json!({"type": "shortcut"}));
		let parsed: ContentMessage = serde_json::from_value(json!({"type": "shortcut"})).unwrap();
		assert_eq!(parsed, ContentMessage::Shortcut);
	}

	#[test]
	fn envelope_parses_from_host_json() {
		let raw = r#"{"sender":"textern@jlebon.com","context":"7","message":{"type":"set_text","localId":2,"text":"hi"}}"#;
		let envelope: Envelope<ContentMessage> = serde_json::from_str(raw).unwrap();
		assert!(envelope.is_from("textern@jlebon.com"));
		assert!(!envelope.is_from("someone@else"));
		assert_eq!(envelope.context.as_str(), "7");
		assert_eq!(
			envelope.message,
			ContentMessage::SetText {
				local_id: LocalId::new(2),
				text: "hi".into()
			}
		);
	}
}
