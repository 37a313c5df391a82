//! Text adapters: plain text in and out of an editable node.
//!
//! [`classify`] picks the adapter for a node once, when editing begins; the
//! resulting [`EditableHandle`] is what the tracker stores and what later updates
//! are applied through. Site-specific composers are checked before the generic
//! rich-text fallback.

mod site;

use crate::dom::{DomEvent, Document, NodeId};
use crate::error::Result;

pub use site::{decode_mail_text, encode_mail_markup};
pub use textern_protocol::EditableKind;

const TEXT_INPUT_TYPES: &[&str] = &["text", "search", "email", "url"];

/// An editable node together with the adapter chosen for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditableHandle {
	node: NodeId,
	kind: EditableKind,
}

impl EditableHandle {
	pub fn node(self) -> NodeId {
		self.node
	}

	pub fn kind(self) -> EditableKind {
		self.kind
	}
}

/// Returns the adapter for `node`, or `None` if it is not editable text.
pub fn classify(doc: &Document, node: NodeId) -> Option<EditableHandle> {
	let tag = doc.tag(node)?;
	let kind = if tag == "textarea" || (tag == "input" && is_text_input(doc, node)) {
		if doc.attribute(node, "disabled").is_some() || doc.attribute(node, "readonly").is_some() {
			return None;
		}
		EditableKind::PlainField
	} else if is_content_editable(doc, node) {
		if site::is_chat_editor(doc, node) {
			EditableKind::ChatEditor
		} else if site::is_mail_composer(doc, node) {
			EditableKind::MailComposer
		} else {
			EditableKind::RichText
		}
	} else {
		return None;
	};
	Some(EditableHandle { node, kind })
}

fn is_text_input(doc: &Document, node: NodeId) -> bool {
	match doc.attribute(node, "type") {
		None => true,
		Some(kind) => TEXT_INPUT_TYPES.iter().any(|t| t.eq_ignore_ascii_case(kind)),
	}
}

fn is_content_editable(doc: &Document, node: NodeId) -> bool {
	doc.attribute(node, "contenteditable").is_some_and(|value| {
		value.is_empty() || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("plaintext-only")
	})
}

pub fn get_text(doc: &Document, handle: EditableHandle) -> String {
	let node = handle.node;
	match handle.kind {
		EditableKind::PlainField => doc.value(node).to_string(),
		EditableKind::RichText => doc.inner_text(node),
		EditableKind::ChatEditor => site::chat_text(doc, node),
		EditableKind::MailComposer => decode_mail_text(&doc.inner_text(node)),
	}
}

/// Replaces the content of the node behind `handle` with `text`.
///
/// Plain fields get `input` then `change` dispatched so page scripts see the
/// update.
pub fn set_text(doc: &mut Document, handle: EditableHandle, text: &str) -> Result<()> {
	let node = handle.node;
	match handle.kind {
		EditableKind::PlainField => {
			doc.set_value(node, text);
			doc.dispatch_event(node, DomEvent::Input);
			doc.dispatch_event(node, DomEvent::Change);
		}
		EditableKind::RichText => doc.set_inner_text(node, text),
		EditableKind::ChatEditor => site::set_chat_text(doc, node, text),
		EditableKind::MailComposer => doc.set_inner_html(node, &encode_mail_markup(text))?,
	}
	Ok(())
}

/// Caret offset in characters. Only plain fields expose one.
pub fn caret(doc: &Document, handle: EditableHandle) -> usize {
	match handle.kind {
		EditableKind::PlainField => {
			let len = doc.value(handle.node).chars().count();
			doc.selection_start(handle.node).min(len)
		}
		_ => 0,
	}
}
