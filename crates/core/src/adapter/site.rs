//! Composers that need their own markup.

use crate::dom::{Document, NodeId, escape_markup};

const CHAT_DOMAIN: &str = "slack.com";
const CHAT_EDITOR_CLASS: &str = "ql-editor";
const MAIL_HOST: &str = "mail.google.com";

pub(super) fn is_chat_editor(doc: &Document, node: NodeId) -> bool {
	host_matches(doc.host(), CHAT_DOMAIN) && doc.has_class(node, CHAT_EDITOR_CLASS)
}

pub(super) fn is_mail_composer(doc: &Document, node: NodeId) -> bool {
	doc.host() == Some(MAIL_HOST) && doc.attribute(node, "g_editable") == Some("true")
}

fn host_matches(host: Option<&str>, domain: &str) -> bool {
	host.is_some_and(|host| {
		host == domain
			|| host
				.strip_suffix(domain)
				.is_some_and(|prefix| prefix.ends_with('.'))
	})
}

/// One line per child block.
pub(super) fn chat_text(doc: &Document, node: NodeId) -> String {
	doc.children(node)
		.iter()
		.map(|&block| doc.text_content(block))
		.collect::<Vec<_>>()
		.join("\n")
}

pub(super) fn set_chat_text(doc: &mut Document, node: NodeId, text: &str) {
	doc.remove_children(node);
	for line in text.split('\n') {
		let block = doc.append_element(node, "p");
		if line.is_empty() {
			doc.append_element(block, "br");
		} else {
			doc.append_text(block, line);
		}
	}
}

/// Markup the mail composer expects for `text`.
///
/// Every line becomes a `<div>`, with empty lines held open by a `<br>`. Spaces
/// are written as `&nbsp;` so runs of them survive rendering.
pub fn encode_mail_markup(text: &str) -> String {
	if text.is_empty() {
		return String::new();
	}
	let mut out = String::new();
	for line in text.split('\n') {
		if line.is_empty() {
			out.push_str("<div><br></div>");
		} else {
			out.push_str("<div>");
			out.push_str(&escape_markup(line).replace(' ', "&nbsp;"));
			out.push_str("</div>");
		}
	}
	out
}

/// Plain text from the composer's rendered text.
///
/// An empty line renders as two newlines, so each pair folds back into one.
/// Texts made only of newlines come back one line longer.
pub fn decode_mail_text(rendered: &str) -> String {
	rendered.replace('\u{a0}', " ").replace("\n\n", "\n")
}
