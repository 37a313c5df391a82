//! Rendered text (`innerText`) of a subtree.
//!
//! Block elements force a line break before and after themselves. Adjacent forced
//! breaks collapse into one and forced breaks at either end are dropped, while a
//! `<br>` always renders as a literal newline.

use super::{Document, NodeData, NodeId};

const BLOCK_TAGS: &[&str] = &[
	"address", "article", "aside", "blockquote", "div", "dl", "dd", "dt", "fieldset", "figure",
	"footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
	"ol", "p", "pre", "section", "table", "tr", "ul",
];

enum Piece<'a> {
	Text(&'a str),
	RequiredBreak,
}

impl Document {
	pub fn inner_text(&self, node: NodeId) -> String {
		let mut pieces = Vec::new();
		for &child in self.children(node) {
			self.collect_rendered(child, &mut pieces);
		}
		render(&pieces)
	}

	/// Replaces the children of `node` with `text`, one `<br>` per newline.
	pub fn set_inner_text(&mut self, node: NodeId, text: &str) {
		self.remove_children(node);
		for (i, line) in text.split('\n').enumerate() {
			if i > 0 {
				self.append_element(node, "br");
			}
			if !line.is_empty() {
				self.append_text(node, line);
			}
		}
	}

	fn collect_rendered<'a>(&'a self, node: NodeId, out: &mut Vec<Piece<'a>>) {
		match &self.nodes[node.0].data {
			NodeData::Text(text) => out.push(Piece::Text(text)),
			NodeData::Element(element) if element.tag == "br" => out.push(Piece::Text("\n")),
			NodeData::Element(element) => {
				let block = BLOCK_TAGS.contains(&element.tag.as_str());
				if block {
					out.push(Piece::RequiredBreak);
				}
				for &child in &self.nodes[node.0].children {
					self.collect_rendered(child, out);
				}
				if block {
					out.push(Piece::RequiredBreak);
				}
			}
		}
	}
}

fn render(pieces: &[Piece<'_>]) -> String {
	let mut out = String::new();
	let mut pending_break = false;
	for piece in pieces {
		match piece {
			Piece::RequiredBreak => pending_break = true,
			Piece::Text(text) if text.is_empty() => {}
			Piece::Text(text) => {
				if pending_break && !out.is_empty() {
					out.push('\n');
				}
				pending_break = false;
				out.push_str(text);
			}
		}
	}
	out
}
