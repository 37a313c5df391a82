//! Finds the node that actually holds focus.
//!
//! A document reports a shadow host as its active element when focus sits inside
//! the host's shadow tree, so the walk descends through each host's own focus
//! scope. A focused frame ends the walk: its content is another context's
//! business.

use tracing::trace;

use crate::dom::{Document, NodeId};

/// Resolves the document's active element.
pub fn resolve_active(doc: &Document) -> Option<NodeId> {
	resolve(doc, doc.active_element()?)
}

/// Resolves the innermost focused node starting from `start`.
///
/// Each step moves into a strictly deeper shadow scope, so the walk ends after at
/// most as many steps as there are nested shadow roots.
pub fn resolve(doc: &Document, start: NodeId) -> Option<NodeId> {
	let mut node = start;
	let mut depth = doc.scope_depth(doc.scope_of(node));
	loop {
		if doc.is_frame(node) {
			trace!(?node, "focus is inside a frame");
			return None;
		}
		let Some(inner) = doc.shadow_root(node).and_then(|scope| doc.scope_active(scope)) else {
			return Some(node);
		};
		let inner_depth = doc.scope_depth(doc.scope_of(inner));
		if inner_depth <= depth {
			return None;
		}
		node = inner;
		depth = inner_depth;
	}
}
