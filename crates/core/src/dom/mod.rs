//! In-memory model of the page a context runs in.
//!
//! Only what the adapters and the resolver look at is modelled: elements with
//! attributes, text nodes, form values with a caret, dispatched input events and
//! shadow roots with their own focus. Nodes live in an arena and are addressed by
//! [`NodeId`]; detached nodes stay in the arena but lose their parent.
//!
//! Frames (`<iframe>`, `<frame>`) are leaf elements here. Their documents belong to
//! separate page contexts.

mod html;
mod text;

use indexmap::IndexMap;
use url::Url;

use crate::error::Result;

pub use html::escape_markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A focus scope: the document itself or one shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

/// Events a node has had dispatched on it, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
	Input,
	Change,
}

#[derive(Debug, Clone)]
struct Element {
	tag: String,
	attrs: IndexMap<String, String>,
	value: String,
	selection_start: usize,
	shadow_root: Option<ScopeId>,
	events: Vec<DomEvent>,
}

impl Element {
	fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			attrs: IndexMap::new(),
			value: String::new(),
			selection_start: 0,
			shadow_root: None,
			events: Vec::new(),
		}
	}
}

#[derive(Debug, Clone)]
enum NodeData {
	Element(Element),
	Text(String),
}

#[derive(Debug, Clone)]
struct Node {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	scope: ScopeId,
	data: NodeData,
}

#[derive(Debug, Clone)]
struct Scope {
	root: NodeId,
	host: Option<NodeId>,
	depth: usize,
	active: Option<NodeId>,
}

const DOCUMENT_SCOPE: ScopeId = ScopeId(0);
const SHADOW_ROOT_TAG: &str = "#shadow-root";

#[derive(Debug, Clone)]
pub struct Document {
	url: Url,
	nodes: Vec<Node>,
	scopes: Vec<Scope>,
}

impl Document {
	/// Creates an empty document with a `<body>` root.
	pub fn new(url: &str) -> Result<Self> {
		let url = Url::parse(url)?;
		let mut doc = Self {
			url,
			nodes: Vec::new(),
			scopes: Vec::new(),
		};
		let body = doc.push_node(None, DOCUMENT_SCOPE, NodeData::Element(Element::new("body")));
		doc.scopes.push(Scope {
			root: body,
			host: None,
			depth: 0,
			active: None,
		});
		Ok(doc)
	}

	pub fn url(&self) -> &Url {
		&self.url
	}

	pub fn host(&self) -> Option<&str> {
		self.url.host_str()
	}

	/// Host and path, leaving out query parameters and fragment.
	pub fn simple_url(&self) -> String {
		format!("{}{}", self.url.host_str().unwrap_or_default(), self.url.path())
	}

	pub fn body(&self) -> NodeId {
		self.scopes[DOCUMENT_SCOPE.0].root
	}

	fn push_node(&mut self, parent: Option<NodeId>, scope: ScopeId, data: NodeData) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node {
			parent,
			children: Vec::new(),
			scope,
			data,
		});
		if let Some(parent) = parent {
			self.nodes[parent.0].children.push(id);
		}
		id
	}

	pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
		let scope = self.nodes[parent.0].scope;
		self.push_node(Some(parent), scope, NodeData::Element(Element::new(tag)))
	}

	pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
		let scope = self.nodes[parent.0].scope;
		self.push_node(Some(parent), scope, NodeData::Text(text.to_string()))
	}

	/// Detaches every child of `node`.
	pub fn remove_children(&mut self, node: NodeId) {
		let children = std::mem::take(&mut self.nodes[node.0].children);
		for child in children {
			self.nodes[child.0].parent = None;
		}
	}

	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.nodes[node.0].children
	}

	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.nodes[node.0].parent
	}

	fn element(&self, node: NodeId) -> Option<&Element> {
		match &self.nodes[node.0].data {
			NodeData::Element(element) => Some(element),
			NodeData::Text(_) => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
		match &mut self.nodes[node.0].data {
			NodeData::Element(element) => Some(element),
			NodeData::Text(_) => None,
		}
	}

	/// Lowercase tag name, `None` for text nodes.
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(|e| e.tag.as_str())
	}

	pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
		if let Some(element) = self.element_mut(node) {
			element.attrs.insert(name.to_ascii_lowercase(), value.to_string());
		}
	}

	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?
			.attrs
			.get(&name.to_ascii_lowercase())
			.map(String::as_str)
	}

	pub fn has_class(&self, node: NodeId, class: &str) -> bool {
		self.attribute(node, "class")
			.is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
	}

	/// Form value of an input or textarea; empty for anything else.
	pub fn value(&self, node: NodeId) -> &str {
		self.element(node).map(|e| e.value.as_str()).unwrap_or_default()
	}

	/// Sets the form value and moves the caret to its end, as browsers do.
	pub fn set_value(&mut self, node: NodeId, value: &str) {
		if let Some(element) = self.element_mut(node) {
			element.value = value.to_string();
			element.selection_start = value.chars().count();
		}
	}

	/// Caret offset in characters.
	pub fn selection_start(&self, node: NodeId) -> usize {
		self.element(node).map(|e| e.selection_start).unwrap_or_default()
	}

	pub fn set_selection_start(&mut self, node: NodeId, offset: usize) {
		if let Some(element) = self.element_mut(node) {
			element.selection_start = offset;
		}
	}

	pub fn dispatch_event(&mut self, node: NodeId, event: DomEvent) {
		if let Some(element) = self.element_mut(node) {
			element.events.push(event);
		}
	}

	pub fn events(&self, node: NodeId) -> &[DomEvent] {
		self.element(node).map(|e| e.events.as_slice()).unwrap_or_default()
	}

	/// Attaches a shadow root to `host` and returns the root node to build under.
	///
	/// A host that already has a shadow root gets the existing one back.
	pub fn attach_shadow(&mut self, host: NodeId) -> NodeId {
		if let Some(scope) = self.element(host).and_then(|e| e.shadow_root) {
			return self.scopes[scope.0].root;
		}
		let scope = ScopeId(self.scopes.len());
		let depth = self.scope_depth(self.scope_of(host)) + 1;
		let root = self.push_node(None, scope, NodeData::Element(Element::new(SHADOW_ROOT_TAG)));
		self.scopes.push(Scope {
			root,
			host: Some(host),
			depth,
			active: None,
		});
		if let Some(element) = self.element_mut(host) {
			element.shadow_root = Some(scope);
		}
		root
	}

	pub fn shadow_root(&self, host: NodeId) -> Option<ScopeId> {
		self.element(host)?.shadow_root
	}

	pub fn scope_of(&self, node: NodeId) -> ScopeId {
		self.nodes[node.0].scope
	}

	/// Nesting depth of a scope; the document is 0.
	pub fn scope_depth(&self, scope: ScopeId) -> usize {
		self.scopes[scope.0].depth
	}

	/// Focused node inside `scope`.
	pub fn scope_active(&self, scope: ScopeId) -> Option<NodeId> {
		self.scopes[scope.0].active
	}

	/// The document's focused node. Focus inside a shadow tree shows up as its host.
	pub fn active_element(&self) -> Option<NodeId> {
		self.scope_active(DOCUMENT_SCOPE)
	}

	/// Focuses `node`, making every enclosing shadow host the active element of its
	/// own scope.
	pub fn focus(&mut self, node: NodeId) {
		let mut current = node;
		loop {
			let scope = self.nodes[current.0].scope;
			self.scopes[scope.0].active = Some(current);
			match self.scopes[scope.0].host {
				Some(host) => current = host,
				None => break,
			}
		}
	}

	pub fn is_frame(&self, node: NodeId) -> bool {
		matches!(self.tag(node), Some("iframe" | "frame"))
	}

	/// Number of frame elements reachable from the body, shadow trees included.
	pub fn frame_count(&self) -> usize {
		let mut count = 0;
		let mut stack = vec![self.body()];
		while let Some(node) = stack.pop() {
			if self.is_frame(node) {
				count += 1;
			}
			stack.extend_from_slice(self.children(node));
			if let Some(scope) = self.shadow_root(node) {
				stack.push(self.scopes[scope.0].root);
			}
		}
		count
	}

	/// Concatenated text of every descendant text node (`textContent`).
	pub fn text_content(&self, node: NodeId) -> String {
		let mut out = String::new();
		self.collect_text(node, &mut out);
		out
	}

	fn collect_text(&self, node: NodeId, out: &mut String) {
		match &self.nodes[node.0].data {
			NodeData::Text(text) => out.push_str(text),
			NodeData::Element(_) => {
				for &child in self.children(node) {
					self.collect_text(child, out);
				}
			}
		}
	}
}
