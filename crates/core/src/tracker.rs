//! Per-context bookkeeping of fields handed to the editor.

use std::collections::HashMap;

use indexmap::IndexMap;
use textern_protocol::LocalId;

use crate::adapter::EditableHandle;
use crate::dom::NodeId;

/// Maps local ids to the fields they were assigned to.
///
/// Ids are allocated in increasing order and never reused; entries live as long as
/// the context. Watching the same node twice returns its existing id.
#[derive(Debug, Default)]
pub struct SessionTracker {
	watched: IndexMap<LocalId, EditableHandle>,
	by_node: HashMap<NodeId, LocalId>,
}

impl SessionTracker {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn watch(&mut self, handle: EditableHandle) -> LocalId {
		if let Some(&id) = self.by_node.get(&handle.node()) {
			return id;
		}
		let id = LocalId::new(self.watched.len() as u32);
		self.watched.insert(id, handle);
		self.by_node.insert(handle.node(), id);
		id
	}

	pub fn get(&self, id: LocalId) -> Option<EditableHandle> {
		self.watched.get(&id).copied()
	}

	pub fn local_id(&self, node: NodeId) -> Option<LocalId> {
		self.by_node.get(&node).copied()
	}

	pub fn len(&self) -> usize {
		self.watched.len()
	}

	pub fn is_empty(&self) -> bool {
		self.watched.is_empty()
	}

	/// Watched fields in allocation order.
	pub fn iter(&self) -> impl Iterator<Item = (LocalId, EditableHandle)> + '_ {
		self.watched.iter().map(|(&id, &handle)| (id, handle))
	}
}
