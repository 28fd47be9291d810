//! Structural change records.

use super::document::NodeId;

/// A batch of structural changes queued by a single tree mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
	/// Nodes inserted, the inserted subtree root first.
	pub added: Vec<NodeId>,
	/// Nodes removed, the removed subtree root first.
	pub removed: Vec<NodeId>,
}

impl MutationRecord {
	/// A record for an inserted subtree.
	pub fn added(nodes: Vec<NodeId>) -> Self {
		Self {
			added: nodes,
			removed: Vec::new(),
		}
	}

	/// A record for a removed subtree.
	pub fn removed(nodes: Vec<NodeId>) -> Self {
		Self {
			added: Vec::new(),
			removed: nodes,
		}
	}

	/// Whether any node left the document.
	pub fn has_removals(&self) -> bool {
		!self.removed.is_empty()
	}
}
