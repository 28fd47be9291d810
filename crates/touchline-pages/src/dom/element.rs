//! Element handles.

use std::fmt;

use super::document::{Document, NodeId};
use super::mutation::MutationRecord;
use crate::error::DomError;

/// Handle to a node in a [`Document`].
///
/// Handles stay valid as values after their node is removed; every accessor
/// then behaves as if the node had no attributes, parent or children.
#[derive(Clone)]
pub struct Element {
	document: Document,
	id: NodeId,
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.document.ptr_eq(&other.document)
	}
}

impl Eq for Element {}

impl fmt::Debug for Element {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.document.inner().borrow();
		match inner.node(self.id) {
			Some(node) => {
				write!(f, "<{}", node.tag)?;
				if let Some(id) = node.attributes.get("id") {
					write!(f, "#{id}")?;
				}
				write!(f, " @{}:{}>", self.id.index(), self.id.generation())
			}
			None => write!(
				f,
				"<removed @{}:{}>",
				self.id.index(),
				self.id.generation()
			),
		}
	}
}

impl Element {
	pub(crate) fn new(document: Document, id: NodeId) -> Self {
		Self { document, id }
	}

	/// Arena id of the node.
	pub fn node_id(&self) -> NodeId {
		self.id
	}

	/// The document this element belongs to.
	pub fn owner_document(&self) -> &Document {
		&self.document
	}

	/// Whether the node has not been removed.
	pub fn is_live(&self) -> bool {
		self.document.inner().borrow().is_live(self.id)
	}

	/// Whether the node is attached under the document root.
	pub fn is_connected(&self) -> bool {
		let inner = self.document.inner().borrow();
		inner.is_live(self.id) && inner.is_connected(self.id)
	}

	/// Lowercase tag name, empty once removed.
	pub fn tag_name(&self) -> String {
		self.document
			.inner()
			.borrow()
			.node(self.id)
			.map(|node| node.tag.clone())
			.unwrap_or_default()
	}

	pub fn get_attribute(&self, name: &str) -> Option<String> {
		self.document
			.inner()
			.borrow()
			.node(self.id)
			.and_then(|node| node.attributes.get(name).cloned())
	}

	pub fn has_attribute(&self, name: &str) -> bool {
		self.document
			.inner()
			.borrow()
			.node(self.id)
			.is_some_and(|node| node.attributes.contains_key(name))
	}

	pub fn set_attribute(&self, name: &str, value: &str) {
		if let Some(node) = self.document.inner().borrow_mut().node_mut(self.id) {
			node.attributes.insert(name.to_string(), value.to_string());
		}
	}

	pub fn remove_attribute(&self, name: &str) {
		if let Some(node) = self.document.inner().borrow_mut().node_mut(self.id) {
			node.attributes.shift_remove(name);
		}
	}

	/// Builder form of [`Element::set_attribute`].
	pub fn attr(self, name: &str, value: &str) -> Self {
		self.set_attribute(name, value);
		self
	}

	/// The `id` attribute.
	pub fn id(&self) -> Option<String> {
		self.get_attribute("id")
	}

	/// Reads `data-{key}`.
	pub fn dataset(&self, key: &str) -> Option<String> {
		self.get_attribute(&format!("data-{key}"))
	}

	/// Class names in attribute order.
	pub fn class_list(&self) -> Vec<String> {
		self.get_attribute("class")
			.map(|classes| classes.split_whitespace().map(str::to_string).collect())
			.unwrap_or_default()
	}

	pub fn has_class(&self, class: &str) -> bool {
		self.class_list().iter().any(|c| c == class)
	}

	pub fn add_class(&self, class: &str) {
		let mut classes = self.class_list();
		if !classes.iter().any(|c| c == class) {
			classes.push(class.to_string());
			self.set_attribute("class", &classes.join(" "));
		}
	}

	pub fn remove_class(&self, class: &str) {
		let mut classes = self.class_list();
		let before = classes.len();
		classes.retain(|c| c != class);
		if classes.len() != before {
			self.set_attribute("class", &classes.join(" "));
		}
	}

	pub fn parent(&self) -> Option<Element> {
		let parent = self
			.document
			.inner()
			.borrow()
			.node(self.id)
			.and_then(|node| node.parent)?;
		Some(Element::new(self.document.clone(), parent))
	}

	pub fn children(&self) -> Vec<Element> {
		self.document
			.inner()
			.borrow()
			.node(self.id)
			.map(|node| {
				node.children
					.iter()
					.map(|child| Element::new(self.document.clone(), *child))
					.collect()
			})
			.unwrap_or_default()
	}

	/// Whether `other` is this element or one of its descendants.
	pub fn contains(&self, other: &Element) -> bool {
		if !self.document.ptr_eq(&other.document) {
			return false;
		}
		let inner = self.document.inner().borrow();
		let mut current = Some(other.id);
		while let Some(id) = current {
			if id == self.id {
				return inner.is_live(id);
			}
			current = inner.node(id).and_then(|node| node.parent);
		}
		false
	}

	/// Nearest inclusive ancestor carrying attribute `name`.
	pub fn closest_with_attribute(&self, name: &str) -> Option<Element> {
		let inner = self.document.inner().borrow();
		let mut current = Some(self.id);
		while let Some(id) = current {
			let node = inner.node(id)?;
			if node.attributes.contains_key(name) {
				return Some(Element::new(self.document.clone(), id));
			}
			current = node.parent;
		}
		None
	}

	/// Appends `child`, moving it out of its current parent first.
	///
	/// Inserting into the connected tree queues an addition record for the
	/// whole inserted subtree. Moving a connected subtree under a detached
	/// parent takes it out of the document and queues a removal record; the
	/// nodes stay alive.
	pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
		if !self.document.ptr_eq(&child.document) || child.contains(self) {
			return Err(DomError::HierarchyRequest);
		}

		let mut inner = self.document.inner().borrow_mut();
		if !inner.is_live(self.id) || !inner.is_live(child.id) {
			return Err(DomError::StaleNode);
		}
		if child.id == inner.root() {
			return Err(DomError::HierarchyRequest);
		}
		let was_connected = inner.is_connected(child.id);

		if let Some(old_parent) = inner.node(child.id).and_then(|node| node.parent)
			&& let Some(old_parent) = inner.node_mut(old_parent)
		{
			old_parent.children.retain(|c| *c != child.id);
		}
		if let Some(node) = inner.node_mut(child.id) {
			node.parent = Some(self.id);
		}
		if let Some(node) = inner.node_mut(self.id) {
			node.children.push(child.id);
		}

		if inner.is_connected(self.id) {
			let added = inner.descendants(child.id);
			inner.pending.push(MutationRecord::added(added));
		} else if was_connected {
			let removed = inner.descendants(child.id);
			inner.pending.push(MutationRecord::removed(removed));
		}
		Ok(())
	}

	/// Removes this node and its subtree from the document.
	///
	/// Removed nodes are destroyed: their ids stop resolving and the handles
	/// go stale. A removal record is queued when the node was connected.
	/// Returns the number of nodes destroyed; the document root cannot be
	/// removed.
	pub fn remove(&self) -> usize {
		let mut inner = self.document.inner().borrow_mut();
		if !inner.is_live(self.id) || self.id == inner.root() {
			return 0;
		}

		let was_connected = inner.is_connected(self.id);
		let removed = inner.remove_subtree(self.id);
		let count = removed.len();
		if was_connected {
			inner.pending.push(MutationRecord::removed(removed));
		}
		count
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::RefCell;
	use std::rc::Rc;

	#[rstest]
	fn test_attributes() {
		let doc = Document::new();
		let el = doc
			.create_element("BUTTON")
			.attr("id", "save-btn")
			.attr("data-user-id", "42");

		assert_eq!(el.tag_name(), "button");
		assert_eq!(el.id().as_deref(), Some("save-btn"));
		assert_eq!(el.dataset("user-id").as_deref(), Some("42"));
		assert!(el.has_attribute("data-user-id"));

		el.remove_attribute("data-user-id");
		assert!(!el.has_attribute("data-user-id"));
	}

	#[rstest]
	fn test_class_helpers() {
		let doc = Document::new();
		let el = doc.create_element("div").attr("class", "modal fade");

		el.add_class("show");
		el.add_class("show");
		assert_eq!(el.class_list(), vec!["modal", "fade", "show"]);

		el.remove_class("fade");
		assert!(!el.has_class("fade"));
		assert!(el.has_class("modal"));
	}

	#[rstest]
	fn test_closest_with_attribute_includes_self() {
		// Arrange
		let doc = Document::new();
		let button = doc.create_element("button").attr("data-action", "delete");
		let icon = doc.create_element("i");
		button.append_child(&icon).unwrap();
		doc.body().append_child(&button).unwrap();

		// Act & Assert
		assert_eq!(icon.closest_with_attribute("data-action"), Some(button.clone()));
		assert_eq!(
			button.closest_with_attribute("data-action"),
			Some(button.clone())
		);
		assert_eq!(doc.body().closest_with_attribute("data-action"), None);
	}

	#[rstest]
	fn test_append_rejects_cycles() {
		let doc = Document::new();
		let outer = doc.create_element("div");
		let inner = doc.create_element("div");
		outer.append_child(&inner).unwrap();

		assert_eq!(inner.append_child(&outer), Err(DomError::HierarchyRequest));
		assert_eq!(outer.append_child(&outer), Err(DomError::HierarchyRequest));
		assert_eq!(
			doc.body().append_child(&doc.root()),
			Err(DomError::HierarchyRequest)
		);
	}

	#[rstest]
	fn test_append_rejects_foreign_and_stale() {
		let doc = Document::new();
		let other = Document::new();
		let foreign = other.create_element("div");
		let stale = doc.create_element("div");
		stale.remove();

		assert_eq!(
			doc.body().append_child(&foreign),
			Err(DomError::HierarchyRequest)
		);
		assert_eq!(doc.body().append_child(&stale), Err(DomError::StaleNode));
	}

	#[rstest]
	fn test_append_moves_between_parents() {
		let doc = Document::new();
		let a = doc.create_element("div");
		let b = doc.create_element("div");
		let child = doc.create_element("span");
		doc.body().append_child(&a).unwrap();
		doc.body().append_child(&b).unwrap();
		a.append_child(&child).unwrap();

		b.append_child(&child).unwrap();

		assert!(a.children().is_empty());
		assert_eq!(b.children(), vec![child.clone()]);
		assert_eq!(child.parent(), Some(b));
	}

	#[rstest]
	fn test_remove_destroys_subtree() {
		// Arrange
		let doc = Document::new();
		let card = doc.create_element("div");
		let button = doc.create_element("button");
		card.append_child(&button).unwrap();
		doc.body().append_child(&card).unwrap();
		doc.flush_mutations();

		// Act
		let removed = card.remove();

		// Assert
		assert_eq!(removed, 2);
		assert!(!card.is_live());
		assert!(!button.is_connected());
		assert!(doc.body().children().is_empty());
		assert_eq!(doc.pending_mutations(), 1);
		assert_eq!(doc.root().remove(), 0);
	}

	#[rstest]
	fn test_moving_out_of_document_queues_removal() {
		// Arrange
		let doc = Document::new();
		let holder = doc.create_element("div");
		let card = doc.create_element("div");
		let button = doc.create_element("button");
		card.append_child(&button).unwrap();
		doc.body().append_child(&card).unwrap();
		doc.flush_mutations();
		let removed = Rc::new(RefCell::new(Vec::new()));
		{
			let removed = removed.clone();
			doc.observe(move |records| {
				for record in records {
					removed.borrow_mut().extend(record.removed.iter().copied());
				}
			});
		}

		// Act
		holder.append_child(&card).unwrap();
		doc.flush_mutations();

		// Assert
		assert_eq!(*removed.borrow(), vec![card.node_id(), button.node_id()]);
		assert!(card.is_live());
		assert!(!card.is_connected());
	}

	#[rstest]
	fn test_detached_nodes_are_not_connected() {
		let doc = Document::new();
		let parent = doc.create_element("div");
		let child = doc.create_element("span");
		parent.append_child(&child).unwrap();

		assert!(child.is_live());
		assert!(!child.is_connected());
		assert_eq!(doc.pending_mutations(), 0);
		assert!(parent.contains(&child));
		assert!(!child.contains(&parent));
	}
}
