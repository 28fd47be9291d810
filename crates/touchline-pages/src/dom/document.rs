//! Document arena, root listeners and mutation queue.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::element::Element;
use super::event::{Event, EventType};
use super::mutation::MutationRecord;

/// Generation-checked handle to a node slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
	index: u32,
	generation: u32,
}

impl NodeId {
	/// Arena slot index.
	pub fn index(&self) -> u32 {
		self.index
	}

	/// Slot generation at the time the node was created.
	pub fn generation(&self) -> u32 {
		self.generation
	}
}

/// A document-root event listener.
pub type Listener = Rc<dyn Fn(&Event)>;

/// A structural observer, called with each batch of queued records.
pub type MutationObserverFn = Rc<dyn Fn(&[MutationRecord])>;

#[derive(Debug)]
pub(crate) struct Node {
	pub(crate) tag: String,
	pub(crate) attributes: IndexMap<String, String>,
	pub(crate) parent: Option<NodeId>,
	pub(crate) children: Vec<NodeId>,
}

impl Node {
	fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			attributes: IndexMap::new(),
			parent: None,
			children: Vec::new(),
		}
	}
}

struct Slot {
	generation: u32,
	node: Option<Node>,
}

pub(crate) struct DocumentInner {
	slots: Vec<Slot>,
	free: Vec<u32>,
	root: NodeId,
	head: NodeId,
	body: NodeId,
	listeners: HashMap<EventType, Vec<Listener>>,
	observers: Vec<MutationObserverFn>,
	pub(crate) pending: Vec<MutationRecord>,
}

impl DocumentInner {
	fn alloc(&mut self, tag: &str) -> NodeId {
		if let Some(index) = self.free.pop() {
			let slot = &mut self.slots[index as usize];
			slot.node = Some(Node::new(tag));
			return NodeId {
				index,
				generation: slot.generation,
			};
		}

		let index = self.slots.len() as u32;
		self.slots.push(Slot {
			generation: 0,
			node: Some(Node::new(tag)),
		});
		NodeId {
			index,
			generation: 0,
		}
	}

	fn release(&mut self, id: NodeId) {
		if let Some(slot) = self.slots.get_mut(id.index as usize)
			&& slot.generation == id.generation
		{
			slot.node = None;
			slot.generation = slot.generation.wrapping_add(1);
			self.free.push(id.index);
		}
	}

	pub(crate) fn root(&self) -> NodeId {
		self.root
	}

	pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
		self.slots
			.get(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_ref())
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.node.as_mut())
	}

	pub(crate) fn is_live(&self, id: NodeId) -> bool {
		self.node(id).is_some()
	}

	pub(crate) fn is_connected(&self, id: NodeId) -> bool {
		let mut current = id;
		loop {
			if current == self.root {
				return true;
			}
			match self.node(current).and_then(|node| node.parent) {
				Some(parent) => current = parent,
				None => return false,
			}
		}
	}

	/// Preorder walk of `start` and everything below it.
	pub(crate) fn descendants(&self, start: NodeId) -> Vec<NodeId> {
		let mut out = Vec::new();
		let mut stack = vec![start];
		while let Some(id) = stack.pop() {
			if let Some(node) = self.node(id) {
				out.push(id);
				stack.extend(node.children.iter().rev().copied());
			}
		}
		out
	}

	/// Frees `id` and its subtree, returning the freed ids in preorder.
	pub(crate) fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
		if let Some(parent) = self.node(id).and_then(|node| node.parent)
			&& let Some(parent) = self.node_mut(parent)
		{
			parent.children.retain(|child| *child != id);
		}

		let removed = self.descendants(id);
		for node in &removed {
			self.release(*node);
		}
		removed
	}
}

/// Shared handle to a document.
///
/// Cloning is cheap; every clone refers to the same tree, listener table and
/// mutation queue.
#[derive(Clone)]
pub struct Document {
	inner: Rc<RefCell<DocumentInner>>,
}

impl Default for Document {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Document {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.borrow();
		f.debug_struct("Document")
			.field("nodes", &(inner.slots.len() - inner.free.len()))
			.field("listeners", &inner.listeners.keys().collect::<Vec<_>>())
			.field("observers", &inner.observers.len())
			.field("pending", &inner.pending.len())
			.finish()
	}
}

impl Document {
	/// Creates a document containing `<html><head></head><body></body></html>`.
	pub fn new() -> Self {
		let mut inner = DocumentInner {
			slots: Vec::new(),
			free: Vec::new(),
			root: NodeId {
				index: 0,
				generation: 0,
			},
			head: NodeId {
				index: 0,
				generation: 0,
			},
			body: NodeId {
				index: 0,
				generation: 0,
			},
			listeners: HashMap::new(),
			observers: Vec::new(),
			pending: Vec::new(),
		};

		let root = inner.alloc("html");
		let head = inner.alloc("head");
		let body = inner.alloc("body");
		for child in [head, body] {
			if let Some(node) = inner.node_mut(child) {
				node.parent = Some(root);
			}
		}
		if let Some(node) = inner.node_mut(root) {
			node.children = vec![head, body];
		}
		inner.root = root;
		inner.head = head;
		inner.body = body;

		Self {
			inner: Rc::new(RefCell::new(inner)),
		}
	}

	pub(crate) fn inner(&self) -> &Rc<RefCell<DocumentInner>> {
		&self.inner
	}

	/// Whether both handles refer to the same document.
	pub fn ptr_eq(&self, other: &Document) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}

	/// The `<html>` element.
	pub fn root(&self) -> Element {
		Element::new(self.clone(), self.inner.borrow().root)
	}

	/// The `<head>` element.
	pub fn head(&self) -> Element {
		Element::new(self.clone(), self.inner.borrow().head)
	}

	/// The `<body>` element.
	pub fn body(&self) -> Element {
		Element::new(self.clone(), self.inner.borrow().body)
	}

	/// Creates a detached element. It joins the document once appended.
	pub fn create_element(&self, tag: &str) -> Element {
		let id = self.inner.borrow_mut().alloc(tag);
		Element::new(self.clone(), id)
	}

	/// Resolves a node id to an element handle if the node is still alive.
	pub fn element(&self, id: NodeId) -> Option<Element> {
		self.inner
			.borrow()
			.is_live(id)
			.then(|| Element::new(self.clone(), id))
	}

	/// First connected element, in document order, whose `id` is `id`.
	pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
		let inner = self.inner.borrow();
		inner
			.descendants(inner.root)
			.into_iter()
			.find(|node| {
				inner
					.node(*node)
					.and_then(|n| n.attributes.get("id"))
					.is_some_and(|value| value == id)
			})
			.map(|node| Element::new(self.clone(), node))
	}

	/// `root` and its descendants carrying attribute `name`, in document order.
	pub fn query_all_with_attribute(&self, root: &Element, name: &str) -> Vec<Element> {
		self.query_all(root, |node| node.attributes.contains_key(name))
	}

	/// `root` and its descendants whose class list contains `class`.
	pub fn query_all_with_class(&self, root: &Element, class: &str) -> Vec<Element> {
		self.query_all(root, |node| {
			node.attributes
				.get("class")
				.is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
		})
	}

	fn query_all<P>(&self, root: &Element, predicate: P) -> Vec<Element>
	where
		P: Fn(&Node) -> bool,
	{
		if !root.owner_document().ptr_eq(self) {
			return Vec::new();
		}
		let inner = self.inner.borrow();
		inner
			.descendants(root.node_id())
			.into_iter()
			.filter(|id| inner.node(*id).is_some_and(&predicate))
			.map(|id| Element::new(self.clone(), id))
			.collect()
	}

	/// Number of live nodes, detached ones included.
	pub fn node_count(&self) -> usize {
		let inner = self.inner.borrow();
		inner.slots.len() - inner.free.len()
	}

	/// Adds a listener at the document root.
	///
	/// Listeners are never deduplicated; callers that need a single listener
	/// per event type keep their own guard.
	pub fn add_event_listener<F>(&self, event_type: EventType, listener: F)
	where
		F: Fn(&Event) + 'static,
	{
		self.inner
			.borrow_mut()
			.listeners
			.entry(event_type)
			.or_default()
			.push(Rc::new(listener));
	}

	/// Number of document-root listeners for `event_type`.
	pub fn listener_count(&self, event_type: &EventType) -> usize {
		self.inner
			.borrow()
			.listeners
			.get(event_type)
			.map_or(0, Vec::len)
	}

	/// Dispatches an event of `event_type` targeting `target`.
	///
	/// Every root listener for the type runs in registration order until one
	/// stops propagation; then pending mutation records are delivered.
	pub fn dispatch_event(&self, target: &Element, event_type: EventType) -> Event {
		let event = Event::new(event_type, target.clone());
		let listeners = self
			.inner
			.borrow()
			.listeners
			.get(event.event_type())
			.cloned()
			.unwrap_or_default();

		for listener in listeners {
			listener(&event);
			if event.propagation_stopped() {
				break;
			}
		}

		self.flush_mutations();
		event
	}

	/// Registers a structural observer.
	pub fn observe<F>(&self, observer: F)
	where
		F: Fn(&[MutationRecord]) + 'static,
	{
		self.inner.borrow_mut().observers.push(Rc::new(observer));
	}

	/// Number of records waiting for the next checkpoint.
	pub fn pending_mutations(&self) -> usize {
		self.inner.borrow().pending.len()
	}

	/// Delivers queued mutation records to every observer.
	///
	/// Records queued by observers themselves are delivered in a following
	/// round of the same call. Returns the number of records delivered.
	pub fn flush_mutations(&self) -> usize {
		let mut delivered = 0;
		loop {
			let (records, observers) = {
				let mut inner = self.inner.borrow_mut();
				if inner.pending.is_empty() {
					break;
				}
				(std::mem::take(&mut inner.pending), inner.observers.clone())
			};

			delivered += records.len();
			for observer in &observers {
				observer(&records);
			}
		}
		delivered
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::Cell;

	#[rstest]
	fn test_new_document_shape() {
		let doc = Document::new();

		assert_eq!(doc.root().tag_name(), "html");
		assert_eq!(doc.head().parent(), Some(doc.root()));
		assert_eq!(doc.body().parent(), Some(doc.root()));
		assert_eq!(doc.node_count(), 3);
	}

	#[rstest]
	fn test_released_slot_gets_new_generation() {
		// Arrange
		let doc = Document::new();
		let first = doc.create_element("div");
		doc.body().append_child(&first).unwrap();
		let first_id = first.node_id();

		// Act
		first.remove();
		let second = doc.create_element("span");

		// Assert
		assert_eq!(second.node_id().index(), first_id.index());
		assert_ne!(second.node_id(), first_id);
		assert!(doc.element(first_id).is_none());
		assert_eq!(second.tag_name(), "span");
	}

	#[rstest]
	fn test_get_element_by_id_ignores_detached() {
		let doc = Document::new();
		let detached = doc.create_element("div").attr("id", "ghost");
		assert!(doc.get_element_by_id("ghost").is_none());

		doc.body().append_child(&detached).unwrap();
		assert_eq!(doc.get_element_by_id("ghost"), Some(detached));
	}

	#[rstest]
	fn test_query_all_in_document_order() {
		// Arrange
		let doc = Document::new();
		let outer = doc.create_element("section").attr("data-action", "outer");
		let inner = doc.create_element("button").attr("data-action", "inner");
		let plain = doc.create_element("p");
		outer.append_child(&inner).unwrap();
		doc.body().append_child(&outer).unwrap();
		doc.body().append_child(&plain).unwrap();

		// Act
		let found = doc.query_all_with_attribute(&doc.root(), "data-action");

		// Assert
		assert_eq!(found, vec![outer, inner]);
	}

	#[rstest]
	fn test_query_all_with_class() {
		let doc = Document::new();
		let modal = doc.create_element("div").attr("class", "modal fade");
		let not_modal = doc.create_element("div").attr("class", "modal-dialog");
		modal.append_child(&not_modal).unwrap();
		doc.body().append_child(&modal).unwrap();

		assert_eq!(doc.query_all_with_class(&doc.body(), "modal"), vec![modal]);
	}

	#[rstest]
	fn test_dispatch_runs_listeners_in_order_until_stopped() {
		// Arrange
		let doc = Document::new();
		let calls = Rc::new(RefCell::new(Vec::new()));
		for label in ["first", "second", "third"] {
			let calls = calls.clone();
			doc.add_event_listener(EventType::Click, move |event| {
				calls.borrow_mut().push(label);
				if label == "second" {
					event.stop_propagation();
				}
			});
		}

		// Act
		doc.dispatch_event(&doc.body(), EventType::Click);

		// Assert
		assert_eq!(*calls.borrow(), vec!["first", "second"]);
		assert_eq!(doc.listener_count(&EventType::Click), 3);
		assert_eq!(doc.listener_count(&EventType::Submit), 0);
	}

	#[rstest]
	fn test_mutations_delivered_at_checkpoint() {
		// Arrange
		let doc = Document::new();
		let seen = Rc::new(Cell::new(0));
		{
			let seen = seen.clone();
			doc.observe(move |records| {
				seen.set(seen.get() + records.iter().filter(|r| r.has_removals()).count())
			});
		}
		let node = doc.create_element("div");
		doc.body().append_child(&node).unwrap();

		// Act
		node.remove();

		// Assert
		assert_eq!(seen.get(), 0);
		assert_eq!(doc.pending_mutations(), 2);
		assert_eq!(doc.flush_mutations(), 2);
		assert_eq!(seen.get(), 1);
		assert_eq!(doc.pending_mutations(), 0);
	}

	#[rstest]
	fn test_dispatch_flushes_mutations() {
		// Arrange
		let doc = Document::new();
		let target = doc.create_element("button");
		doc.body().append_child(&target).unwrap();
		doc.flush_mutations();
		let removed = Rc::new(Cell::new(0));
		{
			let removed = removed.clone();
			doc.observe(move |records| {
				removed.set(removed.get() + records.iter().map(|r| r.removed.len()).sum::<usize>())
			});
		}
		doc.add_event_listener(EventType::Click, |event| {
			event.target().remove();
		});

		// Act
		doc.dispatch_event(&target, EventType::Click);

		// Assert
		assert_eq!(removed.get(), 1);
		assert!(!target.is_live());
	}
}
