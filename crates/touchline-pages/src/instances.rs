//! Widget instance cache
//!
//! Server-rendered pages carry dialog markup that is only turned into a
//! live controller when first needed. [`InstanceCache`] constructs that
//! controller on demand, keeps exactly one per element id, and disposes it
//! when the element leaves the document or on explicit cleanup.
//!
//! ## Lifecycle
//!
//! ```text
//! absent --show/get_or_create--> constructed --show--> shown <--hide/show--> hidden
//!    ^                                                                        |
//!    +------------------------- cleanup / node removed -----------------------+
//! ```
//!
//! Disposed entries are dropped from the cache; there are no tombstones.
//!
//! ## Re-entrancy
//!
//! Constructors run with no borrow of the cache held and may call back into
//! it. [`Widget`] methods run while the cache is borrowed and must not call
//! back into the same cache.
//!
//! A panic in a widget method is caught and logged. The entry keeps its
//! previous state, and a panicking `dispose` still removes the entry.

mod modal;

pub use modal::{Backdrop, Modal, ModalOptions};

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::callback::{CallbackFailure, guarded};
use crate::dom::{Document, Element, MutationRecord, NodeId};
use crate::error::{BoxError, InstanceError};
use crate::settings::PagesSettings;
use crate::{debug_log, error_log, warn_log};

/// A UI controller bound to one element.
pub trait Widget: 'static {
	/// Construction options.
	type Options: Clone + Default + fmt::Debug;

	fn show(&mut self);

	fn hide(&mut self);

	/// Releases whatever the widget attached to its element.
	fn dispose(&mut self) {}

	/// Options for an element found by [`InstanceCache::discover`].
	fn read_options(_element: &Element) -> Self::Options
	where
		Self: Sized,
	{
		Self::Options::default()
	}
}

/// Runs one widget method, containing a panic.
fn call_widget<F>(key: &str, method: &str, f: F) -> Result<(), String>
where
	F: FnOnce(),
{
	guarded(|| {
		f();
		Ok(())
	})
	.map_err(|failure| {
		let message = match failure {
			CallbackFailure::Error(message) | CallbackFailure::Panic(message) => message,
		};
		error_log!("instance '{}' panicked in {}: {}", key, method, message);
		message
	})
}

fn dispose_widget<W: Widget>(key: &str, mut widget: W) {
	call_widget(key, "dispose", || widget.dispose()).ok();
}

/// Observable state of a cached instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceState {
	/// Built but never shown.
	Constructed,
	Shown,
	Hidden,
}

struct CachedInstance<W: Widget> {
	element: Element,
	widget: W,
	options: W::Options,
	state: InstanceState,
}

struct CacheState<W: Widget> {
	document: Document,
	instance_class: String,
	entries: IndexMap<String, CachedInstance<W>>,
	observing: bool,
}

impl<W: Widget> CacheState<W> {
	/// Removes and returns the entries whose node is in `removed`.
	fn take_removed(&mut self, removed: &HashSet<NodeId>) -> Vec<(String, W)> {
		let keys: Vec<String> = self
			.entries
			.iter()
			.filter(|(_, entry)| removed.contains(&entry.element.node_id()))
			.map(|(key, _)| key.clone())
			.collect();

		keys.into_iter()
			.filter_map(|key| {
				let entry = self.entries.shift_remove(&key)?;
				Some((key, entry.widget))
			})
			.collect()
	}
}

/// Cache of widget instances keyed by element id.
pub struct InstanceCache<W: Widget> {
	state: Rc<RefCell<CacheState<W>>>,
}

impl<W: Widget> Clone for InstanceCache<W> {
	fn clone(&self) -> Self {
		Self {
			state: Rc::clone(&self.state),
		}
	}
}

impl<W: Widget> fmt::Debug for InstanceCache<W> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("InstanceCache")
			.field(
				"entries",
				&state
					.entries
					.iter()
					.map(|(key, entry)| (key.as_str(), entry.state))
					.collect::<Vec<_>>(),
			)
			.field("observing", &state.observing)
			.finish()
	}
}

impl<W: Widget> InstanceCache<W> {
	pub fn new(document: Document) -> Self {
		Self::from_settings(document, &PagesSettings::default())
	}

	pub fn from_settings(document: Document, settings: &PagesSettings) -> Self {
		Self {
			state: Rc::new(RefCell::new(CacheState {
				document,
				instance_class: settings.markers.instance_class.clone(),
				entries: IndexMap::new(),
				observing: false,
			})),
		}
	}

	/// Starts watching the document so entries whose element is removed are
	/// disposed at the next mutation checkpoint. Returns `false` if already
	/// watching.
	pub fn observe(&self) -> bool {
		let document = {
			let mut state = self.state.borrow_mut();
			if state.observing {
				return false;
			}
			state.observing = true;
			state.document.clone()
		};

		let weak: Weak<RefCell<CacheState<W>>> = Rc::downgrade(&self.state);
		document.observe(move |records: &[MutationRecord]| {
			let Some(state) = weak.upgrade() else {
				return;
			};
			let removed: HashSet<NodeId> = records
				.iter()
				.flat_map(|record| record.removed.iter().copied())
				.collect();
			if removed.is_empty() {
				return;
			}

			let disposed = state.borrow_mut().take_removed(&removed);
			for (key, widget) in disposed {
				debug_log!("element '{}' left the document; disposing its instance", key);
				dispose_widget(&key, widget);
			}
		});
		true
	}

	/// Shows the instance for `key`, constructing it first if needed.
	///
	/// A cached instance is reused as is; `options` only apply when a new
	/// instance is built.
	pub fn show<C>(&self, key: &str, ctor: C, options: W::Options) -> Result<(), InstanceError>
	where
		C: FnOnce(&Element, &W::Options) -> Result<W, BoxError>,
	{
		self.ensure(key, ctor, options)?;

		let mut state = self.state.borrow_mut();
		let entry = state
			.entries
			.get_mut(key)
			.ok_or_else(|| InstanceError::StaleInstance(key.to_string()))?;
		call_widget(key, "show", || entry.widget.show()).map_err(|message| InstanceError::Widget {
			key: key.to_string(),
			message,
		})?;
		entry.state = InstanceState::Shown;
		Ok(())
	}

	/// Constructs and caches the instance for `key` without showing it.
	///
	/// Returns `true` when a new instance was built.
	pub fn get_or_create<C>(&self, key: &str, ctor: C, options: W::Options) -> Result<bool, InstanceError>
	where
		C: FnOnce(&Element, &W::Options) -> Result<W, BoxError>,
	{
		self.ensure(key, ctor, options)
	}

	fn ensure<C>(&self, key: &str, ctor: C, options: W::Options) -> Result<bool, InstanceError>
	where
		C: FnOnce(&Element, &W::Options) -> Result<W, BoxError>,
	{
		let document = self.state.borrow().document.clone();
		let element = document
			.get_element_by_id(key)
			.ok_or_else(|| InstanceError::ElementNotFound(key.to_string()))?;

		let stale = {
			let mut state = self.state.borrow_mut();
			let current = state.entries.get(key).map(|entry| entry.element == element);
			match current {
				Some(true) => return Ok(false),
				Some(false) => state.entries.shift_remove(key),
				None => None,
			}
		};
		if let Some(stale) = stale {
			debug_log!("element '{}' was replaced; rebuilding its instance", key);
			dispose_widget(key, stale.widget);
		}

		let widget = guarded(|| ctor(&element, &options)).map_err(|failure| {
			let message = match failure {
				CallbackFailure::Error(message) | CallbackFailure::Panic(message) => message,
			};
			warn_log!("failed to construct instance for '{}': {}", key, message);
			InstanceError::Construction {
				key: key.to_string(),
				message,
			}
		})?;

		let mut state = self.state.borrow_mut();
		if state.entries.contains_key(key) {
			// The constructor re-entered and cached an instance of its own.
			drop(state);
			dispose_widget(key, widget);
			return Ok(false);
		}
		state.entries.insert(
			key.to_string(),
			CachedInstance {
				element,
				widget,
				options,
				state: InstanceState::Constructed,
			},
		);
		Ok(true)
	}

	/// Hides the cached instance for `key`.
	///
	/// Returns `false` (and logs) when there is no live instance or the
	/// widget panicked.
	pub fn hide(&self, key: &str) -> bool {
		if !self.ensure_live(key) {
			return false;
		}
		let mut state = self.state.borrow_mut();
		let Some(entry) = state.entries.get_mut(key) else {
			return false;
		};
		if call_widget(key, "hide", || entry.widget.hide()).is_err() {
			return false;
		}
		entry.state = InstanceState::Hidden;
		true
	}

	/// Shows a hidden or fresh instance, hides a shown one.
	///
	/// Returns the resulting state, unchanged if the widget panicked, or
	/// `None` when there is no live instance.
	pub fn toggle(&self, key: &str) -> Option<InstanceState> {
		if !self.ensure_live(key) {
			return None;
		}
		let mut state = self.state.borrow_mut();
		let entry = state.entries.get_mut(key)?;
		if entry.state == InstanceState::Shown {
			if call_widget(key, "hide", || entry.widget.hide()).is_ok() {
				entry.state = InstanceState::Hidden;
			}
		} else if call_widget(key, "show", || entry.widget.show()).is_ok() {
			entry.state = InstanceState::Shown;
		}
		Some(entry.state)
	}

	/// Drops stale entries for `key`; `true` if a live one remains.
	fn ensure_live(&self, key: &str) -> bool {
		let live = {
			let state = self.state.borrow();
			match state.entries.get(key) {
				Some(entry) => entry.element.is_connected(),
				None => {
					debug_log!("no cached instance for '{}'", key);
					return false;
				}
			}
		};
		if !live {
			debug_log!("cached instance for '{}' outlived its element", key);
			self.cleanup(key);
		}
		live
	}

	/// Disposes and forgets the instance for `key`.
	///
	/// Safe for unknown and already cleaned keys. Returns whether an instance
	/// was removed.
	pub fn cleanup(&self, key: &str) -> bool {
		let removed = self.state.borrow_mut().entries.shift_remove(key);
		match removed {
			Some(entry) => {
				dispose_widget(key, entry.widget);
				true
			}
			None => false,
		}
	}

	/// Disposes every instance. Returns how many were removed.
	pub fn cleanup_all(&self) -> usize {
		let entries = std::mem::take(&mut self.state.borrow_mut().entries);
		let count = entries.len();
		for (key, entry) in entries {
			dispose_widget(&key, entry.widget);
		}
		count
	}

	/// Hides every shown instance. Returns how many were hidden.
	pub fn hide_all(&self) -> usize {
		let mut state = self.state.borrow_mut();
		let mut hidden = 0;
		for (key, entry) in state.entries.iter_mut() {
			if entry.state == InstanceState::Shown
				&& call_widget(key, "hide", || entry.widget.hide()).is_ok()
			{
				entry.state = InstanceState::Hidden;
				hidden += 1;
			}
		}
		hidden
	}

	/// Builds instances for marked elements under `root` that are not cached
	/// yet, without showing them. Returns how many were built.
	///
	/// Elements without an `id` cannot be keyed and are skipped.
	pub fn discover<C>(&self, root: &Element, ctor: C) -> usize
	where
		C: Fn(&Element, &W::Options) -> Result<W, BoxError>,
	{
		let (document, class) = {
			let state = self.state.borrow();
			(state.document.clone(), state.instance_class.clone())
		};

		let mut built = 0;
		for element in document.query_all_with_class(root, &class) {
			let Some(key) = element.id() else {
				debug_log!("skipping '.{}' element without an id", class);
				continue;
			};
			let options = W::read_options(&element);
			if let Ok(true) = self.ensure(&key, &ctor, options) {
				built += 1;
			}
		}
		built
	}

	/// Runs `f` on the live instance for `key`.
	pub fn with_instance<R>(&self, key: &str, f: impl FnOnce(&mut W) -> R) -> Option<R> {
		let mut state = self.state.borrow_mut();
		state.entries.get_mut(key).map(|entry| f(&mut entry.widget))
	}

	/// Options the instance for `key` was built with.
	pub fn options(&self, key: &str) -> Option<W::Options> {
		self.state
			.borrow()
			.entries
			.get(key)
			.map(|entry| entry.options.clone())
	}

	pub fn state(&self, key: &str) -> Option<InstanceState> {
		self.state.borrow().entries.get(key).map(|entry| entry.state)
	}

	pub fn contains(&self, key: &str) -> bool {
		self.state.borrow().entries.contains_key(key)
	}

	/// Cached keys in construction order.
	pub fn keys(&self) -> Vec<String> {
		self.state.borrow().entries.keys().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.state.borrow().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.borrow().entries.is_empty()
	}
}
