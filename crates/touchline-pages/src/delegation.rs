//! Delegated event dispatch
//!
//! One listener per event type is installed at the document root. When an
//! event arrives, the dispatcher finds the nearest inclusive ancestor of the
//! target carrying the action attribute (`data-action` by default), reads
//! the action name from it, and invokes the handler registered for
//! `(event type, action)`.
//!
//! Only the nearest marked ancestor is considered. If its action has no
//! handler nothing happens; the dispatcher does not keep climbing, since
//! marker values are shared with third-party widget code that handles its
//! own actions.
//!
//! Registering an action twice replaces the earlier handler. The overwrite is
//! logged at warn level so accidental collisions between feature modules show
//! up in the console.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use touchline_pages::delegation::{ActionOptions, EventDispatcher};
//! use touchline_pages::dom::{Document, Element, Event, EventType};
//!
//! let doc = Document::new();
//! let dispatcher = EventDispatcher::new(doc.clone());
//! dispatcher.bind(EventType::Click);
//!
//! let removed = Rc::new(Cell::new(None));
//! let sink = removed.clone();
//! dispatcher.register(
//! 	"remove-role",
//! 	move |element: &Element, _event: &Event| {
//! 		sink.set(element.dataset("user-id"));
//! 		Ok(())
//! 	},
//! 	ActionOptions::new().prevent_default(true),
//! );
//!
//! let button = doc
//! 	.create_element("button")
//! 	.attr("data-action", "remove-role")
//! 	.attr("data-user-id", "12");
//! doc.body().append_child(&button).unwrap();
//!
//! let event = doc.dispatch_event(&button, EventType::Click);
//! assert!(event.default_prevented());
//! assert_eq!(removed.take().as_deref(), Some("12"));
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::callback::{ActionHandler, CallbackFailure, IntoActionHandler, guarded};
use crate::dom::{Document, Event, EventType};
use crate::settings::PagesSettings;
use crate::{debug_log, error_log, warn_log};

/// Per-action dispatch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionOptions {
	/// Call `prevent_default` before the handler runs.
	pub prevent_default: bool,
	/// Stop delivery to later document listeners before the handler runs.
	pub stop_propagation: bool,
}

impl ActionOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn prevent_default(mut self, prevent: bool) -> Self {
		self.prevent_default = prevent;
		self
	}

	pub fn stop_propagation(mut self, stop: bool) -> Self {
		self.stop_propagation = stop;
		self
	}
}

/// What a single dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
	/// The handler ran and returned `Ok`.
	Handled(String),
	/// The handler returned `Err` or panicked.
	Failed {
		action: String,
		message: String,
	},
	/// The nearest marked ancestor names an action with no handler.
	Unresolved(String),
	/// No inclusive ancestor of the target carries the action attribute.
	Unmarked,
}

struct Registration {
	handler: ActionHandler,
	options: ActionOptions,
}

struct DispatcherState {
	document: Document,
	action_attribute: String,
	default_events: Vec<EventType>,
	warn_unresolved: bool,
	handlers: HashMap<(EventType, String), Registration>,
	bound: HashSet<EventType>,
}

/// Document-level action dispatcher.
///
/// Cloning yields another handle to the same handler table.
#[derive(Clone)]
pub struct EventDispatcher {
	state: Rc<RefCell<DispatcherState>>,
}

impl std::fmt::Debug for EventDispatcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.borrow();
		f.debug_struct("EventDispatcher")
			.field("action_attribute", &state.action_attribute)
			.field("handlers", &state.handlers.len())
			.field("bound", &state.bound)
			.finish()
	}
}

impl EventDispatcher {
	/// Creates a dispatcher with the default settings.
	pub fn new(document: Document) -> Self {
		Self::from_settings(document, &PagesSettings::default())
	}

	pub fn from_settings(document: Document, settings: &PagesSettings) -> Self {
		Self {
			state: Rc::new(RefCell::new(DispatcherState {
				document,
				action_attribute: settings.markers.action_attribute.clone(),
				default_events: settings.delegation.event_types(),
				warn_unresolved: settings.delegation.warn_unresolved,
				handlers: HashMap::new(),
				bound: HashSet::new(),
			})),
		}
	}

	/// The attribute actions are read from.
	pub fn action_attribute(&self) -> String {
		self.state.borrow().action_attribute.clone()
	}

	/// Registers a click handler for `action`.
	///
	/// Returns the handler it replaced, if any.
	pub fn register<H>(&self, action: &str, handler: H, options: ActionOptions) -> Option<ActionHandler>
	where
		H: IntoActionHandler,
	{
		self.register_for(EventType::Click, action, handler, options)
	}

	/// Registers a handler for `action` on `event_type`.
	///
	/// Last registration wins. Returns the handler it replaced, if any.
	pub fn register_for<H>(
		&self,
		event_type: EventType,
		action: &str,
		handler: H,
		options: ActionOptions,
	) -> Option<ActionHandler>
	where
		H: IntoActionHandler,
	{
		let registration = Registration {
			handler: handler.into_action_handler(),
			options,
		};
		let previous = self
			.state
			.borrow_mut()
			.handlers
			.insert((event_type.clone(), action.to_string()), registration);

		if previous.is_some() {
			warn_log!(
				"action '{}' for '{}' events was already registered; replacing the previous handler",
				action,
				event_type
			);
		}
		previous.map(|registration| registration.handler)
	}

	/// Removes the handler for `(event_type, action)`.
	pub fn unregister(&self, event_type: &EventType, action: &str) -> bool {
		self.state
			.borrow_mut()
			.handlers
			.remove(&(event_type.clone(), action.to_string()))
			.is_some()
	}

	pub fn has_handler(&self, event_type: &EventType, action: &str) -> bool {
		self.state
			.borrow()
			.handlers
			.contains_key(&(event_type.clone(), action.to_string()))
	}

	pub fn handler_count(&self) -> usize {
		self.state.borrow().handlers.len()
	}

	pub fn is_bound(&self, event_type: &EventType) -> bool {
		self.state.borrow().bound.contains(event_type)
	}

	/// Installs the document listener for `event_type`.
	///
	/// Returns `false` if this dispatcher already bound that type; no second
	/// listener is added.
	pub fn bind(&self, event_type: EventType) -> bool {
		let document = {
			let mut state = self.state.borrow_mut();
			if !state.bound.insert(event_type.clone()) {
				return false;
			}
			state.document.clone()
		};

		let weak: Weak<RefCell<DispatcherState>> = Rc::downgrade(&self.state);
		document.add_event_listener(event_type.clone(), move |event| {
			if let Some(state) = weak.upgrade() {
				EventDispatcher { state }.dispatch(event);
			}
		});
		debug_log!("bound delegated '{}' listener", event_type);
		true
	}

	/// Binds every configured default event type. Returns how many were new.
	pub fn bind_defaults(&self) -> usize {
		let events = self.state.borrow().default_events.clone();
		events
			.into_iter()
			.filter(|event_type| self.bind(event_type.clone()))
			.count()
	}

	/// Resolves and runs the handler for `event`.
	///
	/// This is what the document listener calls; it is public so synthetic
	/// events can be routed without a document listener. Never panics and
	/// never returns an error: handler failures are logged and reported in
	/// the outcome.
	pub fn dispatch(&self, event: &Event) -> DispatchOutcome {
		let (matched, action, registration) = {
			let state = self.state.borrow();
			let Some(matched) = event.target().closest_with_attribute(&state.action_attribute) else {
				return DispatchOutcome::Unmarked;
			};
			let action = matched
				.get_attribute(&state.action_attribute)
				.unwrap_or_default();
			let registration = state
				.handlers
				.get(&(event.event_type().clone(), action.clone()))
				.map(|registration| (registration.handler.clone(), registration.options));

			if registration.is_none() && state.warn_unresolved {
				debug_log!(
					"no handler for action '{}' on '{}' events",
					action,
					event.event_type()
				);
			}
			(matched, action, registration)
		};

		let Some((handler, options)) = registration else {
			return DispatchOutcome::Unresolved(action);
		};

		if options.prevent_default {
			event.prevent_default();
		}
		if options.stop_propagation {
			event.stop_propagation();
		}

		match guarded(|| handler.call(&matched, event)) {
			Ok(()) => DispatchOutcome::Handled(action),
			Err(CallbackFailure::Error(message)) | Err(CallbackFailure::Panic(message)) => {
				error_log!("handler for action '{}' failed: {}", action, message);
				DispatchOutcome::Failed { action, message }
			}
		}
	}
}
