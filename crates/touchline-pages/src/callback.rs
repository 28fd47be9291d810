//! Callback types and conversion traits.
//!
//! Initializers and action handlers are stored as reference-counted closures
//! so a registry can hand out a clone and invoke it with no borrow of its own
//! state outstanding. That is what lets a callback re-enter the registry that
//! is running it.
//!
//! ## Example
//!
//! ```
//! use touchline_pages::callback::{ActionHandler, CallbackResult, IntoActionHandler};
//! use touchline_pages::dom::{Element, Event};
//!
//! let handler = (|element: &Element, _event: &Event| -> CallbackResult {
//! 	let _user = element.dataset("user-id");
//! 	Ok(())
//! })
//! .into_action_handler();
//!
//! let copy: ActionHandler = handler.clone();
//! assert!(format!("{copy:?}").contains("ActionHandler"));
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::dom::{Element, Event};
use crate::error::BoxError;

/// What initializers and handlers return.
pub type CallbackResult = Result<(), BoxError>;

/// A cloneable initializer callback, invoked with the root it should scan.
#[derive(Clone)]
pub struct Initializer {
	inner: Rc<dyn Fn(&Element) -> CallbackResult>,
}

impl Initializer {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Element) -> CallbackResult + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	pub fn call(&self, root: &Element) -> CallbackResult {
		(self.inner)(root)
	}
}

impl fmt::Debug for Initializer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Initializer")
			.field("inner", &"<function>")
			.finish()
	}
}

/// A cloneable action handler, invoked with the matched element and the
/// native event.
#[derive(Clone)]
pub struct ActionHandler {
	inner: Rc<dyn Fn(&Element, &Event) -> CallbackResult>,
}

impl ActionHandler {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&Element, &Event) -> CallbackResult + 'static,
	{
		Self { inner: Rc::new(f) }
	}

	pub fn call(&self, element: &Element, event: &Event) -> CallbackResult {
		(self.inner)(element, event)
	}

	/// Whether both handles wrap the same closure allocation.
	pub fn ptr_eq(&self, other: &ActionHandler) -> bool {
		Rc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for ActionHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActionHandler")
			.field("inner", &"<function>")
			.finish()
	}
}

/// Conversion into an [`Initializer`].
///
/// Implemented for matching closures and for [`Initializer`] itself, so
/// registration accepts either.
pub trait IntoInitializer {
	fn into_initializer(self) -> Initializer;
}

impl<F> IntoInitializer for F
where
	F: Fn(&Element) -> CallbackResult + 'static,
{
	fn into_initializer(self) -> Initializer {
		Initializer::new(self)
	}
}

impl IntoInitializer for Initializer {
	fn into_initializer(self) -> Initializer {
		self
	}
}

/// Conversion into an [`ActionHandler`].
pub trait IntoActionHandler {
	fn into_action_handler(self) -> ActionHandler;
}

impl<F> IntoActionHandler for F
where
	F: Fn(&Element, &Event) -> CallbackResult + 'static,
{
	fn into_action_handler(self) -> ActionHandler {
		ActionHandler::new(self)
	}
}

impl IntoActionHandler for ActionHandler {
	fn into_action_handler(self) -> ActionHandler {
		self
	}
}

/// How an isolated callback failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallbackFailure {
	Error(String),
	Panic(String),
}

/// Runs `f`, turning both an `Err` return and a panic into a
/// [`CallbackFailure`].
pub(crate) fn guarded<R, F>(f: F) -> Result<R, CallbackFailure>
where
	F: FnOnce() -> Result<R, BoxError>,
{
	match panic::catch_unwind(AssertUnwindSafe(f)) {
		Ok(Ok(value)) => Ok(value),
		Ok(Err(err)) => Err(CallbackFailure::Error(err.to_string())),
		Err(payload) => Err(CallbackFailure::Panic(panic_message(payload.as_ref()))),
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
