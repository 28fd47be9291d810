//! Native event types and the event object handed to listeners.

use std::cell::Cell;
use std::fmt;

use super::element::Element;

/// DOM event types the orchestration layer binds listeners for.
///
/// Unknown names are preserved as [`EventType::Custom`] rather than rejected,
/// since feature modules may dispatch their own event names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventType {
	/// `click`
	Click,
	/// `change`
	Change,
	/// `submit`
	Submit,
	/// `input`
	Input,
	/// `keydown`
	KeyDown,
	/// Any other event name.
	Custom(String),
}

impl EventType {
	/// The DOM event name.
	pub fn as_str(&self) -> &str {
		match self {
			Self::Click => "click",
			Self::Change => "change",
			Self::Submit => "submit",
			Self::Input => "input",
			Self::KeyDown => "keydown",
			Self::Custom(name) => name,
		}
	}
}

impl From<&str> for EventType {
	fn from(name: &str) -> Self {
		match name {
			"click" => Self::Click,
			"change" => Self::Change,
			"submit" => Self::Submit,
			"input" => Self::Input,
			"keydown" => Self::KeyDown,
			other => Self::Custom(other.to_string()),
		}
	}
}

impl fmt::Display for EventType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An event travelling from its target to the document-root listeners.
///
/// Flags use interior mutability so every listener can observe and update
/// them through a shared reference, the way `Event` works in the browser.
#[derive(Debug)]
pub struct Event {
	event_type: EventType,
	target: Element,
	default_prevented: Cell<bool>,
	propagation_stopped: Cell<bool>,
}

impl Event {
	/// Creates an event targeting `target`.
	pub fn new(event_type: EventType, target: Element) -> Self {
		Self {
			event_type,
			target,
			default_prevented: Cell::new(false),
			propagation_stopped: Cell::new(false),
		}
	}

	/// The event type.
	pub fn event_type(&self) -> &EventType {
		&self.event_type
	}

	/// The element the event was dispatched on.
	pub fn target(&self) -> &Element {
		&self.target
	}

	/// Cancels the default action.
	pub fn prevent_default(&self) {
		self.default_prevented.set(true);
	}

	/// Whether [`Event::prevent_default`] was called.
	pub fn default_prevented(&self) -> bool {
		self.default_prevented.get()
	}

	/// Stops delivery to the remaining document listeners.
	pub fn stop_propagation(&self) {
		self.propagation_stopped.set(true);
	}

	/// Whether [`Event::stop_propagation`] was called.
	pub fn propagation_stopped(&self) -> bool {
		self.propagation_stopped.get()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("click", EventType::Click)]
	#[case("change", EventType::Change)]
	#[case("submit", EventType::Submit)]
	#[case("input", EventType::Input)]
	#[case("keydown", EventType::KeyDown)]
	#[case("rsvp:updated", EventType::Custom("rsvp:updated".to_string()))]
	fn test_event_type_from_str(#[case] name: &str, #[case] expected: EventType) {
		let parsed = EventType::from(name);
		assert_eq!(parsed, expected);
		assert_eq!(parsed.as_str(), name);
	}

	#[rstest]
	fn test_event_flags() {
		let doc = crate::dom::Document::new();
		let event = Event::new(EventType::Submit, doc.body());

		assert!(!event.default_prevented());
		event.prevent_default();
		event.stop_propagation();
		assert!(event.default_prevented());
		assert!(event.propagation_stopped());
		assert_eq!(event.event_type().to_string(), "submit");
	}
}
