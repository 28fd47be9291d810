//! Error types for the orchestration layer.
//!
//! Nothing in this crate propagates an error out of [`InitRegistry::run_all`]
//! or out of a delegated dispatch. The types below are what gets logged,
//! collected into reports, or returned from the few operations that have a
//! caller able to act on them.
//!
//! [`InitRegistry::run_all`]: crate::init::InitRegistry::run_all

use std::time::Duration;

use thiserror::Error;

/// Error type returned by initializer callbacks, action handlers and widget
/// constructors.
///
/// Boxed so feature code can use `?` on whatever error it produces.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Errors raised by the initializer registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
	/// A one-shot initializer was registered a second time.
	#[error("initializer '{0}' is already registered and is not reinitializable")]
	RegistrationConflict(String),
	/// The callback returned an error.
	#[error("initializer '{name}' failed: {message}")]
	Failed {
		/// Entry name.
		name: String,
		/// Rendered error.
		message: String,
	},
	/// The callback panicked.
	#[error("initializer '{name}' panicked: {message}")]
	Panicked {
		/// Entry name.
		name: String,
		/// Panic payload, when it was a string.
		message: String,
	},
	/// `run_one` was asked for a name nobody registered.
	#[error("no initializer registered under '{0}'")]
	UnknownEntry(String),
}

/// Errors raised by the widget instance cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
	/// No connected element carries the requested id.
	#[error("no element with id '{0}' in the document")]
	ElementNotFound(String),
	/// An operation targeted a key with no live instance.
	#[error("no live instance for '{0}'")]
	StaleInstance(String),
	/// The widget constructor failed.
	#[error("failed to construct instance for '{key}': {message}")]
	Construction {
		/// Cache key.
		key: String,
		/// Rendered constructor error.
		message: String,
	},
	/// A widget method panicked.
	#[error("instance for '{key}' panicked: {message}")]
	Widget {
		/// Cache key.
		key: String,
		/// Panic payload, when it was a string.
		message: String,
	},
}

/// Errors raised by document tree mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomError {
	/// The node was removed and its slot freed.
	#[error("node is no longer part of the document arena")]
	StaleNode,
	/// The insertion would make a node its own ancestor.
	#[error("a node cannot be inserted into its own subtree")]
	HierarchyRequest,
}

/// Errors raised by the fetch helpers.
#[derive(Debug, Error)]
pub enum FetchError {
	/// The request did not complete in time.
	#[error("request timed out after {0:?}")]
	Timeout(Duration),
	/// Transport-level failure.
	#[error("request failed: {0}")]
	Request(#[from] reqwest::Error),
	/// Non-success HTTP status.
	#[error("server responded with status {0}")]
	Status(u16),
	/// Response body could not be decoded.
	#[error("failed to decode response: {0}")]
	Decode(String),
}

/// Errors raised while loading or validating settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
	/// The settings file could not be read.
	#[error("failed to read settings: {0}")]
	Io(String),
	/// The settings source could not be parsed.
	#[error("failed to parse settings: {0}")]
	Parse(String),
	/// The settings parsed but are not usable.
	#[error("invalid settings: {0}")]
	Validation(String),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum PagesError {
	/// Initializer registry error.
	#[error(transparent)]
	Init(#[from] InitError),
	/// Instance cache error.
	#[error(transparent)]
	Instance(#[from] InstanceError),
	/// Document mutation error.
	#[error(transparent)]
	Dom(#[from] DomError),
	/// Fetch helper error.
	#[error(transparent)]
	Fetch(#[from] FetchError),
	/// Settings error.
	#[error(transparent)]
	Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_init_error_display() {
		let err = InitError::RegistrationConflict("sidebar".to_string());
		assert_eq!(
			err.to_string(),
			"initializer 'sidebar' is already registered and is not reinitializable"
		);

		let err = InitError::Failed {
			name: "rsvp".to_string(),
			message: "boom".to_string(),
		};
		assert!(err.to_string().contains("rsvp"));
		assert!(err.to_string().contains("boom"));
	}

	#[rstest]
	fn test_pages_error_is_transparent() {
		let err: PagesError = InstanceError::ElementNotFound("editMatchModal".to_string()).into();
		assert_eq!(
			err.to_string(),
			"no element with id 'editMatchModal' in the document"
		);
	}

	#[rstest]
	fn test_fetch_timeout_display() {
		let err = FetchError::Timeout(Duration::from_millis(250));
		assert_eq!(err.to_string(), "request timed out after 250ms");
	}
}
