//! Logging layer for touchline-pages
//!
//! The orchestration layer reports everything it swallows (conflicting
//! registrations, failing initializers, panicking handlers) through these
//! macros. They forward to [`tracing`] under the `touchline_pages` target so
//! feature crates can filter orchestration noise independently.
//!
//! ## Macro Overview
//!
//! | Macro | Level | Used for |
//! |-------|-------|----------|
//! | `debug_log!` | `DEBUG` | skipped initializers, unresolved actions, cache hits |
//! | `info_log!` | `INFO` | bootstrap summaries |
//! | `warn_log!` | `WARN` | registration conflicts, handler overwrites, missing elements |
//! | `error_log!` | `ERROR` | failing or panicking callbacks |
//!
//! ## Example
//!
//! ```ignore
//! use touchline_pages::{debug_log, error_log, info_log, warn_log};
//!
//! debug_log!("skipping '{}'", name);
//! info_log!("bootstrap finished: {} initializers", count);
//! warn_log!("action '{}' re-registered", action);
//! error_log!("initializer '{}' failed: {}", name, err);
//! ```

use crate::settings::LoggingSettings;

/// Logs a debug message under the `touchline_pages` target.
#[macro_export]
macro_rules! debug_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::debug!(target: "touchline_pages", $($arg)*);
	}};
}

/// Logs an info message under the `touchline_pages` target.
#[macro_export]
macro_rules! info_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::info!(target: "touchline_pages", $($arg)*);
	}};
}

/// Logs a warning under the `touchline_pages` target.
#[macro_export]
macro_rules! warn_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::warn!(target: "touchline_pages", $($arg)*);
	}};
}

/// Logs an error under the `touchline_pages` target.
#[macro_export]
macro_rules! error_log {
	($($arg:tt)*) => {{
		$crate::__private::tracing::error!(target: "touchline_pages", $($arg)*);
	}};
}

/// Installs a global fmt subscriber configured from `settings`.
///
/// Returns `false` when a global subscriber was already installed; the
/// existing one is left in place.
#[cfg(feature = "subscriber")]
pub fn init(settings: &LoggingSettings) -> bool {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_ansi(settings.ansi)
		.try_init()
		.is_ok()
}

/// Without the `subscriber` feature the host application owns subscriber
/// setup; this only reports that nothing was installed.
#[cfg(not(feature = "subscriber"))]
pub fn init(settings: &LoggingSettings) -> bool {
	let _ = settings;
	false
}

#[cfg(test)]
mod tests {
	use crate::{debug_log, error_log, info_log, warn_log};
	use rstest::rstest;
	use std::sync::{Arc, Mutex};
	use tracing::Level;
	use tracing_subscriber::layer::{Context, SubscriberExt as _};
	use tracing_subscriber::util::SubscriberInitExt as _;

	type Captured = Arc<Mutex<Vec<(Level, String, String)>>>;

	/// Records level, target and message of every event.
	struct Capture {
		events: Captured,
	}

	impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Capture {
		fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
			struct MessageVisitor(String);

			impl tracing::field::Visit for MessageVisitor {
				fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
					if field.name() == "message" {
						self.0 = format!("{:?}", value);
					}
				}
			}

			let mut visitor = MessageVisitor(String::new());
			event.record(&mut visitor);
			self.events.lock().unwrap().push((
				*event.metadata().level(),
				event.metadata().target().to_string(),
				visitor.0,
			));
		}
	}

	#[rstest]
	fn test_macros_log_under_crate_target() {
		// Arrange
		let events: Captured = Arc::default();
		let _guard = tracing_subscriber::registry()
			.with(Capture {
				events: events.clone(),
			})
			.set_default();

		// Act
		debug_log!("skipping '{}'", "navbar");
		info_log!("bootstrap finished: {} initializers", 3);
		warn_log!("action '{}' re-registered", "save");
		error_log!("initializer '{}' failed: {}", "rsvp", "boom");

		// Assert
		let events = events.lock().unwrap();
		let levels: Vec<Level> = events.iter().map(|(level, _, _)| *level).collect();
		assert_eq!(levels, vec![Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR]);
		assert!(events.iter().all(|(_, target, _)| target == "touchline_pages"));
		assert_eq!(events[2].2, "action 'save' re-registered");
		assert_eq!(events[3].2, "initializer 'rsvp' failed: boom");
	}
}
