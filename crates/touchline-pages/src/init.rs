//! Initializer registry
//!
//! Feature modules register named initializers; [`InitRegistry::run_all`]
//! executes them in ascending priority, breaking ties by registration order.
//! One-shot initializers run at most once no matter how many times
//! `run_all` is called; reinitializable ones run on every call, which is what
//! the content-loaded hook relies on after markup is injected.
//!
//! No borrow of the registry is held while a callback runs. A callback may
//! register further initializers, query the registry, or call `run_all`
//! recursively. Entries registered during a run are executed by the next
//! `run_all`, and a nested run skips every entry still on the call stack,
//! reinitializable ones included.
//!
//! ```
//! use touchline_pages::dom::{Document, Element};
//! use touchline_pages::init::{InitOptions, InitRegistry};
//!
//! let doc = Document::new();
//! let registry = InitRegistry::new();
//! registry.register("sidebar", |_root: &Element| Ok(()), InitOptions::new().priority(10));
//! registry.register("rsvp", |_root: &Element| Ok(()), InitOptions::new());
//!
//! let report = registry.run_all(&doc.root());
//! assert_eq!(report.executed, vec!["sidebar", "rsvp"]);
//!
//! let report = registry.run_all(&doc.root());
//! assert!(report.executed.is_empty());
//! assert_eq!(report.skipped, vec!["sidebar", "rsvp"]);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::callback::{CallbackFailure, Initializer, IntoInitializer, guarded};
use crate::dom::Element;
use crate::error::InitError;
use crate::settings::InitSettings;
use crate::{debug_log, error_log, warn_log};

/// Priority used when [`InitOptions::priority`] is not set.
pub const DEFAULT_PRIORITY: i32 = 50;

/// Registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
	/// Lower runs first. `None` takes the registry default.
	pub priority: Option<i32>,
	/// Run again on every `run_all` instead of once.
	pub reinitializable: bool,
	/// Free-form description for diagnostics.
	pub description: Option<String>,
}

impl InitOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn priority(mut self, priority: i32) -> Self {
		self.priority = Some(priority);
		self
	}

	pub fn reinitializable(mut self, reinitializable: bool) -> Self {
		self.reinitializable = reinitializable;
		self
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}
}

/// Result of [`InitRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
	/// A new entry was added.
	Registered,
	/// A reinitializable entry had its callback and options replaced.
	Replaced,
	/// The name belongs to a one-shot entry; nothing changed.
	Rejected(InitError),
}

impl RegisterOutcome {
	/// Whether the registration took effect.
	pub fn is_accepted(&self) -> bool {
		!matches!(self, Self::Rejected(_))
	}
}

/// Names touched by one [`InitRegistry::run_all`], in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
	/// Callbacks invoked that returned `Ok`.
	pub executed: Vec<String>,
	/// One-shot entries that had already run.
	pub skipped: Vec<String>,
	/// Callbacks that returned `Err` or panicked.
	pub failed: Vec<String>,
}

impl InitReport {
	/// Number of callbacks invoked, failures included.
	pub fn invoked(&self) -> usize {
		self.executed.len() + self.failed.len()
	}

	/// Whether nothing failed.
	pub fn is_clean(&self) -> bool {
		self.failed.is_empty()
	}
}

/// Diagnostic snapshot of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializerInfo {
	pub name: String,
	pub priority: i32,
	pub reinitializable: bool,
	pub description: Option<String>,
	pub has_run: bool,
	pub run_count: u32,
}

struct Entry {
	callback: Initializer,
	priority: i32,
	reinitializable: bool,
	description: Option<String>,
	has_run: bool,
	run_count: u32,
	// Set while the callback is on the call stack.
	running: bool,
}

struct RegistryState {
	// Insertion order is registration order; replacing keeps the slot.
	entries: IndexMap<String, Entry>,
	default_priority: i32,
}

impl RegistryState {
	fn execution_order(&self) -> Vec<String> {
		let mut order: Vec<(i32, &String)> = self
			.entries
			.iter()
			.map(|(name, entry)| (entry.priority, name))
			.collect();
		// Stable, so equal priorities keep registration order.
		order.sort_by_key(|(priority, _)| *priority);
		order.into_iter().map(|(_, name)| name.clone()).collect()
	}
}

enum Step {
	Executed,
	Skipped,
	Failed(InitError),
	Missing,
}

/// Priority-ordered, idempotent initializer registry.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct InitRegistry {
	state: Rc<RefCell<RegistryState>>,
}

impl Default for InitRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for InitRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("InitRegistry")
			.field("entries", &self.entries())
			.finish()
	}
}

impl InitRegistry {
	pub fn new() -> Self {
		Self::with_default_priority(DEFAULT_PRIORITY)
	}

	pub fn with_default_priority(default_priority: i32) -> Self {
		Self {
			state: Rc::new(RefCell::new(RegistryState {
				entries: IndexMap::new(),
				default_priority,
			})),
		}
	}

	pub fn from_settings(settings: &InitSettings) -> Self {
		Self::with_default_priority(settings.default_priority)
	}

	/// Stores an initializer without running it.
	///
	/// Re-registering a one-shot name is a conflict: it is logged and the
	/// existing entry is kept. Re-registering a reinitializable name replaces
	/// its callback and options; whether it already ran is preserved.
	pub fn register<C>(&self, name: &str, callback: C, options: InitOptions) -> RegisterOutcome
	where
		C: IntoInitializer,
	{
		let mut state = self.state.borrow_mut();
		let priority = options.priority.unwrap_or(state.default_priority);

		match state.entries.get_mut(name) {
			Some(existing) if !existing.reinitializable => {
				warn_log!(
					"initializer '{}' is already registered and is not reinitializable; ignoring",
					name
				);
				RegisterOutcome::Rejected(InitError::RegistrationConflict(name.to_string()))
			}
			Some(existing) => {
				debug_log!("replacing reinitializable initializer '{}'", name);
				existing.callback = callback.into_initializer();
				existing.priority = priority;
				existing.reinitializable = options.reinitializable;
				existing.description = options.description;
				RegisterOutcome::Replaced
			}
			None => {
				state.entries.insert(
					name.to_string(),
					Entry {
						callback: callback.into_initializer(),
						priority,
						reinitializable: options.reinitializable,
						description: options.description,
						has_run: false,
						run_count: 0,
						running: false,
					},
				);
				RegisterOutcome::Registered
			}
		}
	}

	/// Runs every due initializer against `root`.
	///
	/// Never fails: callback errors and panics are logged, listed in
	/// [`InitReport::failed`] and execution continues with the next entry.
	pub fn run_all(&self, root: &Element) -> InitReport {
		let order = self.state.borrow().execution_order();
		let mut report = InitReport::default();

		for name in order {
			match self.run_entry(&name, root) {
				Step::Executed => report.executed.push(name),
				Step::Skipped => report.skipped.push(name),
				Step::Failed(_) => report.failed.push(name),
				Step::Missing => {}
			}
		}

		debug_log!(
			"run_all finished: {} executed, {} skipped, {} failed",
			report.executed.len(),
			report.skipped.len(),
			report.failed.len()
		);
		report
	}

	/// Runs a single entry under the same one-shot rules as `run_all`.
	///
	/// Returns `Ok(true)` when the callback ran, `Ok(false)` when a one-shot
	/// entry had already run.
	pub fn run_one(&self, name: &str, root: &Element) -> Result<bool, InitError> {
		match self.run_entry(name, root) {
			Step::Executed => Ok(true),
			Step::Skipped => Ok(false),
			Step::Failed(err) => Err(err),
			Step::Missing => {
				warn_log!("no initializer registered under '{}'", name);
				Err(InitError::UnknownEntry(name.to_string()))
			}
		}
	}

	fn run_entry(&self, name: &str, root: &Element) -> Step {
		let callback = {
			let mut state = self.state.borrow_mut();
			let Some(entry) = state.entries.get_mut(name) else {
				return Step::Missing;
			};
			if entry.running {
				debug_log!("initializer '{}' is already running; skipping nested run", name);
				return Step::Skipped;
			}
			if entry.has_run && !entry.reinitializable {
				debug_log!("initializer '{}' already ran; skipping", name);
				return Step::Skipped;
			}
			entry.has_run = true;
			entry.run_count += 1;
			entry.running = true;
			entry.callback.clone()
		};

		let result = guarded(|| callback.call(root));
		if let Some(entry) = self.state.borrow_mut().entries.get_mut(name) {
			entry.running = false;
		}

		match result {
			Ok(()) => Step::Executed,
			Err(CallbackFailure::Error(message)) => {
				error_log!("initializer '{}' failed: {}", name, message);
				Step::Failed(InitError::Failed {
					name: name.to_string(),
					message,
				})
			}
			Err(CallbackFailure::Panic(message)) => {
				error_log!("initializer '{}' panicked: {}", name, message);
				Step::Failed(InitError::Panicked {
					name: name.to_string(),
					message,
				})
			}
		}
	}

	/// Whether `name` has run at least once.
	pub fn is_initialized(&self, name: &str) -> bool {
		self.state
			.borrow()
			.entries
			.get(name)
			.is_some_and(|entry| entry.has_run)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.state.borrow().entries.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.state.borrow().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.borrow().entries.is_empty()
	}

	/// Snapshot of every entry in execution order.
	pub fn entries(&self) -> Vec<InitializerInfo> {
		let state = self.state.borrow();
		state
			.execution_order()
			.into_iter()
			.filter_map(|name| {
				let entry = state.entries.get(&name)?;
				Some(InitializerInfo {
					priority: entry.priority,
					reinitializable: entry.reinitializable,
					description: entry.description.clone(),
					has_run: entry.has_run,
					run_count: entry.run_count,
					name,
				})
			})
			.collect()
	}

	/// Clears the ran flag of `name` so a one-shot entry runs again.
	///
	/// Returns `false` for unknown names.
	pub fn reset(&self, name: &str) -> bool {
		match self.state.borrow_mut().entries.get_mut(name) {
			Some(entry) => {
				entry.has_run = false;
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::callback::CallbackResult;
	use crate::dom::Document;
	use rstest::{fixture, rstest};
	use std::cell::RefCell;

	type Log = Rc<RefCell<Vec<String>>>;

	#[fixture]
	fn doc() -> Document {
		Document::new()
	}

	fn recorder(log: &Log, label: &str) -> impl Fn(&Element) -> CallbackResult + 'static {
		let log = log.clone();
		let label = label.to_string();
		move |_root| {
			log.borrow_mut().push(label.clone());
			Ok(())
		}
	}

	#[rstest]
	fn test_priority_then_registration_order(doc: Document) {
		// Arrange
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register("a", recorder(&log, "a"), InitOptions::new().priority(10));
		registry.register("b", recorder(&log, "b"), InitOptions::new().priority(5));
		registry.register("c", recorder(&log, "c"), InitOptions::new().priority(10));
		registry.register("d", recorder(&log, "d"), InitOptions::new());

		// Act
		let report = registry.run_all(&doc.root());

		// Assert
		assert_eq!(*log.borrow(), vec!["b", "a", "c", "d"]);
		assert_eq!(report.executed, vec!["b", "a", "c", "d"]);
	}

	#[rstest]
	fn test_one_shot_runs_once(doc: Document) {
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register("x", recorder(&log, "x"), InitOptions::new());

		registry.run_all(&doc.root());
		registry.run_all(&doc.root());
		let third = registry.run_all(&doc.root());

		assert_eq!(log.borrow().len(), 1);
		assert_eq!(third.skipped, vec!["x"]);
		assert!(registry.is_initialized("x"));
	}

	#[rstest]
	fn test_reinitializable_runs_every_time(doc: Document) {
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register(
			"tables",
			recorder(&log, "tables"),
			InitOptions::new().reinitializable(true),
		);

		for _ in 0..3 {
			registry.run_all(&doc.root());
		}

		assert_eq!(log.borrow().len(), 3);
		assert_eq!(registry.entries()[0].run_count, 3);
	}

	#[rstest]
	fn test_conflict_keeps_first(doc: Document) {
		// Arrange
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register("x", recorder(&log, "first"), InitOptions::new());

		// Act
		let outcome = registry.register("x", recorder(&log, "second"), InitOptions::new().priority(1));
		registry.run_all(&doc.root());

		// Assert
		assert_eq!(
			outcome,
			RegisterOutcome::Rejected(InitError::RegistrationConflict("x".to_string()))
		);
		assert!(!outcome.is_accepted());
		assert_eq!(*log.borrow(), vec!["first"]);
		assert_eq!(registry.entries()[0].priority, DEFAULT_PRIORITY);
	}

	#[rstest]
	fn test_reinitializable_replacement_keeps_slot(doc: Document) {
		// Arrange
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register("a", recorder(&log, "a1"), InitOptions::new().reinitializable(true));
		registry.register("b", recorder(&log, "b"), InitOptions::new());

		// Act
		let outcome = registry.register(
			"a",
			recorder(&log, "a2"),
			InitOptions::new().reinitializable(true),
		);
		registry.run_all(&doc.root());

		// Assert
		assert_eq!(outcome, RegisterOutcome::Replaced);
		assert_eq!(*log.borrow(), vec!["a2", "b"]);
		assert_eq!(registry.len(), 2);
	}

	#[rstest]
	fn test_failures_do_not_stop_the_run(doc: Document) {
		// Arrange
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register("broken", |_: &Element| Err("no data".into()), InitOptions::new().priority(1));
		registry.register(
			"panics",
			|_: &Element| -> CallbackResult { panic!("kaboom") },
			InitOptions::new().priority(2),
		);
		registry.register("fine", recorder(&log, "fine"), InitOptions::new().priority(3));

		// Act
		let report = registry.run_all(&doc.root());
		let again = registry.run_all(&doc.root());

		// Assert
		assert_eq!(report.failed, vec!["broken", "panics"]);
		assert_eq!(report.executed, vec!["fine"]);
		assert_eq!(report.invoked(), 3);
		assert!(!report.is_clean());
		assert_eq!(again.skipped, vec!["broken", "panics", "fine"]);
	}

	#[rstest]
	fn test_registration_during_run_is_deferred(doc: Document) {
		// Arrange
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		{
			let inner = registry.clone();
			let log = log.clone();
			registry.register(
				"outer",
				move |_: &Element| {
					log.borrow_mut().push("outer".to_string());
					inner.register("late", recorder(&log, "late"), InitOptions::new().priority(0));
					Ok(())
				},
				InitOptions::new(),
			);
		}

		// Act
		let first = registry.run_all(&doc.root());
		let second = registry.run_all(&doc.root());

		// Assert
		assert_eq!(first.executed, vec!["outer"]);
		assert_eq!(second.executed, vec!["late"]);
		assert_eq!(*log.borrow(), vec!["outer", "late"]);
	}

	#[rstest]
	fn test_recursive_run_all_does_not_double_run(doc: Document) {
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		{
			let inner = registry.clone();
			let log = log.clone();
			registry.register(
				"reentrant",
				move |root: &Element| {
					log.borrow_mut().push("reentrant".to_string());
					inner.run_all(root);
					Ok(())
				},
				InitOptions::new().priority(1),
			);
		}
		registry.register("after", recorder(&log, "after"), InitOptions::new().priority(2));

		registry.run_all(&doc.root());

		assert_eq!(*log.borrow(), vec!["reentrant", "after"]);
	}

	#[rstest]
	fn test_reinitializable_recursive_run_all_runs_once_per_pass(doc: Document) {
		// Arrange
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		{
			let inner = registry.clone();
			let log = log.clone();
			registry.register(
				"loader",
				move |root: &Element| {
					log.borrow_mut().push("loader".to_string());
					let nested = inner.run_all(root);
					assert_eq!(nested.skipped, vec!["loader"]);
					Ok(())
				},
				InitOptions::new().reinitializable(true),
			);
		}

		// Act
		let first = registry.run_all(&doc.root());
		let second = registry.run_all(&doc.root());

		// Assert
		assert_eq!(first.executed, vec!["loader"]);
		assert_eq!(second.executed, vec!["loader"]);
		assert_eq!(log.borrow().len(), 2);
		assert_eq!(registry.entries()[0].run_count, 2);
	}

	#[rstest]
	fn test_run_one(doc: Document) {
		let log: Log = Rc::default();
		let registry = InitRegistry::new();
		registry.register("x", recorder(&log, "x"), InitOptions::new());

		assert_eq!(registry.run_one("x", &doc.root()), Ok(true));
		assert_eq!(registry.run_one("x", &doc.root()), Ok(false));
		assert_eq!(
			registry.run_one("missing", &doc.root()),
			Err(InitError::UnknownEntry("missing".to_string()))
		);

		assert!(registry.reset("x"));
		assert_eq!(registry.run_one("x", &doc.root()), Ok(true));
		assert_eq!(log.borrow().len(), 2);
		assert!(!registry.reset("missing"));
	}

	#[rstest]
	fn test_entries_snapshot() {
		let registry = InitRegistry::with_default_priority(20);
		registry.register(
			"modals",
			|_: &Element| Ok(()),
			InitOptions::new().description("modal wiring"),
		);
		registry.register("early", |_: &Element| Ok(()), InitOptions::new().priority(-1));

		let entries = registry.entries();

		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].name, "early");
		assert_eq!(entries[1].priority, 20);
		assert_eq!(entries[1].description.as_deref(), Some("modal wiring"));
		assert!(!entries[1].has_run);
		assert!(registry.contains("modals"));
		assert!(!registry.is_empty());
	}
}
