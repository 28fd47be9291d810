//! Orchestration settings
//!
//! Settings can be loaded from TOML or JSON files, from strings, or overridden
//! from `TOUCHLINE_*` environment variables. Every field has a default, so an
//! empty file is a valid configuration.
//!
//! ```toml
//! [markers]
//! action_attribute = "data-action"
//! instance_class = "modal"
//!
//! [delegation]
//! default_events = ["click", "change", "submit"]
//! warn_unresolved = true
//!
//! [fetch]
//! timeout_ms = 10000
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dom::EventType;
use crate::error::SettingsError;

/// Top-level settings for a page runtime.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesSettings {
	/// Declarative marker names shared with server-rendered markup.
	pub markers: MarkerSettings,
	/// Initializer registry defaults.
	pub init: InitSettings,
	/// Delegated event dispatch.
	pub delegation: DelegationSettings,
	/// Device classification breakpoints.
	pub viewport: ViewportSettings,
	/// Fetch helper defaults.
	pub fetch: FetchSettings,
	/// Logging subscriber configuration.
	pub logging: LoggingSettings,
}

/// Attribute and class names read from markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
	/// Attribute naming the action of an interactive element.
	pub action_attribute: String,
	/// Attribute naming the record an action targets.
	pub target_attribute: String,
	/// Class carried by elements managed by the modal cache.
	pub instance_class: String,
}

impl Default for MarkerSettings {
	fn default() -> Self {
		Self {
			action_attribute: "data-action".to_string(),
			target_attribute: "data-id".to_string(),
			instance_class: "modal".to_string(),
		}
	}
}

/// Initializer registry defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitSettings {
	/// Priority given to initializers that do not pick one.
	pub default_priority: i32,
}

impl Default for InitSettings {
	fn default() -> Self {
		Self {
			default_priority: crate::init::DEFAULT_PRIORITY,
		}
	}
}

/// Delegated dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationSettings {
	/// Event types bound at bootstrap.
	pub default_events: Vec<String>,
	/// Log marker values that have no registered handler.
	pub warn_unresolved: bool,
}

impl Default for DelegationSettings {
	fn default() -> Self {
		Self {
			default_events: ["click", "change", "submit", "input"]
				.into_iter()
				.map(String::from)
				.collect(),
			warn_unresolved: false,
		}
	}
}

impl DelegationSettings {
	/// Parsed event types, in configuration order.
	pub fn event_types(&self) -> Vec<EventType> {
		self.default_events
			.iter()
			.map(|name| EventType::from(name.as_str()))
			.collect()
	}
}

/// Viewport breakpoints, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
	/// Widest viewport still classified as mobile.
	pub mobile_max_width: u32,
	/// Widest viewport still classified as tablet.
	pub tablet_max_width: u32,
}

impl Default for ViewportSettings {
	fn default() -> Self {
		Self {
			mobile_max_width: 767,
			tablet_max_width: 991,
		}
	}
}

/// Fetch helper defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
	/// Request timeout in milliseconds.
	pub timeout_ms: u64,
}

impl Default for FetchSettings {
	fn default() -> Self {
		Self { timeout_ms: 15_000 }
	}
}

impl FetchSettings {
	/// The timeout as a [`Duration`].
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}
}

/// Logging subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
	/// Env-filter directive, e.g. `"info"` or `"touchline_pages=debug"`.
	pub level: String,
	/// Colored output.
	pub ansi: bool,
}

impl Default for LoggingSettings {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			ansi: true,
		}
	}
}

impl PagesSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Parses settings from a TOML document.
	pub fn from_toml_str(source: &str) -> Result<Self, SettingsError> {
		toml::from_str(source).map_err(|e| SettingsError::Parse(format!("TOML parse error: {}", e)))
	}

	/// Parses settings from a JSON document.
	pub fn from_json_str(source: &str) -> Result<Self, SettingsError> {
		serde_json::from_str(source)
			.map_err(|e| SettingsError::Parse(format!("JSON parse error: {}", e)))
	}

	/// Loads settings from a `.toml` or `.json` file.
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path)
			.map_err(|e| SettingsError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

		let settings = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents)?,
			Some("json") => Self::from_json_str(&contents)?,
			other => {
				return Err(SettingsError::Parse(format!(
					"Unsupported settings format: {}",
					other.unwrap_or("<none>")
				)));
			}
		};

		settings.validate()?;
		Ok(settings)
	}

	/// Defaults overridden from the process environment.
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Defaults overridden through `lookup`, then validated like
	/// [`PagesSettings::from_file`].
	pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut settings = Self::default();
		settings.apply_env(lookup)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Applies `TOUCHLINE_*` overrides read through `lookup`.
	///
	/// | Variable | Field |
	/// |----------|-------|
	/// | `TOUCHLINE_ACTION_ATTRIBUTE` | `markers.action_attribute` |
	/// | `TOUCHLINE_TARGET_ATTRIBUTE` | `markers.target_attribute` |
	/// | `TOUCHLINE_INSTANCE_CLASS` | `markers.instance_class` |
	/// | `TOUCHLINE_DEFAULT_EVENTS` | `delegation.default_events` (comma separated) |
	/// | `TOUCHLINE_WARN_UNRESOLVED` | `delegation.warn_unresolved` |
	/// | `TOUCHLINE_FETCH_TIMEOUT_MS` | `fetch.timeout_ms` |
	/// | `TOUCHLINE_LOG` | `logging.level` |
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SettingsError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(attr) = lookup("TOUCHLINE_ACTION_ATTRIBUTE") {
			self.markers.action_attribute = attr;
		}
		if let Some(attr) = lookup("TOUCHLINE_TARGET_ATTRIBUTE") {
			self.markers.target_attribute = attr;
		}
		if let Some(class) = lookup("TOUCHLINE_INSTANCE_CLASS") {
			self.markers.instance_class = class;
		}
		if let Some(events) = lookup("TOUCHLINE_DEFAULT_EVENTS") {
			self.delegation.default_events = events
				.split(',')
				.map(|s| s.trim().to_string())
				.filter(|s| !s.is_empty())
				.collect();
		}
		if let Some(flag) = lookup("TOUCHLINE_WARN_UNRESOLVED") {
			self.delegation.warn_unresolved = flag.eq_ignore_ascii_case("true") || flag == "1";
		}
		if let Some(timeout) = lookup("TOUCHLINE_FETCH_TIMEOUT_MS") {
			self.fetch.timeout_ms = timeout.trim().parse().map_err(|_| {
				SettingsError::Parse(format!("TOUCHLINE_FETCH_TIMEOUT_MS is not a number: {}", timeout))
			})?;
		}
		if let Some(level) = lookup("TOUCHLINE_LOG") {
			self.logging.level = level;
		}
		Ok(())
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.markers.action_attribute.trim().is_empty() {
			return Err(SettingsError::Validation(
				"markers.action_attribute must not be empty".to_string(),
			));
		}

		if self.markers.target_attribute.trim().is_empty() {
			return Err(SettingsError::Validation(
				"markers.target_attribute must not be empty".to_string(),
			));
		}

		if self.markers.instance_class.trim().is_empty() {
			return Err(SettingsError::Validation(
				"markers.instance_class must not be empty".to_string(),
			));
		}

		if self.viewport.mobile_max_width >= self.viewport.tablet_max_width {
			return Err(SettingsError::Validation(format!(
				"viewport.mobile_max_width ({}) must be below viewport.tablet_max_width ({})",
				self.viewport.mobile_max_width, self.viewport.tablet_max_width
			)));
		}

		if self.fetch.timeout_ms == 0 {
			return Err(SettingsError::Validation(
				"fetch.timeout_ms must be greater than zero".to_string(),
			));
		}

		Ok(())
	}
}
