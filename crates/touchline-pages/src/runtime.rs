//! Page runtime
//!
//! [`Page`] ties one document to one initializer registry, one event
//! dispatcher and one modal cache, and provides the two entry points the
//! page calls: [`Page::bootstrap`] once the document is ready and
//! [`Page::on_content_loaded`] after markup is injected.
//!
//! Feature code that cannot be handed a `Page` reaches the current one
//! through [`current_page`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::delegation::EventDispatcher;
use crate::dom::{Document, Element, Event, EventType};
use crate::error::InstanceError;
use crate::init::{InitRegistry, InitReport};
use crate::instances::{InstanceCache, Modal, ModalOptions};
use crate::settings::PagesSettings;
use crate::utils::{DeviceClass, FetchOptions, Viewport};
use crate::{csrf, info_log};

/// What [`Page::on_content_loaded`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentReport {
	pub init: InitReport,
	/// Modal instances built for the new markup.
	pub discovered: usize,
}

/// One page's orchestration state.
///
/// Cloning yields another handle to the same page.
#[derive(Debug, Clone)]
pub struct Page {
	settings: Rc<PagesSettings>,
	document: Document,
	registry: InitRegistry,
	dispatcher: EventDispatcher,
	modals: InstanceCache<Modal>,
}

impl Default for Page {
	fn default() -> Self {
		Self::new(PagesSettings::default())
	}
}

impl Page {
	/// Creates a page over a fresh document.
	pub fn new(settings: PagesSettings) -> Self {
		Self::with_document(Document::new(), settings)
	}

	pub fn with_document(document: Document, settings: PagesSettings) -> Self {
		Self {
			registry: InitRegistry::from_settings(&settings.init),
			dispatcher: EventDispatcher::from_settings(document.clone(), &settings),
			modals: InstanceCache::from_settings(document.clone(), &settings),
			settings: Rc::new(settings),
			document,
		}
	}

	pub fn settings(&self) -> &PagesSettings {
		&self.settings
	}

	pub fn document(&self) -> &Document {
		&self.document
	}

	pub fn registry(&self) -> &InitRegistry {
		&self.registry
	}

	pub fn dispatcher(&self) -> &EventDispatcher {
		&self.dispatcher
	}

	pub fn modals(&self) -> &InstanceCache<Modal> {
		&self.modals
	}

	/// Binds the default event listeners, starts modal cleanup on node
	/// removal and runs every due initializer against the document root.
	///
	/// Safe to call more than once: listeners stay single and one-shot
	/// initializers are skipped.
	pub fn bootstrap(&self) -> InitReport {
		let bound = self.dispatcher.bind_defaults();
		self.modals.observe();
		let report = self.registry.run_all(&self.document.root());
		self.document.flush_mutations();

		info_log!(
			"bootstrap: {} listeners bound, {} initializers executed, {} skipped, {} failed",
			bound,
			report.executed.len(),
			report.skipped.len(),
			report.failed.len()
		);
		report
	}

	/// Re-runs due initializers against freshly injected markup under `root`
	/// and primes modal instances for it.
	pub fn on_content_loaded(&self, root: &Element) -> ContentReport {
		let init = self.registry.run_all(root);
		let discovered = self.modals.discover(root, Modal::new);
		self.document.flush_mutations();
		ContentReport { init, discovered }
	}

	/// Opens the modal whose element has id `key`, reading its options from
	/// the element on first use.
	pub fn show_modal(&self, key: &str) -> Result<(), InstanceError> {
		let element = self
			.document
			.get_element_by_id(key)
			.ok_or_else(|| InstanceError::ElementNotFound(key.to_string()))?;
		self.modals
			.show(key, Modal::new, ModalOptions::from_element(&element))
	}

	/// The record id an action element points at, read from the configured
	/// target attribute (`data-id` by default).
	pub fn action_target(&self, element: &Element) -> Option<String> {
		element.get_attribute(&self.settings.markers.target_attribute)
	}

	pub fn hide_modal(&self, key: &str) -> bool {
		self.modals.hide(key)
	}

	/// Dispatches a click on `target` through the document.
	pub fn click(&self, target: &Element) -> Event {
		self.fire(target, EventType::Click)
	}

	pub fn fire(&self, target: &Element, event_type: EventType) -> Event {
		self.document.dispatch_event(target, event_type)
	}

	/// Fetch options carrying the configured timeout and the page's CSRF
	/// token.
	pub fn fetch_options(&self) -> FetchOptions {
		let options = FetchOptions::from_settings(&self.settings.fetch);
		match csrf::csrf_token(&self.document) {
			Some(token) => options.csrf_token(token),
			None => options,
		}
	}

	pub fn device_class(&self, viewport: Viewport) -> DeviceClass {
		viewport.device_class(&self.settings.viewport)
	}
}

thread_local! {
	static CURRENT_PAGE: RefCell<Option<Page>> = const { RefCell::new(None) };
}

/// Makes `page` the current page, returning the previous one.
pub fn install_page(page: Page) -> Option<Page> {
	CURRENT_PAGE.with(|current| current.borrow_mut().replace(page))
}

/// The current page, created with default settings on first use.
pub fn current_page() -> Page {
	CURRENT_PAGE.with(|current| {
		current
			.borrow_mut()
			.get_or_insert_with(Page::default)
			.clone()
	})
}

/// Removes the current page.
pub fn take_page() -> Option<Page> {
	CURRENT_PAGE.with(|current| current.borrow_mut().take())
}
