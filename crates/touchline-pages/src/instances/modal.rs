//! Built-in dialog controller.

use crate::dom::Element;
use crate::error::BoxError;

use super::Widget;

/// Backdrop behaviour, read from `data-bs-backdrop`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backdrop {
	/// Clicking the backdrop closes the dialog.
	#[default]
	Dismissible,
	/// The backdrop is shown but ignores clicks.
	Static,
	/// No backdrop.
	None,
}

/// Options for [`Modal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalOptions {
	pub backdrop: Backdrop,
	/// Close on Escape.
	pub keyboard: bool,
}

impl Default for ModalOptions {
	fn default() -> Self {
		Self {
			backdrop: Backdrop::Dismissible,
			keyboard: true,
		}
	}
}

impl ModalOptions {
	/// Reads `data-bs-backdrop` and `data-bs-keyboard` from `element`.
	pub fn from_element(element: &Element) -> Self {
		let mut options = Self::default();
		match element.dataset("bs-backdrop").as_deref() {
			Some("static") => options.backdrop = Backdrop::Static,
			Some("false") => options.backdrop = Backdrop::None,
			_ => {}
		}
		if element.dataset("bs-keyboard").as_deref() == Some("false") {
			options.keyboard = false;
		}
		options
	}
}

/// Toggles dialog markup between its open and closed presentation.
///
/// Showing adds the `show` class, sets `aria-modal` and `role="dialog"`,
/// clears `aria-hidden`, and marks `<body>` with `modal-open`. Hiding reverses
/// that; `modal-open` is only removed once no other dialog is open.
#[derive(Debug)]
pub struct Modal {
	element: Element,
	options: ModalOptions,
	shown: bool,
}

impl Modal {
	/// Builds a controller for `element`.
	///
	/// Fails when the element is not attached to the document.
	pub fn new(element: &Element, options: &ModalOptions) -> Result<Self, BoxError> {
		if !element.is_connected() {
			return Err(format!("modal element {element:?} is not attached to the document").into());
		}
		element.set_attribute("aria-hidden", "true");
		Ok(Self {
			element: element.clone(),
			options: options.clone(),
			shown: false,
		})
	}

	pub fn element(&self) -> &Element {
		&self.element
	}

	pub fn options(&self) -> &ModalOptions {
		&self.options
	}

	pub fn is_shown(&self) -> bool {
		self.shown
	}

	/// Whether a backdrop click should close this dialog.
	pub fn closes_on_backdrop(&self) -> bool {
		self.options.backdrop == Backdrop::Dismissible
	}

	fn any_other_open(&self) -> bool {
		let document = self.element.owner_document();
		document
			.query_all_with_class(&document.body(), "show")
			.iter()
			.any(|el| el != &self.element && el.has_class("modal"))
	}
}

impl Widget for Modal {
	type Options = ModalOptions;

	fn show(&mut self) {
		self.element.add_class("show");
		self.element.remove_attribute("aria-hidden");
		self.element.set_attribute("aria-modal", "true");
		self.element.set_attribute("role", "dialog");
		self.element.owner_document().body().add_class("modal-open");
		self.shown = true;
	}

	fn hide(&mut self) {
		self.element.remove_class("show");
		self.element.set_attribute("aria-hidden", "true");
		self.element.remove_attribute("aria-modal");
		if !self.any_other_open() {
			self.element.owner_document().body().remove_class("modal-open");
		}
		self.shown = false;
	}

	fn dispose(&mut self) {
		if self.shown {
			self.hide();
		}
		self.element.remove_attribute("role");
	}

	fn read_options(element: &Element) -> ModalOptions {
		ModalOptions::from_element(element)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::dom::Document;
	use rstest::rstest;

	fn dialog(doc: &Document, id: &str) -> Element {
		let el = doc.create_element("div").attr("id", id).attr("class", "modal fade");
		doc.body().append_child(&el).unwrap();
		el
	}

	#[rstest]
	fn test_show_and_hide_markup() {
		// Arrange
		let doc = Document::new();
		let el = dialog(&doc, "editMatchModal");
		let mut modal = Modal::new(&el, &ModalOptions::default()).unwrap();

		// Act
		modal.show();

		// Assert
		assert!(el.has_class("show"));
		assert_eq!(el.get_attribute("aria-modal").as_deref(), Some("true"));
		assert!(!el.has_attribute("aria-hidden"));
		assert!(doc.body().has_class("modal-open"));

		modal.hide();
		assert!(!el.has_class("show"));
		assert_eq!(el.get_attribute("aria-hidden").as_deref(), Some("true"));
		assert!(!doc.body().has_class("modal-open"));
	}

	#[rstest]
	fn test_body_class_kept_while_another_is_open() {
		let doc = Document::new();
		let mut first = Modal::new(&dialog(&doc, "a"), &ModalOptions::default()).unwrap();
		let mut second = Modal::new(&dialog(&doc, "b"), &ModalOptions::default()).unwrap();

		first.show();
		second.show();
		first.hide();
		assert!(doc.body().has_class("modal-open"));

		second.hide();
		assert!(!doc.body().has_class("modal-open"));
	}

	#[rstest]
	fn test_dispose_closes() {
		let doc = Document::new();
		let el = dialog(&doc, "m");
		let mut modal = Modal::new(&el, &ModalOptions::default()).unwrap();
		modal.show();

		modal.dispose();

		assert!(!modal.is_shown());
		assert!(!el.has_attribute("role"));
		assert!(!doc.body().has_class("modal-open"));
	}

	#[rstest]
	fn test_detached_element_rejected() {
		let doc = Document::new();
		let el = doc.create_element("div").attr("class", "modal");

		let err = Modal::new(&el, &ModalOptions::default()).unwrap_err();

		assert!(err.to_string().contains("not attached"));
	}

	#[rstest]
	#[case(None, None, Backdrop::Dismissible, true)]
	#[case(Some("static"), None, Backdrop::Static, true)]
	#[case(Some("false"), Some("false"), Backdrop::None, false)]
	#[case(Some("true"), Some("true"), Backdrop::Dismissible, true)]
	fn test_options_from_element(
		#[case] backdrop: Option<&str>,
		#[case] keyboard: Option<&str>,
		#[case] expected_backdrop: Backdrop,
		#[case] expected_keyboard: bool,
	) {
		let doc = Document::new();
		let el = doc.create_element("div");
		if let Some(value) = backdrop {
			el.set_attribute("data-bs-backdrop", value);
		}
		if let Some(value) = keyboard {
			el.set_attribute("data-bs-keyboard", value);
		}

		let options = ModalOptions::from_element(&el);

		assert_eq!(options.backdrop, expected_backdrop);
		assert_eq!(options.keyboard, expected_keyboard);
	}
}
