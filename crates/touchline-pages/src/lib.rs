//! Touchline Pages - client-side orchestration for the league admin UI
//!
//! Server-rendered admin pages get their interactivity from three pieces
//! that every feature module shares:
//!
//! - [`init`]: a priority-ordered registry of named initializers. One-shot
//!   initializers run once per page no matter how often the page boots;
//!   reinitializable ones run again whenever new markup arrives.
//! - [`delegation`]: one document listener per event type that routes every
//!   interaction to the handler registered for the nearest `data-action`.
//! - [`instances`]: a cache of widget controllers (dialogs) keyed by element
//!   id, disposed automatically when their element leaves the document.
//!
//! [`runtime::Page`] wires the three to a [`dom::Document`] and exposes the
//! bootstrap and content-loaded entry points.
//!
//! ## Example
//!
//! ```
//! use touchline_pages::prelude::*;
//!
//! let page = Page::default();
//! let button = page
//! 	.document()
//! 	.create_element("button")
//! 	.attr("data-action", "approve-user")
//! 	.attr("data-user-id", "31");
//! page.document().body().append_child(&button).unwrap();
//!
//! let dispatcher = page.dispatcher().clone();
//! page.registry().register(
//! 	"user-approval",
//! 	move |_root: &Element| {
//! 		dispatcher.register(
//! 			"approve-user",
//! 			|element: &Element, _event: &Event| {
//! 				assert_eq!(element.dataset("user-id").as_deref(), Some("31"));
//! 				Ok(())
//! 			},
//! 			ActionOptions::new().prevent_default(true),
//! 		);
//! 		Ok(())
//! 	},
//! 	InitOptions::new().priority(20),
//! );
//!
//! let report = page.bootstrap();
//! assert_eq!(report.executed, vec!["user-approval"]);
//! assert!(page.click(&button).default_prevented());
//! ```
//!
//! ## Logging
//!
//! Everything the layer swallows is reported through [`tracing`] under the
//! `touchline_pages` target. Enable the `subscriber` feature to let
//! [`logging::init`] install a formatter.

pub mod callback;
pub mod csrf;
pub mod delegation;
pub mod dom;
pub mod error;
pub mod init;
pub mod instances;
pub mod logging;
pub mod prelude;
pub mod runtime;
pub mod settings;
pub mod utils;

pub use callback::{ActionHandler, CallbackResult, Initializer, IntoActionHandler, IntoInitializer};
pub use delegation::{ActionOptions, DispatchOutcome, EventDispatcher};
pub use dom::{Document, Element, Event, EventType, MutationRecord, NodeId};
pub use error::{BoxError, DomError, FetchError, InitError, InstanceError, PagesError, SettingsError};
pub use init::{
	DEFAULT_PRIORITY, InitOptions, InitRegistry, InitReport, InitializerInfo, RegisterOutcome,
};
pub use instances::{Backdrop, InstanceCache, InstanceState, Modal, ModalOptions, Widget};
pub use runtime::{ContentReport, Page, current_page, install_page, take_page};
pub use settings::PagesSettings;

#[doc(hidden)]
pub mod __private {
	pub use tracing;
}
