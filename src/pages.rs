//! Client-side orchestration for server-rendered pages
//!
//! This module provides access to touchline-pages: the initializer
//! registry, the delegated action dispatcher and the modal instance cache,
//! tied together by [`Page`](touchline_pages::runtime::Page).
//!
//! ## Example
//!
//! ```
//! use touchline::pages::prelude::*;
//!
//! let page = Page::default();
//! let dialog = page
//! 	.document()
//! 	.create_element("div")
//! 	.attr("id", "editMatchModal")
//! 	.attr("class", "modal");
//! page.document().body().append_child(&dialog).unwrap();
//!
//! page.bootstrap();
//! page.show_modal("editMatchModal").unwrap();
//! assert!(dialog.has_class("show"));
//! ```

// Re-export all touchline-pages functionality
pub use touchline_pages::*;
