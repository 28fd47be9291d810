//! # Touchline
//!
//! Web UI for running a recreational football league: match scheduling,
//! team rosters, user approval and role management, all served as
//! server-rendered pages with a thin client-side layer on top.
//!
//! This crate is the facade. The client-side orchestration layer lives in
//! [`touchline-pages`](touchline_pages) and is re-exported as [`pages`].
//!
//! ## Feature Flags
//!
//! - `pages` (default) - initializer registry, delegated actions and modal
//!   lifecycle
//! - `subscriber` - lets [`pages::logging::init`] install a formatter
//!
//! ## Example
//!
//! ```
//! use touchline::pages::prelude::*;
//!
//! let page = Page::default();
//! page.bootstrap();
//! assert_eq!(page.document().listener_count(&EventType::Click), 1);
//! ```

#[cfg(feature = "pages")]
pub mod pages;
