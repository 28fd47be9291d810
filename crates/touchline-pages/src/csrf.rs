//! CSRF token discovery.
//!
//! The server renders the token twice: a `<meta name="csrf-token">` tag in
//! the layout head and a hidden `csrfmiddlewaretoken` input inside forms.
//! The meta tag wins when both are present.

use reqwest::Method;

use crate::dom::Document;

/// Header carrying the token on unsafe requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Reads the CSRF token from `document`.
pub fn csrf_token(document: &Document) -> Option<String> {
	let root = document.root();

	let from_meta = document
		.query_all_with_attribute(&root, "name")
		.into_iter()
		.find(|el| el.tag_name() == "meta" && el.get_attribute("name").as_deref() == Some("csrf-token"))
		.and_then(|el| el.get_attribute("content"));
	if let Some(token) = from_meta.filter(|token| !token.is_empty()) {
		return Some(token);
	}

	document
		.query_all_with_attribute(&root, "name")
		.into_iter()
		.find(|el| {
			el.tag_name() == "input"
				&& el.get_attribute("name").as_deref() == Some("csrfmiddlewaretoken")
		})
		.and_then(|el| el.get_attribute("value"))
		.filter(|token| !token.is_empty())
}

/// Whether requests with `method` must carry the token.
pub fn requires_csrf(method: &Method) -> bool {
	!method.is_safe()
}
