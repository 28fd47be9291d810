//! JSON requests with a deadline.
//!
//! Feature modules talk to the admin endpoints through [`fetch_json`]. Every
//! request carries a timeout, and requests with unsafe methods carry the
//! CSRF token read from the page.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::csrf::{CSRF_HEADER, requires_csrf};
use crate::error::FetchError;
use crate::settings::FetchSettings;

/// Races `future` against `duration`.
pub async fn with_timeout<F, T>(future: F, duration: Duration) -> Result<T, FetchError>
where
	F: Future<Output = T>,
{
	tokio::time::timeout(duration, future)
		.await
		.map_err(|_| FetchError::Timeout(duration))
}

/// Per-request options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
	pub timeout: Duration,
	/// Sent as `X-CSRFToken` on unsafe methods.
	pub csrf_token: Option<String>,
	pub headers: Vec<(String, String)>,
}

impl Default for FetchOptions {
	fn default() -> Self {
		Self::from_settings(&FetchSettings::default())
	}
}

impl FetchOptions {
	pub fn from_settings(settings: &FetchSettings) -> Self {
		Self {
			timeout: settings.timeout(),
			csrf_token: None,
			headers: Vec::new(),
		}
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	pub fn csrf_token(mut self, token: impl Into<String>) -> Self {
		self.csrf_token = Some(token.into());
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}
}

/// Builds the request [`fetch_json`] sends, without sending it.
pub fn build_request(
	client: &Client,
	method: Method,
	url: &str,
	body: Option<&serde_json::Value>,
	options: &FetchOptions,
) -> RequestBuilder {
	let unsafe_method = requires_csrf(&method);
	let mut request = client
		.request(method, url)
		.header("Accept", "application/json")
		.header("X-Requested-With", "XMLHttpRequest");

	if unsafe_method && let Some(token) = &options.csrf_token {
		request = request.header(CSRF_HEADER, token);
	}
	for (name, value) in &options.headers {
		request = request.header(name.as_str(), value.as_str());
	}
	if let Some(body) = body {
		request = request.json(body);
	}
	request
}

/// Sends a request and decodes a JSON response.
///
/// Non-2xx responses map to [`FetchError::Status`]; the timeout covers the
/// send and the body read separately.
pub async fn fetch_json<T>(
	client: &Client,
	method: Method,
	url: &str,
	body: Option<&serde_json::Value>,
	options: &FetchOptions,
) -> Result<T, FetchError>
where
	T: DeserializeOwned,
{
	let request = build_request(client, method, url, body, options);
	let response = with_timeout(request.send(), options.timeout).await??;

	let status = response.status();
	if !status.is_success() {
		return Err(FetchError::Status(status.as_u16()));
	}

	let text = with_timeout(response.text(), options.timeout).await??;
	serde_json::from_str(&text).map_err(|err| FetchError::Decode(err.to_string()))
}
